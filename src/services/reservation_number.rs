//! reservation_number.rs
//!
//! Human-facing reservation numbers: `MMDD` + 4-digit sequence, e.g. `03050007`.
//!
//! The sequence is one counter per process, shared by every booking request.
//! Taking the next value is a single compare-and-swap, so two concurrent
//! bookers never receive the same candidate. The store still checks the
//! candidate against existing active numbers (the counter wraps 9999 -> 0000
//! and restarts with the process), and its unique index decides any race
//! that slips past that check.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Number of distinct sequence values before the counter wraps.
pub const SEQUENCE_SPACE: u32 = 10_000;

/// Source of "today" for the date prefix.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall clock of the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationNumber(String);

impl ReservationNumber {
    pub fn compose(date: NaiveDate, sequence: u32) -> Self {
        Self(format!(
            "{}{:04}",
            date_prefix(date),
            sequence % SEQUENCE_SPACE
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReservationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn date_prefix(date: NaiveDate) -> String {
    format!("{:02}{:02}", date.month(), date.day())
}

#[derive(Debug, Default)]
pub struct ReservationNumberGenerator {
    counter: AtomicU32,
}

impl ReservationNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(sequence: u32) -> Self {
        Self {
            counter: AtomicU32::new(sequence % SEQUENCE_SPACE),
        }
    }

    /// Takes the current sequence value and advances the counter in one step.
    pub fn reserve_sequence(&self) -> u32 {
        let step = |current: u32| Some((current + 1) % SEQUENCE_SPACE);
        match self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, step)
        {
            Ok(previous) | Err(previous) => previous,
        }
    }

    pub fn next_candidate(&self, date: NaiveDate) -> ReservationNumber {
        ReservationNumber::compose(date, self.reserve_sequence())
    }

    /// Value the next call to `reserve_sequence` will hand out.
    pub fn peek(&self) -> u32 {
        self.counter.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn march_5th() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn formats_month_day_and_padded_sequence() {
        assert_eq!(ReservationNumber::compose(march_5th(), 7).as_str(), "03050007");

        let generator = ReservationNumberGenerator::starting_at(7);
        assert_eq!(generator.next_candidate(march_5th()).to_string(), "03050007");
        assert_eq!(generator.next_candidate(march_5th()).to_string(), "03050008");
    }

    #[test]
    fn counter_wraps_after_9999() {
        let generator = ReservationNumberGenerator::starting_at(9999);
        assert_eq!(generator.next_candidate(march_5th()).as_str(), "03059999");
        assert_eq!(generator.peek(), 0);
        assert_eq!(generator.next_candidate(march_5th()).as_str(), "03050000");
        assert_eq!(generator.peek(), 1);
    }

    #[test]
    fn fixed_clock_reports_its_date() {
        assert_eq!(FixedClock(march_5th()).today(), march_5th());
    }

    #[test]
    fn concurrent_reservations_never_share_a_sequence() {
        let generator = Arc::new(ReservationNumberGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..1_000)
                        .map(|_| generator.reserve_sequence())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for sequence in handle.join().unwrap() {
                assert!(seen.insert(sequence), "sequence {sequence} handed out twice");
            }
        }
        assert_eq!(seen.len(), 8_000);
        assert_eq!(generator.peek(), 8_000);
    }

    proptest! {
        #[test]
        fn number_is_always_eight_digits(
            ordinal in 1u32..=365,
            sequence in 0u32..SEQUENCE_SPACE,
        ) {
            let date = NaiveDate::from_yo_opt(2023, ordinal).unwrap();
            let number = ReservationNumber::compose(date, sequence);

            prop_assert_eq!(number.as_str().len(), 8);
            prop_assert!(number.as_str().chars().all(|c| c.is_ascii_digit()));
            prop_assert!(number.as_str().starts_with(&date_prefix(date)));
            prop_assert_eq!(number.as_str()[4..].parse::<u32>().unwrap(), sequence);
        }
    }
}
