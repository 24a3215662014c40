use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::thread;

use cinema_booking::services::ReservationNumberGenerator;

fn next_candidate(c: &mut Criterion) {
    let generator = ReservationNumberGenerator::new();
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    c.bench_function("next_candidate", |b| {
        b.iter(|| black_box(generator.next_candidate(black_box(date))))
    });
}

fn contended_sequence(c: &mut Criterion) {
    let generator = Arc::new(ReservationNumberGenerator::new());

    c.bench_function("reserve_sequence_4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let generator = generator.clone();
                    thread::spawn(move || {
                        for _ in 0..256 {
                            black_box(generator.reserve_sequence());
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

criterion_group!(benches, next_candidate, contended_sequence);
criterion_main!(benches);
