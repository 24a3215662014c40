pub mod reservation;
pub mod reservation_number;
pub mod seats;

pub use reservation::ReservationService;
pub use reservation_number::{
    Clock, FixedClock, ReservationNumber, ReservationNumberGenerator, SystemClock,
};
pub use seats::SeatService;
