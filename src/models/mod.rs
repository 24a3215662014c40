pub mod member;
pub mod page;
pub mod reservation;
pub mod schedule;

pub use member::Member;
pub use page::{Page, PageRequest};
pub use reservation::{NewReservation, Reservation, ReservationView};
pub use schedule::{Schedule, ScheduleSummary, SeatStatus, ShowtimeSeatStatus};
