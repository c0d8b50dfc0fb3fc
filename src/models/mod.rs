pub mod booking;
pub mod slot;
pub mod station;

pub use booking::{classify, day_bounds, Booking, BookingBucket, BookingStatus, NewBooking};
pub use slot::TimeSlot;
pub use station::{NewStation, Station, StationPatch, VehicleType};
