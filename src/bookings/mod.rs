pub mod ics;
pub mod service;

pub use service::{BookingService, ReserveRequest};
