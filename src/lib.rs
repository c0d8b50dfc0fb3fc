//! EVCharge: charging station locator and slot booking backend.
//!
//! The correctness core is the reservation path: at most one confirmed
//! booking may exist per (station, day, slot), enforced by the store's
//! conditional insert and funneled through `bookings::BookingService`.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod bookings;
pub mod cli;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod models;
pub mod store;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub store: Arc<dyn store::BookingStore>,
    pub bookings: bookings::BookingService,
    pub config: config::Config,
}

impl AppState {
    pub fn new(store: Arc<dyn store::BookingStore>, config: config::Config) -> Self {
        let bookings = bookings::BookingService::new(store.clone());
        Self {
            store,
            bookings,
            config,
        }
    }
}
