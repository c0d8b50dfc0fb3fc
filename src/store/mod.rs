use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{Booking, NewBooking, NewStation, Station, StationPatch, TimeSlot};

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

/// Result of a cancellation attempt. Cancelling twice is a no-op success,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
    NotFound,
}

/// Persistence contract for bookings, stations and session lookup.
///
/// The one correctness-critical operation is `insert_booking`: the store
/// must reject (return `Ok(None)`) an insert when a confirmed booking for
/// the same (station, day, slot) already exists, atomically, so that the
/// uniqueness invariant holds under concurrent reservations.
#[async_trait]
pub trait BookingStore: Send + Sync {
    // -- Bookings --

    /// Conditional insert of a confirmed booking. Returns the created
    /// record, or `None` when the slot is already confirmed-booked.
    async fn insert_booking(&self, new: &NewBooking) -> Result<Option<Booking>, AppError>;

    /// True when a confirmed booking exists for the station on the UTC
    /// calendar day of `date` with the given slot.
    async fn confirmed_booking_exists(
        &self,
        station_id: Uuid,
        date: DateTime<Utc>,
        slot: TimeSlot,
    ) -> Result<bool, AppError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError>;

    /// Flip a booking to cancelled. Never deletes.
    async fn cancel_booking(&self, id: Uuid) -> Result<CancelOutcome, AppError>;

    /// Bookings made by a user, ordered by date descending.
    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError>;

    /// Bookings against any of the given stations, ordered by date
    /// descending. Callers short-circuit on an empty id list.
    async fn bookings_for_stations(&self, station_ids: &[Uuid]) -> Result<Vec<Booking>, AppError>;

    /// Promote confirmed bookings dated before `day` to completed.
    /// Returns the number of rows promoted.
    async fn mark_completed_before(&self, day: NaiveDate) -> Result<u64, AppError>;

    // -- Stations --

    async fn insert_station(&self, owner: &Caller, new: &NewStation)
        -> Result<Station, AppError>;

    async fn get_station(&self, id: Uuid) -> Result<Option<Station>, AppError>;

    /// Partial update; returns false when the station does not exist.
    async fn update_station(&self, id: Uuid, patch: &StationPatch) -> Result<bool, AppError>;

    async fn delete_station(&self, id: Uuid) -> Result<bool, AppError>;

    /// Active stations, newest first (the public map view).
    async fn list_active_stations(&self) -> Result<Vec<Station>, AppError>;

    /// All stations belonging to an owner, including inactive ones.
    async fn stations_for_owner(&self, owner_id: Uuid) -> Result<Vec<Station>, AppError>;

    async fn station_ids_for_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    // -- Sessions --

    /// Resolve a hashed session token to its caller, if the session is
    /// live.
    async fn caller_by_session(&self, token_hash: &str) -> Result<Option<Caller>, AppError>;
}
