//! Reservation orchestration: availability check, conditional write,
//! cancellation and role-shaped listing. Every booking in the system is
//! created through `reserve`, so invariant enforcement funnels through
//! this one path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::{Caller, Role};
use crate::errors::AppError;
use crate::models::{Booking, NewBooking, TimeSlot};
use crate::store::{BookingStore, CancelOutcome};

#[derive(Debug, Clone)]
pub struct ReserveRequest {
    pub station_id: Uuid,
    pub date: DateTime<Utc>,
    pub time_slot: TimeSlot,
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// True iff no confirmed booking exists for (station, day, slot).
    /// A store failure propagates as an error; it is never reported as
    /// "available".
    pub async fn is_available(
        &self,
        station_id: Uuid,
        date: DateTime<Utc>,
        slot: TimeSlot,
    ) -> Result<bool, AppError> {
        Ok(!self
            .store
            .confirmed_booking_exists(station_id, date, slot)
            .await?)
    }

    /// Reserve a slot for the caller. Re-checks availability immediately
    /// before writing (the caller's own check may be stale), then performs
    /// a conditional insert; the store arbitrates concurrent winners.
    pub async fn reserve(
        &self,
        caller: Option<&Caller>,
        req: ReserveRequest,
    ) -> Result<Booking, AppError> {
        let caller = caller.ok_or(AppError::AuthenticationRequired)?;

        if !self
            .is_available(req.station_id, req.date, req.time_slot)
            .await?
        {
            tracing::info!(
                station_id = %req.station_id,
                slot = %req.time_slot,
                "reservation rejected: slot already confirmed"
            );
            return Err(AppError::SlotUnavailable);
        }

        let station = self
            .store
            .get_station(req.station_id)
            .await?
            .ok_or(AppError::StationNotFound)?;

        let new = NewBooking {
            user_id: caller.id,
            user_name: caller.name.clone(),
            station_id: station.id,
            station_name: station.name,
            date: req.date,
            time_slot: req.time_slot,
        };

        match self.store.insert_booking(&new).await? {
            Some(booking) => {
                tracing::info!(booking_id = %booking.id, station_id = %booking.station_id, slot = %booking.time_slot, "slot booked");
                Ok(booking)
            }
            // Lost the race between the check and the write.
            None => Err(AppError::SlotUnavailable),
        }
    }

    /// Cancel a booking. Idempotent: cancelling an already-cancelled
    /// booking succeeds without touching the record again.
    pub async fn cancel(&self, caller: Option<&Caller>, booking_id: Uuid) -> Result<(), AppError> {
        caller.ok_or(AppError::AuthenticationRequired)?;

        match self.store.cancel_booking(booking_id).await? {
            CancelOutcome::Cancelled => {
                tracing::info!(booking_id = %booking_id, "booking cancelled");
                Ok(())
            }
            CancelOutcome::AlreadyCancelled => Ok(()),
            CancelOutcome::NotFound => Err(AppError::BookingNotFound),
        }
    }

    /// Bookings visible to the caller, newest first. Owners see bookings
    /// made against their stations; drivers see their own. An owner with
    /// no stations gets an empty list without a booking query.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Booking>, AppError> {
        match caller.role {
            Role::Owner => {
                let station_ids = self.store.station_ids_for_owner(caller.id).await?;
                if station_ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.store.bookings_for_stations(&station_ids).await
            }
            Role::Driver => self.store.bookings_for_user(caller.id).await,
        }
    }

    /// Fetch a booking the caller is allowed to see: their own, or one
    /// made against a station they own.
    pub async fn get_visible(
        &self,
        caller: Option<&Caller>,
        booking_id: Uuid,
    ) -> Result<Booking, AppError> {
        let caller = caller.ok_or(AppError::AuthenticationRequired)?;
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound)?;

        if booking.user_id == caller.id {
            return Ok(booking);
        }
        if let Some(station) = self.store.get_station(booking.station_id).await? {
            if station.owner_id == caller.id {
                return Ok(booking);
            }
        }
        Err(AppError::Forbidden(
            "this booking belongs to another user".into(),
        ))
    }
}
