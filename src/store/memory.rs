//! In-memory store used by the integration tests.
//!
//! Behaviorally equivalent to the Postgres store for the operations the
//! service exercises: the uniqueness invariant is enforced under the lock,
//! so concurrent reservations race the same way they do against the
//! partial unique index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{
    day_bounds, Booking, BookingStatus, NewBooking, NewStation, Station, StationPatch, TimeSlot,
};

use super::{BookingStore, CancelOutcome};

#[derive(Default)]
struct Inner {
    bookings: HashMap<Uuid, Booking>,
    stations: HashMap<Uuid, Station>,
    sessions: HashMap<String, Caller>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
    /// Counts booking-collection reads; tests assert the owner-with-zero-
    /// stations path never issues one.
    booking_queries: AtomicUsize,
    fail_queries: AtomicBool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live session resolving to `caller`.
    pub fn insert_session(&self, token_hash: &str, caller: Caller) {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(token_hash.to_string(), caller);
    }

    pub fn booking_queries(&self) -> usize {
        self.booking_queries.load(Ordering::SeqCst)
    }

    pub fn booking_count(&self) -> usize {
        self.inner.lock().unwrap().bookings.len()
    }

    /// Make every subsequent query fail, simulating a store outage.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    fn check_outage(&self) -> Result<(), AppError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("store unavailable")));
        }
        Ok(())
    }

    fn slot_taken(
        inner: &Inner,
        station_id: Uuid,
        date: DateTime<Utc>,
        slot: TimeSlot,
    ) -> bool {
        let (day_start, day_end) = day_bounds(date);
        inner.bookings.values().any(|b| {
            b.station_id == station_id
                && b.time_slot == slot
                && b.status == BookingStatus::Confirmed
                && b.date >= day_start
                && b.date <= day_end
        })
    }
}

#[async_trait]
impl BookingStore for MemStore {
    async fn insert_booking(&self, new: &NewBooking) -> Result<Option<Booking>, AppError> {
        self.check_outage()?;
        let mut inner = self.inner.lock().unwrap();
        if Self::slot_taken(&inner, new.station_id, new.date, new.time_slot) {
            return Ok(None);
        }
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            user_name: new.user_name.clone(),
            station_id: new.station_id,
            station_name: new.station_name.clone(),
            date: new.date,
            time_slot: new.time_slot,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };
        inner.bookings.insert(booking.id, booking.clone());
        Ok(Some(booking))
    }

    async fn confirmed_booking_exists(
        &self,
        station_id: Uuid,
        date: DateTime<Utc>,
        slot: TimeSlot,
    ) -> Result<bool, AppError> {
        self.check_outage()?;
        let inner = self.inner.lock().unwrap();
        Ok(Self::slot_taken(&inner, station_id, date, slot))
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        self.check_outage()?;
        Ok(self.inner.lock().unwrap().bookings.get(&id).cloned())
    }

    async fn cancel_booking(&self, id: Uuid) -> Result<CancelOutcome, AppError> {
        self.check_outage()?;
        let mut inner = self.inner.lock().unwrap();
        match inner.bookings.get_mut(&id) {
            None => Ok(CancelOutcome::NotFound),
            Some(b) if b.status == BookingStatus::Cancelled => {
                Ok(CancelOutcome::AlreadyCancelled)
            }
            Some(b) => {
                b.status = BookingStatus::Cancelled;
                Ok(CancelOutcome::Cancelled)
            }
        }
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        self.check_outage()?;
        self.booking_queries.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(out)
    }

    async fn bookings_for_stations(&self, station_ids: &[Uuid]) -> Result<Vec<Booking>, AppError> {
        self.check_outage()?;
        self.booking_queries.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| station_ids.contains(&b.station_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(out)
    }

    async fn mark_completed_before(&self, day: NaiveDate) -> Result<u64, AppError> {
        self.check_outage()?;
        let mut inner = self.inner.lock().unwrap();
        let mut promoted = 0;
        for b in inner.bookings.values_mut() {
            if b.status == BookingStatus::Confirmed && b.date.date_naive() < day {
                b.status = BookingStatus::Completed;
                promoted += 1;
            }
        }
        Ok(promoted)
    }

    async fn insert_station(
        &self,
        owner: &Caller,
        new: &NewStation,
    ) -> Result<Station, AppError> {
        self.check_outage()?;
        let station = Station {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            owner_id: owner.id,
            owner_name: owner.name.clone(),
            latitude: new.latitude,
            longitude: new.longitude,
            vehicle_types: new.vehicle_types.clone(),
            price_per_hour: new.price_per_hour,
            available_slots: new.available_slots,
            description: new.description.clone(),
            address: new.address.clone(),
            is_active: new.is_active,
            is_public: new.is_public,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .stations
            .insert(station.id, station.clone());
        Ok(station)
    }

    async fn get_station(&self, id: Uuid) -> Result<Option<Station>, AppError> {
        self.check_outage()?;
        Ok(self.inner.lock().unwrap().stations.get(&id).cloned())
    }

    async fn update_station(&self, id: Uuid, patch: &StationPatch) -> Result<bool, AppError> {
        self.check_outage()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(s) = inner.stations.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(v) = &patch.name {
            s.name = v.clone();
        }
        if let Some(v) = patch.latitude {
            s.latitude = v;
        }
        if let Some(v) = patch.longitude {
            s.longitude = v;
        }
        if let Some(v) = &patch.vehicle_types {
            s.vehicle_types = v.clone();
        }
        if let Some(v) = patch.price_per_hour {
            s.price_per_hour = v;
        }
        if let Some(v) = patch.available_slots {
            s.available_slots = v;
        }
        if let Some(v) = &patch.description {
            s.description = v.clone();
        }
        if let Some(v) = &patch.address {
            s.address = v.clone();
        }
        if let Some(v) = patch.is_active {
            s.is_active = v;
        }
        if let Some(v) = patch.is_public {
            s.is_public = v;
        }
        Ok(true)
    }

    async fn delete_station(&self, id: Uuid) -> Result<bool, AppError> {
        self.check_outage()?;
        Ok(self.inner.lock().unwrap().stations.remove(&id).is_some())
    }

    async fn list_active_stations(&self) -> Result<Vec<Station>, AppError> {
        self.check_outage()?;
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<Station> = inner
            .stations
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn stations_for_owner(&self, owner_id: Uuid) -> Result<Vec<Station>, AppError> {
        self.check_outage()?;
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<Station> = inner
            .stations
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn station_ids_for_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.check_outage()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .stations
            .values()
            .filter(|s| s.owner_id == owner_id)
            .map(|s| s.id)
            .collect())
    }

    async fn caller_by_session(&self, token_hash: &str) -> Result<Option<Caller>, AppError> {
        self.check_outage()?;
        Ok(self.inner.lock().unwrap().sessions.get(token_hash).cloned())
    }
}
