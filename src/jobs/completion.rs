//! Background job: promote confirmed bookings whose calendar day has
//! fully passed to `completed`.
//!
//! Runs hourly. UPDATE only: bookings are never deleted, and cancelled
//! bookings are left alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use crate::store::BookingStore;

/// Spawn the background completion sweep. Call this once at startup.
pub fn spawn(store: Arc<dyn BookingStore>) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600)); // every hour
        loop {
            interval.tick().await;
            if let Err(e) = sweep(store.as_ref()).await {
                tracing::error!("completion sweep failed: {}", e);
            }
        }
    });
}

async fn sweep(store: &dyn BookingStore) -> Result<(), crate::errors::AppError> {
    let today = Utc::now().date_naive();
    let promoted = store.mark_completed_before(today).await?;
    if promoted > 0 {
        tracing::info!(rows = promoted, "promoted past bookings to completed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Caller, Role};
    use crate::models::{BookingBucket, NewBooking, NewStation, TimeSlot, VehicleType};
    use crate::store::MemStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn sweep_promotes_only_past_confirmed_bookings() {
        let store = MemStore::new();
        let owner = Caller {
            id: Uuid::new_v4(),
            name: "Owner".into(),
            email: None,
            role: Role::Owner,
        };
        let station = store
            .insert_station(
                &owner,
                &NewStation {
                    name: "Hub".into(),
                    latitude: 0.0,
                    longitude: 0.0,
                    vehicle_types: vec![VehicleType::FourWheeler],
                    price_per_hour: 5.0,
                    available_slots: 2,
                    description: String::new(),
                    address: String::new(),
                    is_active: true,
                    is_public: true,
                },
            )
            .await
            .unwrap();

        let slot = TimeSlot::parse("10:00").unwrap();
        let past = store
            .insert_booking(&NewBooking {
                user_id: Uuid::new_v4(),
                user_name: "A".into(),
                station_id: station.id,
                station_name: station.name.clone(),
                date: "2020-01-01T00:00:00Z".parse().unwrap(),
                time_slot: slot,
            })
            .await
            .unwrap()
            .unwrap();
        let future = store
            .insert_booking(&NewBooking {
                user_id: Uuid::new_v4(),
                user_name: "B".into(),
                station_id: station.id,
                station_name: station.name.clone(),
                date: "2099-01-01T00:00:00Z".parse().unwrap(),
                time_slot: slot,
            })
            .await
            .unwrap()
            .unwrap();

        sweep(&store).await.unwrap();

        let now = Utc::now();
        let past = store.get_booking(past.id).await.unwrap().unwrap();
        let future = store.get_booking(future.id).await.unwrap().unwrap();
        assert_eq!(past.bucket(now), BookingBucket::Past);
        assert_eq!(past.status, crate::models::BookingStatus::Completed);
        assert_eq!(future.status, crate::models::BookingStatus::Confirmed);
        assert_eq!(future.bucket(now), BookingBucket::Upcoming);
    }
}
