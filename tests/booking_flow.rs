//! Service-level tests for the reservation core, run against the in-memory
//! store. The store enforces the same uniqueness invariant as the Postgres
//! partial unique index, so the concurrency property is checked here
//! without a database.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use evcharge::auth::{Caller, Role};
use evcharge::bookings::{BookingService, ReserveRequest};
use evcharge::errors::AppError;
use evcharge::models::{BookingStatus, NewStation, TimeSlot, VehicleType};
use evcharge::store::{BookingStore, MemStore};

fn driver(name: &str) -> Caller {
    Caller {
        id: Uuid::new_v4(),
        name: name.into(),
        email: None,
        role: Role::Driver,
    }
}

fn owner(name: &str) -> Caller {
    Caller {
        id: Uuid::new_v4(),
        name: name.into(),
        email: None,
        role: Role::Owner,
    }
}

fn new_station(name: &str) -> NewStation {
    NewStation {
        name: name.into(),
        latitude: 12.97,
        longitude: 77.59,
        vehicle_types: vec![VehicleType::FourWheeler],
        price_per_hour: 6.0,
        available_slots: 4,
        description: String::new(),
        address: String::new(),
        is_active: true,
        is_public: true,
    }
}

async fn setup() -> (Arc<MemStore>, BookingService, Caller, Uuid) {
    let store = Arc::new(MemStore::new());
    let service = BookingService::new(store.clone());
    let station_owner = owner("Priya");
    let station = store
        .insert_station(&station_owner, &new_station("Green Park Hub"))
        .await
        .unwrap();
    (store, service, station_owner, station.id)
}

fn request(station_id: Uuid, date: &str, slot: &str) -> ReserveRequest {
    ReserveRequest {
        station_id,
        date: date.parse::<DateTime<Utc>>().unwrap(),
        time_slot: TimeSlot::parse(slot).unwrap(),
    }
}

#[tokio::test]
async fn reserve_then_conflict_then_cancel_then_reserve_again() {
    let (_store, service, _owner, station_id) = setup().await;
    let alice = driver("Alice");
    let bob = driver("Bob");

    let first = service
        .reserve(Some(&alice), request(station_id, "2025-06-10T00:00:00Z", "14:00"))
        .await
        .unwrap();
    assert_eq!(first.status, BookingStatus::Confirmed);
    assert_eq!(first.user_name, "Alice");
    assert_eq!(first.station_name, "Green Park Hub");

    // Identical tuple is rejected, for the same user or anyone else.
    let err = service
        .reserve(Some(&bob), request(station_id, "2025-06-10T00:00:00Z", "14:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SlotUnavailable));

    // Cancelling the sole confirmed booking frees the tuple.
    service.cancel(Some(&alice), first.id).await.unwrap();
    let third = service
        .reserve(Some(&bob), request(station_id, "2025-06-10T00:00:00Z", "14:00"))
        .await
        .unwrap();
    assert_eq!(third.user_name, "Bob");
}

#[tokio::test]
async fn availability_flips_with_reserve_and_cancel() {
    let (_store, service, _owner, station_id) = setup().await;
    let date: DateTime<Utc> = "2025-06-10T00:00:00Z".parse().unwrap();
    let slot = TimeSlot::parse("09:00").unwrap();

    assert!(service.is_available(station_id, date, slot).await.unwrap());

    let booking = service
        .reserve(Some(&driver("Alice")), request(station_id, "2025-06-10T00:00:00Z", "09:00"))
        .await
        .unwrap();
    assert!(!service.is_available(station_id, date, slot).await.unwrap());

    // The same slot on a different day is unaffected.
    let other_day: DateTime<Utc> = "2025-06-11T00:00:00Z".parse().unwrap();
    assert!(service
        .is_available(station_id, other_day, slot)
        .await
        .unwrap());

    service.cancel(Some(&driver("Alice")), booking.id).await.unwrap();
    assert!(service.is_available(station_id, date, slot).await.unwrap());
}

#[tokio::test]
async fn matching_ignores_time_of_day_within_the_same_calendar_day() {
    let (_store, service, _owner, station_id) = setup().await;

    service
        .reserve(
            Some(&driver("Alice")),
            request(station_id, "2025-06-10T00:00:00Z", "14:00"),
        )
        .await
        .unwrap();

    // A submission carrying a different time-of-day for the same day and
    // slot still collides.
    let err = service
        .reserve(
            Some(&driver("Bob")),
            request(station_id, "2025-06-10T18:45:13Z", "14:00"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SlotUnavailable));
}

#[tokio::test]
async fn unauthenticated_reserve_is_rejected_before_any_write() {
    let (store, service, _owner, station_id) = setup().await;

    let err = service
        .reserve(None, request(station_id, "2025-06-10T00:00:00Z", "14:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthenticationRequired));
    assert_eq!(store.booking_count(), 0);

    let err = service.cancel(None, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::AuthenticationRequired));
}

#[tokio::test]
async fn reserve_against_unknown_station_is_not_found() {
    let (_store, service, _owner, _station_id) = setup().await;
    let err = service
        .reserve(
            Some(&driver("Alice")),
            request(Uuid::new_v4(), "2025-06-10T00:00:00Z", "14:00"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StationNotFound));
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let (store, service, _owner, station_id) = setup().await;
    let alice = driver("Alice");
    let booking = service
        .reserve(Some(&alice), request(station_id, "2025-06-10T00:00:00Z", "14:00"))
        .await
        .unwrap();

    service.cancel(Some(&alice), booking.id).await.unwrap();
    // Second cancel is a no-op success, and the status stays cancelled.
    service.cancel(Some(&alice), booking.id).await.unwrap();
    let stored = store.get_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);

    let err = service.cancel(Some(&alice), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::BookingNotFound));
}

#[tokio::test]
async fn racing_reservations_yield_exactly_one_confirmed_booking() {
    let (store, service, _owner, station_id) = setup().await;

    let mut set = tokio::task::JoinSet::new();
    for i in 0..16 {
        let service = service.clone();
        let caller = driver(&format!("racer-{i}"));
        set.spawn(async move {
            service
                .reserve(Some(&caller), request(station_id, "2025-06-10T00:00:00Z", "14:00"))
                .await
        });
    }

    let mut successes = 0;
    let mut conflicts = 0;
    while let Some(result) = set.join_next().await {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::SlotUnavailable) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(store.booking_count(), 1);
}

#[tokio::test]
async fn random_reservation_sequences_never_duplicate_a_confirmed_tuple() {
    use rand::Rng;

    let (store, service, station_owner, station_a) = setup().await;
    let station_b = store
        .insert_station(&station_owner, &new_station("Dockside Chargers"))
        .await
        .unwrap()
        .id;

    let stations = [station_a, station_b];
    let days = ["2025-06-10T00:00:00Z", "2025-06-11T00:00:00Z"];
    let slots = ["08:00", "14:00", "19:00"];
    let callers: Vec<Caller> = (0..4).map(|i| driver(&format!("user-{i}"))).collect();

    let mut rng = rand::thread_rng();
    let mut created: Vec<Uuid> = Vec::new();
    for _ in 0..200 {
        let station = stations[rng.gen_range(0..stations.len())];
        let day = days[rng.gen_range(0..days.len())];
        let slot = slots[rng.gen_range(0..slots.len())];
        let caller = &callers[rng.gen_range(0..callers.len())];

        if !created.is_empty() && rng.gen_bool(0.3) {
            let id = created[rng.gen_range(0..created.len())];
            service.cancel(Some(caller), id).await.unwrap();
        } else {
            match service.reserve(Some(caller), request(station, day, slot)).await {
                Ok(b) => created.push(b.id),
                Err(AppError::SlotUnavailable) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }

    // No two confirmed bookings share a (station, day, slot) tuple.
    let mut seen = std::collections::HashSet::new();
    for id in &created {
        let b = store.get_booking(*id).await.unwrap().unwrap();
        if b.status == BookingStatus::Confirmed {
            let key = (b.station_id, b.date.date_naive(), b.time_slot);
            assert!(seen.insert(key), "duplicate confirmed tuple: {key:?}");
        }
    }
}

#[tokio::test]
async fn store_outage_reads_as_unavailable_never_available() {
    let (store, service, _owner, station_id) = setup().await;
    let date: DateTime<Utc> = "2025-06-10T00:00:00Z".parse().unwrap();
    let slot = TimeSlot::parse("14:00").unwrap();

    store.set_fail_queries(true);

    // The availability check surfaces the failure instead of claiming the
    // slot is free.
    assert!(service.is_available(station_id, date, slot).await.is_err());

    // And a reservation attempted during the outage writes nothing.
    let err = service
        .reserve(Some(&driver("Alice")), request(station_id, "2025-06-10T00:00:00Z", "14:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    store.set_fail_queries(false);
    assert_eq!(store.booking_count(), 0);
}
