//! Role-shaped booking listings and the owner short-circuit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use evcharge::auth::{Caller, Role};
use evcharge::bookings::{BookingService, ReserveRequest};
use evcharge::models::{NewStation, TimeSlot, VehicleType};
use evcharge::store::{BookingStore, MemStore};

fn caller(name: &str, role: Role) -> Caller {
    Caller {
        id: Uuid::new_v4(),
        name: name.into(),
        email: None,
        role,
    }
}

fn new_station(name: &str) -> NewStation {
    NewStation {
        name: name.into(),
        latitude: 0.0,
        longitude: 0.0,
        vehicle_types: vec![VehicleType::TwoWheeler],
        price_per_hour: 4.0,
        available_slots: 2,
        description: String::new(),
        address: String::new(),
        is_active: true,
        is_public: true,
    }
}

fn request(station_id: Uuid, date: &str, slot: &str) -> ReserveRequest {
    ReserveRequest {
        station_id,
        date: date.parse::<DateTime<Utc>>().unwrap(),
        time_slot: TimeSlot::parse(slot).unwrap(),
    }
}

#[tokio::test]
async fn owner_with_zero_stations_gets_empty_list_without_a_booking_query() {
    let store = Arc::new(MemStore::new());
    let service = BookingService::new(store.clone());
    let lonely_owner = caller("Noor", Role::Owner);

    let bookings = service.list(&lonely_owner).await.unwrap();
    assert!(bookings.is_empty());
    assert_eq!(store.booking_queries(), 0);
}

#[tokio::test]
async fn owner_sees_bookings_against_their_stations_only() {
    let store = Arc::new(MemStore::new());
    let service = BookingService::new(store.clone());

    let priya = caller("Priya", Role::Owner);
    let rival = caller("Rival", Role::Owner);
    let alice = caller("Alice", Role::Driver);

    let mine = store.insert_station(&priya, &new_station("Mine")).await.unwrap();
    let theirs = store.insert_station(&rival, &new_station("Theirs")).await.unwrap();

    service
        .reserve(Some(&alice), request(mine.id, "2025-06-10T00:00:00Z", "10:00"))
        .await
        .unwrap();
    service
        .reserve(Some(&alice), request(theirs.id, "2025-06-10T00:00:00Z", "10:00"))
        .await
        .unwrap();

    let visible = service.list(&priya).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].station_id, mine.id);
}

#[tokio::test]
async fn driver_sees_only_their_own_bookings_newest_first() {
    let store = Arc::new(MemStore::new());
    let service = BookingService::new(store.clone());

    let owner = caller("Priya", Role::Owner);
    let alice = caller("Alice", Role::Driver);
    let bob = caller("Bob", Role::Driver);
    let station = store.insert_station(&owner, &new_station("Hub")).await.unwrap();

    service
        .reserve(Some(&alice), request(station.id, "2025-06-10T00:00:00Z", "10:00"))
        .await
        .unwrap();
    service
        .reserve(Some(&alice), request(station.id, "2025-06-12T00:00:00Z", "10:00"))
        .await
        .unwrap();
    service
        .reserve(Some(&bob), request(station.id, "2025-06-11T00:00:00Z", "10:00"))
        .await
        .unwrap();

    let mine = service.list(&alice).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|b| b.user_id == alice.id));
    // Ordered by date descending.
    assert!(mine[0].date > mine[1].date);
}
