use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{Caller, Identity, Role};
use crate::bookings::{ics, ReserveRequest};
use crate::errors::AppError;
use crate::models::{Booking, BookingBucket, NewStation, Station, StationPatch, TimeSlot};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub station_id: Uuid,
    pub date: DateTime<Utc>,
    pub time_slot: String,
}

#[derive(Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    /// Derived display bucket; never persisted.
    pub bucket: BookingBucket,
}

impl BookingResponse {
    fn now(booking: Booking) -> Self {
        let bucket = booking.bucket(Utc::now());
        Self { booking, bucket }
    }
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    /// Calendar day, YYYY-MM-DD.
    pub date: NaiveDate,
    /// Slot label, e.g. "14:00".
    pub slot: String,
}

fn require(identity: &Identity) -> Result<&Caller, AppError> {
    identity.caller().ok_or(AppError::AuthenticationRequired)
}

fn require_owner(identity: &Identity) -> Result<&Caller, AppError> {
    let caller = require(identity)?;
    if caller.role != Role::Owner {
        return Err(AppError::Forbidden(
            "only station owners may manage listings".into(),
        ));
    }
    Ok(caller)
}

// ── Station handlers ─────────────────────────────────────────

/// GET /api/v1/stations. The public map view: active stations, newest
/// first. An owner gets their own stations instead, inactive included.
pub async fn list_stations(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Station>>, AppError> {
    let stations = match identity.caller() {
        Some(caller) if caller.role == Role::Owner => {
            state.store.stations_for_owner(caller.id).await?
        }
        _ => state.store.list_active_stations().await?,
    };
    Ok(Json(stations))
}

/// POST /api/v1/stations. Add a listing (owners only).
pub async fn create_station(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<NewStation>,
) -> Result<(StatusCode, Json<Station>), AppError> {
    let caller = require_owner(&identity)?;
    payload.validate()?;
    let station = state.store.insert_station(caller, &payload).await?;
    tracing::info!(station_id = %station.id, owner_id = %caller.id, "station created");
    Ok((StatusCode::CREATED, Json(station)))
}

/// PUT /api/v1/stations/:id. Partial update, owning user only.
pub async fn update_station(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(patch): Json<StationPatch>,
) -> Result<Json<Station>, AppError> {
    let caller = require(&identity)?;
    patch.validate()?;

    let station = state
        .store
        .get_station(id)
        .await?
        .ok_or(AppError::StationNotFound)?;
    if station.owner_id != caller.id {
        return Err(AppError::Forbidden(
            "only the station owner may update it".into(),
        ));
    }

    state.store.update_station(id, &patch).await?;
    let updated = state
        .store
        .get_station(id)
        .await?
        .ok_or(AppError::StationNotFound)?;
    Ok(Json(updated))
}

/// DELETE /api/v1/stations/:id. Owning user only.
pub async fn delete_station(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let caller = require(&identity)?;

    let station = state
        .store
        .get_station(id)
        .await?
        .ok_or(AppError::StationNotFound)?;
    if station.owner_id != caller.id {
        return Err(AppError::Forbidden(
            "only the station owner may delete it".into(),
        ));
    }

    state.store.delete_station(id).await?;
    tracing::info!(station_id = %id, "station deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/stations/:id/availability?date=YYYY-MM-DD&slot=HH:00
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let slot = TimeSlot::parse(&query.slot)?;
    let date = query.date.and_time(chrono::NaiveTime::MIN).and_utc();
    let available = state.bookings.is_available(id, date, slot).await?;
    Ok(Json(json!({
        "station_id": id,
        "date": query.date,
        "slot": slot,
        "available": available,
    })))
}

// ── Booking handlers ─────────────────────────────────────────

/// GET /api/v1/bookings. The caller's bookings, role-shaped, newest
/// first, each tagged with its display bucket.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let caller = require(&identity)?;
    let bookings = state.bookings.list(caller).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::now).collect()))
}

/// POST /api/v1/bookings. Reserve a slot.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let time_slot = TimeSlot::parse(&payload.time_slot)?;
    let booking = state
        .bookings
        .reserve(
            identity.caller(),
            ReserveRequest {
                station_id: payload.station_id,
                date: payload.date,
                time_slot,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::now(booking))))
}

/// POST /api/v1/bookings/:id/cancel. Flips to cancelled (idempotent).
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.bookings.cancel(identity.caller(), id).await?;
    Ok(Json(json!({ "id": id, "status": "cancelled" })))
}

/// GET /api/v1/bookings/:id/ics. Calendar invite for a booking.
pub async fn booking_ics(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.bookings.get_visible(identity.caller(), id).await?;
    let payload = ics::render(&booking, Utc::now());
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/calendar;charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"charging-slot-{}.ics\"", booking.id),
            ),
        ],
        payload,
    ))
}
