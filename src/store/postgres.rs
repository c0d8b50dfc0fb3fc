use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Caller, Role};
use crate::errors::AppError;
use crate::models::{
    day_bounds, Booking, BookingStatus, NewBooking, NewStation, Station, StationPatch, TimeSlot,
    VehicleType,
};

use super::{BookingStore, CancelOutcome};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect with a bounded acquire timeout so a hung database turns
    /// into a surfaced error instead of an indefinitely busy request.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// -- Row structs --

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    user_name: String,
    station_id: Uuid,
    station_name: String,
    date: DateTime<Utc>,
    time_slot: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let time_slot = TimeSlot::parse(&row.time_slot)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt booking row: {}", e)))?;
        let status = BookingStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "corrupt booking row: unknown status '{}'",
                row.status
            ))
        })?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            station_id: row.station_id,
            station_name: row.station_name,
            date: row.date,
            time_slot,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StationRow {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    owner_name: String,
    latitude: f64,
    longitude: f64,
    vehicle_types: Vec<String>,
    price_per_hour: f64,
    available_slots: i32,
    description: String,
    address: String,
    is_active: bool,
    is_public: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<StationRow> for Station {
    type Error = AppError;

    fn try_from(row: StationRow) -> Result<Self, Self::Error> {
        let vehicle_types = row
            .vehicle_types
            .iter()
            .map(|v| {
                VehicleType::from_str(v).ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "corrupt station row: unknown vehicle type '{}'",
                        v
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Station {
            id: row.id,
            name: row.name,
            owner_id: row.owner_id,
            owner_name: row.owner_name,
            latitude: row.latitude,
            longitude: row.longitude,
            vehicle_types,
            price_per_hour: row.price_per_hour,
            available_slots: row.available_slots,
            description: row.description,
            address: row.address,
            is_active: row.is_active,
            is_public: row.is_public,
            created_at: row.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str =
    "id, user_id, user_name, station_id, station_name, date, time_slot, status, created_at";

const STATION_COLUMNS: &str = "id, name, owner_id, owner_name, latitude, longitude, \
     vehicle_types, price_per_hour, available_slots, description, address, \
     is_active, is_public, created_at";

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, new: &NewBooking) -> Result<Option<Booking>, AppError> {
        // The partial unique index on (station, day, slot) WHERE confirmed
        // arbitrates concurrent reservations; losing the race comes back
        // as no row instead of a duplicate.
        let row = sqlx::query_as::<_, BookingRow>(
            r#"INSERT INTO bookings (user_id, user_name, station_id, station_name, date, time_slot, status)
               VALUES ($1, $2, $3, $4, $5, $6, 'confirmed')
               ON CONFLICT (station_id, ((date AT TIME ZONE 'UTC')::date), time_slot)
                   WHERE status = 'confirmed'
               DO NOTHING
               RETURNING id, user_id, user_name, station_id, station_name, date, time_slot, status, created_at"#,
        )
        .bind(new.user_id)
        .bind(&new.user_name)
        .bind(new.station_id)
        .bind(&new.station_name)
        .bind(new.date)
        .bind(new.time_slot.label())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn confirmed_booking_exists(
        &self,
        station_id: Uuid,
        date: DateTime<Utc>,
        slot: TimeSlot,
    ) -> Result<bool, AppError> {
        let (day_start, day_end) = day_bounds(date);
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM bookings
                   WHERE station_id = $1
                     AND date >= $2 AND date <= $3
                     AND time_slot = $4
                     AND status = 'confirmed')"#,
        )
        .bind(station_id)
        .bind(day_start)
        .bind(day_end)
        .bind(slot.label())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn cancel_booking(&self, id: Uuid) -> Result<CancelOutcome, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = NOW()
             WHERE id = $1 AND status <> 'cancelled'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(CancelOutcome::Cancelled);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(if exists {
            CancelOutcome::AlreadyCancelled
        } else {
            CancelOutcome::NotFound
        })
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn bookings_for_stations(&self, station_ids: &[Uuid]) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE station_id = ANY($1) ORDER BY date DESC"
        ))
        .bind(station_ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn mark_completed_before(&self, day: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'completed', updated_at = NOW()
             WHERE status = 'confirmed' AND (date AT TIME ZONE 'UTC')::date < $1",
        )
        .bind(day)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_station(
        &self,
        owner: &Caller,
        new: &NewStation,
    ) -> Result<Station, AppError> {
        let vehicle_types: Vec<String> = new
            .vehicle_types
            .iter()
            .map(|v| v.as_str().to_string())
            .collect();
        let row = sqlx::query_as::<_, StationRow>(&format!(
            r#"INSERT INTO stations (name, owner_id, owner_name, latitude, longitude,
                   vehicle_types, price_per_hour, available_slots, description, address,
                   is_active, is_public)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING {STATION_COLUMNS}"#
        ))
        .bind(&new.name)
        .bind(owner.id)
        .bind(&owner.name)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(&vehicle_types)
        .bind(new.price_per_hour)
        .bind(new.available_slots)
        .bind(&new.description)
        .bind(&new.address)
        .bind(new.is_active)
        .bind(new.is_public)
        .fetch_one(&self.pool)
        .await?;
        Station::try_from(row)
    }

    async fn get_station(&self, id: Uuid) -> Result<Option<Station>, AppError> {
        let row = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {STATION_COLUMNS} FROM stations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Station::try_from).transpose()
    }

    async fn update_station(&self, id: Uuid, patch: &StationPatch) -> Result<bool, AppError> {
        let vehicle_types: Option<Vec<String>> = patch
            .vehicle_types
            .as_ref()
            .map(|vs| vs.iter().map(|v| v.as_str().to_string()).collect());
        let result = sqlx::query(
            r#"UPDATE stations
               SET name = COALESCE($1, name),
                   latitude = COALESCE($2, latitude),
                   longitude = COALESCE($3, longitude),
                   vehicle_types = COALESCE($4, vehicle_types),
                   price_per_hour = COALESCE($5, price_per_hour),
                   available_slots = COALESCE($6, available_slots),
                   description = COALESCE($7, description),
                   address = COALESCE($8, address),
                   is_active = COALESCE($9, is_active),
                   is_public = COALESCE($10, is_public),
                   updated_at = NOW()
               WHERE id = $11"#,
        )
        .bind(&patch.name)
        .bind(patch.latitude)
        .bind(patch.longitude)
        .bind(&vehicle_types)
        .bind(patch.price_per_hour)
        .bind(patch.available_slots)
        .bind(&patch.description)
        .bind(&patch.address)
        .bind(patch.is_active)
        .bind(patch.is_public)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_station(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM stations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_active_stations(&self) -> Result<Vec<Station>, AppError> {
        let rows = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {STATION_COLUMNS} FROM stations WHERE is_active = true ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Station::try_from).collect()
    }

    async fn stations_for_owner(&self, owner_id: Uuid) -> Result<Vec<Station>, AppError> {
        let rows = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {STATION_COLUMNS} FROM stations WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Station::try_from).collect()
    }

    async fn station_ids_for_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM stations WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn caller_by_session(&self, token_hash: &str) -> Result<Option<Caller>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, String, Option<String>, String)>(
            r#"SELECT u.id, u.name, u.email, u.role
               FROM sessions s
               JOIN users u ON u.id = s.user_id
               WHERE s.token_hash = $1 AND s.expires_at > NOW()"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, name, email, role)| Caller {
            id,
            name,
            email,
            role: Role::from_str(&role),
        }))
    }
}
