use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slot::TimeSlot;

/// Persisted lifecycle state of a booking. `Completed` is only ever set by
/// the background completion sweep, never by a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Display copy of the booker's name, denormalized at creation.
    pub user_name: String,
    pub station_id: Uuid,
    /// Display copy of the station name, denormalized at creation.
    pub station_name: String,
    /// The reserved calendar day. Slot matching normalizes this to the UTC
    /// day; the instant itself is what the classifier compares against.
    pub date: DateTime<Utc>,
    pub time_slot: TimeSlot,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn bucket(&self, now: DateTime<Utc>) -> BookingBucket {
        classify(self.status, self.date, now)
    }
}

/// Fields the reservation service supplies; id, status and created_at are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub user_name: String,
    pub station_id: Uuid,
    pub station_name: String,
    pub date: DateTime<Utc>,
    pub time_slot: TimeSlot,
}

/// Display partition of a booking. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingBucket {
    Upcoming,
    Past,
    Cancelled,
}

/// Pure classification of a booking against `now`. A booking dated exactly
/// `now` is `Past`: the upcoming boundary is exclusive.
pub fn classify(status: BookingStatus, date: DateTime<Utc>, now: DateTime<Utc>) -> BookingBucket {
    match status {
        BookingStatus::Cancelled => BookingBucket::Cancelled,
        BookingStatus::Confirmed if date > now => BookingBucket::Upcoming,
        _ => BookingBucket::Past,
    }
}

/// Inclusive UTC bounds of the calendar day containing `date`:
/// [00:00:00.000, 23:59:59.999]. Slot availability matches within these.
pub fn day_bounds(date: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    let end = start + chrono::Duration::milliseconds(86_400_000 - 1);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn cancelled_wins_regardless_of_date() {
        let now = at("2025-06-10T12:00:00Z");
        let future = at("2025-07-01T00:00:00Z");
        let past = at("2025-05-01T00:00:00Z");
        assert_eq!(
            classify(BookingStatus::Cancelled, future, now),
            BookingBucket::Cancelled
        );
        assert_eq!(
            classify(BookingStatus::Cancelled, past, now),
            BookingBucket::Cancelled
        );
    }

    #[test]
    fn confirmed_future_is_upcoming() {
        let now = at("2025-06-10T12:00:00Z");
        assert_eq!(
            classify(BookingStatus::Confirmed, at("2025-06-11T00:00:00Z"), now),
            BookingBucket::Upcoming
        );
    }

    #[test]
    fn confirmed_past_is_past() {
        let now = at("2025-06-10T12:00:00Z");
        assert_eq!(
            classify(BookingStatus::Confirmed, at("2025-06-09T00:00:00Z"), now),
            BookingBucket::Past
        );
    }

    #[test]
    fn exact_equality_to_the_millisecond_is_past() {
        // Pins the boundary: `>` not `>=`, so date == now lands in Past.
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(
            classify(BookingStatus::Confirmed, now, now),
            BookingBucket::Past
        );
        assert_eq!(
            classify(
                BookingStatus::Confirmed,
                now + chrono::Duration::milliseconds(1),
                now
            ),
            BookingBucket::Upcoming
        );
    }

    #[test]
    fn completed_classifies_as_past() {
        let now = at("2025-06-10T12:00:00Z");
        assert_eq!(
            classify(BookingStatus::Completed, at("2025-07-01T00:00:00Z"), now),
            BookingBucket::Past
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let now = at("2025-06-10T12:00:00Z");
        let date = at("2025-06-12T00:00:00Z");
        let first = classify(BookingStatus::Confirmed, date, now);
        for _ in 0..10 {
            assert_eq!(classify(BookingStatus::Confirmed, date, now), first);
        }
    }

    #[test]
    fn day_bounds_cover_the_whole_utc_day() {
        let (start, end) = day_bounds(at("2025-06-10T14:37:05Z"));
        assert_eq!(start, at("2025-06-10T00:00:00Z"));
        assert_eq!(end.to_rfc3339(), "2025-06-10T23:59:59.999+00:00");
    }

    #[test]
    fn status_text_round_trips() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::from_str("pending"), None);
    }
}
