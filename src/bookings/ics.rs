//! iCalendar generation for a booking: one VEVENT spanning the reserved
//! hour. Generation only, never parsed back.

use chrono::{DateTime, Utc};

use crate::models::Booking;

fn ics_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Render the .ics payload for a booking. The event starts at the slot's
/// hour on the booked day and ends one hour later; lines are CRLF-joined
/// per RFC 5545.
pub fn render(booking: &Booking, now: DateTime<Utc>) -> String {
    let midnight = booking.date.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    let start = midnight + chrono::Duration::hours(booking.time_slot.start_hour() as i64);
    let end = start + chrono::Duration::hours(1);

    [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//EVCharge//EN".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@evcharge.app", booking.id),
        format!("SUMMARY:EV Charging Slot at {}", booking.station_name),
        format!(
            "DESCRIPTION:Your charging slot at {}. Booking ID: {}",
            booking.station_name, booking.id
        ),
        format!("LOCATION:{}", booking.station_name),
        format!("DTSTART:{}", ics_timestamp(start)),
        format!("DTEND:{}", ics_timestamp(end)),
        "STATUS:CONFIRMED".to_string(),
        format!("DTSTAMP:{}", ics_timestamp(now)),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ]
    .join("\r\n")
}
