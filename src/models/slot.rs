use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First bookable hour of the day (slot "08:00").
pub const FIRST_SLOT_HOUR: u8 = 8;
/// One past the last bookable start hour (slot "19:00" ends at 20:00).
pub const LAST_SLOT_HOUR: u8 = 20;

#[derive(Debug, Error)]
#[error("invalid time slot '{0}': expected one of the hourly labels 08:00 through 19:00")]
pub struct InvalidTimeSlot(pub String);

/// One of the twelve fixed 1-hour booking slots, identified by its start
/// hour label ("08:00" .. "19:00").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    start_hour: u8,
}

impl TimeSlot {
    pub fn parse(label: &str) -> Result<Self, InvalidTimeSlot> {
        let (hour, minute) = label
            .split_once(':')
            .ok_or_else(|| InvalidTimeSlot(label.to_string()))?;
        let hour: u8 = hour
            .parse()
            .map_err(|_| InvalidTimeSlot(label.to_string()))?;
        if minute != "00" || hour < FIRST_SLOT_HOUR || hour >= LAST_SLOT_HOUR {
            return Err(InvalidTimeSlot(label.to_string()));
        }
        Ok(TimeSlot { start_hour: hour })
    }

    pub fn start_hour(&self) -> u8 {
        self.start_hour
    }

    /// End of the slot; booking a slot reserves exactly one hour.
    pub fn end_hour(&self) -> u8 {
        self.start_hour + 1
    }

    pub fn label(&self) -> String {
        format!("{:02}:00", self.start_hour)
    }

    /// All twelve slots in day order, for listings and seed data.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (FIRST_SLOT_HOUR..LAST_SLOT_HOUR).map(|h| TimeSlot { start_hour: h })
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.start_hour)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = InvalidTimeSlot;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeSlot::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_fixed_slot() {
        let slots: Vec<TimeSlot> = TimeSlot::all().collect();
        assert_eq!(slots.len(), 12);
        for slot in &slots {
            let reparsed = TimeSlot::parse(&slot.label()).unwrap();
            assert_eq!(*slot, reparsed);
        }
        assert_eq!(slots[0].label(), "08:00");
        assert_eq!(slots[11].label(), "19:00");
        assert_eq!(slots[11].end_hour(), 20);
    }

    #[test]
    fn rejects_labels_outside_the_grid() {
        // "255:00" pins the u8 bound check: no arithmetic on the raw hour.
        for bad in ["07:00", "20:00", "14:30", "14", "2PM", "", "ab:00", "255:00", "256:00"] {
            assert!(TimeSlot::parse(bad).is_err(), "should reject {:?}", bad);
        }
    }

    #[test]
    fn serde_uses_the_label() {
        let slot = TimeSlot::parse("14:00").unwrap();
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"14:00\"");
        let back: TimeSlot = serde_json::from_str("\"14:00\"").unwrap();
        assert_eq!(back, slot);
        assert!(serde_json::from_str::<TimeSlot>("\"25:00\"").is_err());
    }
}
