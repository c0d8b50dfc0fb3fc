use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    #[serde(rename = "2W")]
    TwoWheeler,
    #[serde(rename = "4W")]
    FourWheeler,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::TwoWheeler => "2W",
            VehicleType::FourWheeler => "4W",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "2W" => Some(VehicleType::TwoWheeler),
            "4W" => Some(VehicleType::FourWheeler),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vehicle_types: Vec<VehicleType>,
    pub price_per_hour: f64,
    pub available_slots: i32,
    pub description: String,
    pub address: String,
    pub is_active: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Owner-supplied fields for a new station listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vehicle_types: Vec<VehicleType>,
    pub price_per_hour: f64,
    pub available_slots: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

impl NewStation {
    /// Input validation, run before any store call.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("station name must not be empty".into()));
        }
        if !(self.price_per_hour > 0.0) {
            return Err(AppError::Validation(
                "price per hour must be positive".into(),
            ));
        }
        if self.available_slots < 1 {
            return Err(AppError::Validation(
                "a station must expose at least one charging slot".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::Validation("coordinates out of range".into()));
        }
        Ok(())
    }
}

/// Partial update; unspecified fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationPatch {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub vehicle_types: Option<Vec<VehicleType>>,
    pub price_per_hour: Option<f64>,
    pub available_slots: Option<i32>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
}

impl StationPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("station name must not be empty".into()));
            }
        }
        if let Some(price) = self.price_per_hour {
            if !(price > 0.0) {
                return Err(AppError::Validation(
                    "price per hour must be positive".into(),
                ));
            }
        }
        if let Some(slots) = self.available_slots {
            if slots < 1 {
                return Err(AppError::Validation(
                    "a station must expose at least one charging slot".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewStation {
        NewStation {
            name: "Green Park Hub".into(),
            latitude: 12.97,
            longitude: 77.59,
            vehicle_types: vec![VehicleType::TwoWheeler, VehicleType::FourWheeler],
            price_per_hour: 6.5,
            available_slots: 4,
            description: String::new(),
            address: String::new(),
            is_active: true,
            is_public: true,
        }
    }

    #[test]
    fn accepts_a_valid_station() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_price() {
        let mut s = valid();
        s.price_per_hour = 0.0;
        assert!(s.validate().is_err());
        s.price_per_hour = -3.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_zero_slots_and_blank_name() {
        let mut s = valid();
        s.available_slots = 0;
        assert!(s.validate().is_err());

        let mut s = valid();
        s.name = "   ".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn vehicle_type_serde_uses_wire_labels() {
        assert_eq!(
            serde_json::to_string(&VehicleType::TwoWheeler).unwrap(),
            "\"2W\""
        );
        let v: VehicleType = serde_json::from_str("\"4W\"").unwrap();
        assert_eq!(v, VehicleType::FourWheeler);
    }
}
