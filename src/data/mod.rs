//! Core data models for the rental API
//!
//! This module contains the resource types returned by the rental REST API
//! (vehicles, mechanics, bookings, user profiles) plus the client that fetches
//! them through the cache.

pub mod client;
pub mod token;

pub use client::{ApiError, RentalClient};
pub use token::{is_token_expired, time_until_expiry, token_expiry, TokenError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role of an account, which decides the dashboard it sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
    Mechanic,
    User,
    /// Any role this client does not know about
    #[serde(other)]
    Unknown,
}

/// Availability of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    #[default]
    Available,
    Rented,
    Maintenance,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

/// A rentable vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Server-assigned identifier
    #[serde(alias = "_id")]
    pub id: String,
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub license_plate: Option<String>,
    /// Rental price per day
    #[serde(default)]
    pub daily_rate: Option<f64>,
    #[serde(default)]
    pub status: VehicleStatus,
    /// Owning vendor account
    #[serde(default)]
    pub vendor_id: Option<String>,
}

/// A mechanic who services vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
}

/// Lifecycle state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A vehicle reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Absent until the server has stored the booking
    #[serde(alias = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

impl Booking {
    /// Number of rental days, counting both the start and end date
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// The signed-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vehicle_accepts_mongo_style_id_and_defaults() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "_id": "v1",
            "make": "Toyota",
            "model": "Corolla",
            "dailyRate": 45.5
        }))
        .unwrap();

        assert_eq!(vehicle.id, "v1");
        assert_eq!(vehicle.daily_rate, Some(45.5));
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert!(vehicle.license_plate.is_none());
    }

    #[test]
    fn test_unknown_vehicle_status_is_tolerated() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "id": "v2",
            "make": "Honda",
            "model": "Civic",
            "status": "impounded"
        }))
        .unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Unknown);
    }

    #[test]
    fn test_mechanic_defaults_to_available() {
        let mechanic: Mechanic =
            serde_json::from_value(json!({ "id": "m1", "name": "Sam" })).unwrap();
        assert!(mechanic.available);
    }

    #[test]
    fn test_booking_serializes_without_server_fields() {
        let booking = Booking {
            id: None,
            vehicle_id: "v1".to_string(),
            user_id: None,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            status: BookingStatus::Pending,
            total_price: None,
        };

        let value = serde_json::to_value(&booking).unwrap();

        assert_eq!(
            value,
            json!({
                "vehicleId": "v1",
                "startDate": "2026-03-01",
                "endDate": "2026-03-04",
                "status": "pending"
            })
        );
        assert_eq!(booking.days(), 4);
    }

    #[test]
    fn test_user_profile_role_parsing() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "vendor"
        }))
        .unwrap();
        assert_eq!(profile.role, Role::Vendor);
    }

    #[test]
    fn test_unrecognized_role_parses_as_unknown() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u2",
            "name": "Grace",
            "email": "grace@example.com",
            "role": "superadmin"
        }))
        .unwrap();
        assert_eq!(profile.role, Role::Unknown);
    }
}
