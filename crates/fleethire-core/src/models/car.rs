//! Car domain model.
//!
//! Attribute ids (fuel, gears, body, size, colour) reference lookup
//! tables owned by the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    pub description: String,
    /// Rental cost per whole day.
    pub daily_rate: f64,
    pub disabled: bool,
    /// Only customers aged 25+ may book this car.
    pub over_25: bool,
    pub seats: u32,
    pub fuel_type: i64,
    pub gear_type: i64,
    pub body_type: i64,
    pub size: i64,
    pub colour: i64,
    /// Stored image reference.
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCar {
    pub description: String,
    pub daily_rate: f64,
    pub disabled: bool,
    pub over_25: bool,
    pub seats: u32,
    pub fuel_type: i64,
    pub gear_type: i64,
    pub body_type: i64,
    pub size: i64,
    pub colour: i64,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCar {
    pub description: Option<String>,
    pub daily_rate: Option<f64>,
    pub disabled: Option<bool>,
    pub over_25: Option<bool>,
    pub seats: Option<u32>,
    pub fuel_type: Option<i64>,
    pub gear_type: Option<i64>,
    pub body_type: Option<i64>,
    pub size: Option<i64>,
    pub colour: Option<i64>,
    pub image: Option<String>,
}
