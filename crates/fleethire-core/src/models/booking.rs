//! Booking domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::Stage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// End date, or end + 1 day when a late/full-day increment
    /// applies. Always >= `end`.
    pub finish: NaiveDate,
    pub total_cost: f64,
    pub amount_paid: f64,
    pub late_return: bool,
    pub full_day: bool,
    /// Decimal rental days; reconciles with `total_cost / daily rate`.
    pub booking_length: f64,
    /// Current main lifecycle stage.
    pub process: Stage,
    pub driver_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn amount_due(&self) -> f64 {
        self.total_cost - self.amount_paid
    }

    /// An outstanding balance in the customer's favour.
    pub fn is_refund(&self) -> bool {
        self.amount_paid > self.total_cost || self.process == Stage::Cancelled
    }

    /// The per-day rate the booking was priced at. Edits and
    /// extensions always derive the rate from the stored totals so
    /// repeated recalculation cannot drift.
    pub fn daily_rate(&self) -> f64 {
        self.total_cost / self.booking_length
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub finish: NaiveDate,
    pub total_cost: f64,
    pub late_return: bool,
    pub full_day: bool,
    pub booking_length: f64,
}

/// Replacement terms written by an edit or extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingTerms {
    pub total_cost: f64,
    pub booking_length: f64,
    pub late_return: bool,
    pub full_day: bool,
    pub end: NaiveDate,
    pub finish: NaiveDate,
}
