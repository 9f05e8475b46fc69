//! Booking status — the append-only lifecycle event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::Stage;

/// One row of a booking's history. "Active" rows represent
/// currently-open stages (e.g. awaiting payment) and are explicitly
/// deactivated before the next stage is opened; inactive rows are
/// pure history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStatus {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub stage: Stage,
    pub active: bool,
    /// `None` = opened by the system or the customer.
    pub admin_id: Option<Uuid>,
    pub description: String,
    /// Stage-specific amount (payment due, refund issued, new day
    /// count for extensions).
    pub extra_amount: f64,
    pub created_at: DateTime<Utc>,
}
