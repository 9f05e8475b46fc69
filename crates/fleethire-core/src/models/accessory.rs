//! Booking accessory (add-on equipment) model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accessory {
    pub id: Uuid,
    pub description: String,
}
