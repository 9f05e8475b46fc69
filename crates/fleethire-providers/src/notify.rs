//! Notification delivery.
//!
//! Mail delivery is an external collaborator; this implementation
//! records the notification in the structured log so operators can
//! follow up.

use fleethire_core::error::FleetResult;
use fleethire_core::models::driver::Driver;
use fleethire_core::providers::Notifier;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    async fn notify_invalid_licence(&self, driver: &Driver) -> FleetResult<()> {
        info!(
            driver_id = %driver.id,
            last_name = %driver.last_name,
            licence_number = %driver.licence_number,
            "Invalid licence presented at collection"
        );
        Ok(())
    }
}
