//! External collaborator trait definitions: identity verification
//! providers, notification delivery and document storage.
//!
//! The booking crate consumes these seams; reference implementations
//! live in `fleethire-providers`.

use chrono::NaiveDate;

use crate::error::FleetResult;
use crate::models::driver::Driver;

/// Identity fields used to query the fraud-claim register.
#[derive(Debug, Clone)]
pub struct FraudQuery {
    pub last_name: String,
    pub other_names: String,
    pub address: String,
    pub postcode: String,
    pub dob: NaiveDate,
}

/// Licence-validity register (original: DVLA data feed).
pub trait LicenceProvider: Send + Sync {
    /// True when the licence is flagged (suspended, lost/stolen,
    /// expired...). Unknown licences are valid.
    fn is_invalid_licence(
        &self,
        licence_number: &str,
    ) -> impl Future<Output = FleetResult<bool>> + Send;
}

/// Fraudulent-claim register (original: ABI database).
pub trait FraudProvider: Send + Sync {
    fn has_fraudulent_claim(
        &self,
        query: &FraudQuery,
    ) -> impl Future<Output = FleetResult<bool>> + Send;
}

/// Fire-and-forget notification delivery.
pub trait Notifier: Send + Sync {
    fn notify_invalid_licence(&self, driver: &Driver)
    -> impl Future<Output = FleetResult<()>> + Send;
}

/// Which identity document an upload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Licence,
    Proof1,
    Proof2,
}

impl DocumentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Licence => "licence",
            DocumentKind::Proof1 => "document1",
            DocumentKind::Proof2 => "document2",
        }
    }
}

/// Persistence for uploaded identity documents.
pub trait DocumentStore: Send + Sync {
    /// Stores the image and returns an opaque stored reference.
    fn save_image(
        &self,
        driver_id: uuid::Uuid,
        booking_id: uuid::Uuid,
        kind: DocumentKind,
        bytes: Vec<u8>,
    ) -> impl Future<Output = FleetResult<String>> + Send;
}
