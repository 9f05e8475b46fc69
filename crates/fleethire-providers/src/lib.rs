//! FLEETHIRE Providers — reference implementations of the external
//! collaborator traits: licence and fraud-claim reference tables with
//! atomic table swap, a tracing-backed notifier, and an in-memory
//! document store.

mod document;
mod fraud;
mod licence;
mod notify;

pub use document::MemoryDocumentStore;
pub use fraud::{ClaimRecord, FraudTable, TableFraudProvider};
pub use licence::{
    LicenceFlag, LicenceTable, LicenceTableSource, TableLicenceProvider, spawn_refresh,
};
pub use notify::TracingNotifier;
