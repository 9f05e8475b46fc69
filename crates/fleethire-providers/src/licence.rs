//! Licence-validity reference table (original data feed: DVLA).
//!
//! The provider holds the whole table behind an `Arc` and swaps it
//! atomically on refresh, so lookups never observe a partially
//! loaded table. Unknown licences are valid.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use fleethire_core::error::FleetResult;
use fleethire_core::providers::LicenceProvider;
use tracing::{info, warn};

/// Why a licence is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenceFlag {
    Suspended,
    LostOrStolen,
    Expired,
}

/// Licence number -> flag. Absence means the licence is fine.
#[derive(Debug, Clone, Default)]
pub struct LicenceTable {
    entries: HashMap<String, LicenceFlag>,
}

impl LicenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, licence_number: impl Into<String>, flag: LicenceFlag) {
        self.entries.insert(licence_number.into(), flag);
    }

    pub fn flag(&self, licence_number: &str) -> Option<LicenceFlag> {
        self.entries.get(licence_number).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source a refreshed table can be pulled from.
pub trait LicenceTableSource: Send + Sync {
    fn load(&self) -> impl Future<Output = FleetResult<LicenceTable>> + Send;
}

/// [`LicenceProvider`] backed by an atomically swappable table.
pub struct TableLicenceProvider {
    table: RwLock<Arc<LicenceTable>>,
}

impl TableLicenceProvider {
    pub fn new(table: LicenceTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// Swap in a freshly loaded table. Readers holding the old `Arc`
    /// finish against the old data.
    pub fn replace_table(&self, table: LicenceTable) {
        let mut guard = self
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(table);
    }

    fn snapshot(&self) -> Arc<LicenceTable> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LicenceProvider for TableLicenceProvider {
    async fn is_invalid_licence(&self, licence_number: &str) -> FleetResult<bool> {
        Ok(self.snapshot().flag(licence_number).is_some())
    }
}

/// Periodically pull a fresh table from `source` into `provider`.
/// Load failures are logged and the previous table stays in place.
pub fn spawn_refresh<S>(
    provider: Arc<TableLicenceProvider>,
    source: S,
    interval: Duration,
) -> tokio::task::JoinHandle<()>
where
    S: LicenceTableSource + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match source.load().await {
                Ok(table) => {
                    info!(entries = table.len(), "Licence table refreshed");
                    provider.replace_table(table);
                }
                Err(error) => {
                    warn!(%error, "Licence table refresh failed, keeping previous table");
                }
            }
        }
    })
}
