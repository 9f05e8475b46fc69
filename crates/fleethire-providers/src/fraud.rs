//! Fraudulent-claim reference table (original data feed: ABI).
//!
//! Claims are keyed by lowercased surname and normalized postcode; a
//! query is a hit only when the date of birth also matches, so
//! namesakes at different addresses rent freely.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDate;
use fleethire_core::error::FleetResult;
use fleethire_core::providers::{FraudProvider, FraudQuery};

/// One known fraudulent claimant.
#[derive(Debug, Clone)]
pub struct ClaimRecord {
    pub last_name: String,
    pub other_names: String,
    pub address: String,
    pub postcode: String,
    pub dob: NaiveDate,
}

fn key(last_name: &str, postcode: &str) -> (String, String) {
    (
        last_name.trim().to_lowercase(),
        postcode.trim().to_uppercase().replace(' ', ""),
    )
}

/// Claimants indexed by (surname, postcode).
#[derive(Debug, Clone, Default)]
pub struct FraudTable {
    entries: HashMap<(String, String), Vec<ClaimRecord>>,
}

impl FraudTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ClaimRecord) {
        self.entries
            .entry(key(&record.last_name, &record.postcode))
            .or_default()
            .push(record);
    }

    fn matches(&self, query: &FraudQuery) -> bool {
        self.entries
            .get(&key(&query.last_name, &query.postcode))
            .is_some_and(|claims| claims.iter().any(|c| c.dob == query.dob))
    }
}

/// [`FraudProvider`] backed by an atomically swappable table.
pub struct TableFraudProvider {
    table: RwLock<Arc<FraudTable>>,
}

impl TableFraudProvider {
    pub fn new(table: FraudTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub fn replace_table(&self, table: FraudTable) {
        let mut guard = self
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(table);
    }

    fn snapshot(&self) -> Arc<FraudTable> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FraudProvider for TableFraudProvider {
    async fn has_fraudulent_claim(&self, query: &FraudQuery) -> FleetResult<bool> {
        Ok(self.snapshot().matches(query))
    }
}
