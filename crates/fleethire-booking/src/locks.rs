//! Per-booking transition locks.
//!
//! The storage layer has no multi-statement transactions, so each
//! booking transition takes an in-process async mutex keyed by
//! booking id and re-reads its state after acquisition. At most one
//! transition runs per booking at a time within this process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

#[derive(Default)]
pub(crate) struct LockRegistry {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Handle for the booking's mutex, created on first use. Handles
    /// are never reaped; the map grows with the set of bookings this
    /// process has touched.
    pub(crate) fn handle(&self, booking_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(booking_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
