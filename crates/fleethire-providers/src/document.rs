//! In-memory document storage.
//!
//! Holds uploaded identity documents keyed by their stored
//! reference. Production deployments put an object store behind the
//! same trait.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use fleethire_core::error::FleetResult;
use fleethire_core::providers::{DocumentKind, DocumentStore};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a stored image by its reference.
    pub fn get(&self, reference: &str) -> Option<Vec<u8>> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn save_image(
        &self,
        driver_id: Uuid,
        booking_id: Uuid,
        kind: DocumentKind,
        bytes: Vec<u8>,
    ) -> FleetResult<String> {
        let reference = format!("{driver_id}/{booking_id}/{}", kind.as_str());
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.clone(), bytes);
        Ok(reference)
    }
}
