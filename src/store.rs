//! The ledger that durably keeps blobs, keyed by transaction id.
//!
//! This crate only consumes a store through the DA backends; the trait is the
//! seam a native library or a test harness implements. [`MemoryBlobStore`]
//! is a process-local store for embedding and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::blob::{Blob, TxId};
use crate::namespace::Namespace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

pub trait BlobStore: Send + Sync {
    /// Persist `blob` and return the id of the transaction that holds it.
    fn store(&self, namespace: Namespace, blob: Blob) -> Result<TxId, StoreError>;
    /// `Ok(None)` when no transaction with that id carries a blob.
    fn load(&self, tx_id: &TxId) -> Result<Option<Blob>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<TxId, Blob>>,
    nonce: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, namespace: Namespace, blob: Blob) -> Result<TxId, StoreError> {
        // Same data stored twice still lands in two distinct transactions.
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&namespace.to_bytes());
        hasher.update(&nonce.to_be_bytes());
        hasher.update(&blob.data);
        let tx_id: TxId = hasher.finalize().into();

        self.blobs
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .insert(tx_id, blob);
        Ok(tx_id)
    }

    fn load(&self, tx_id: &TxId) -> Result<Option<Blob>, StoreError> {
        Ok(self
            .blobs
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .get(tx_id)
            .cloned())
    }
}
