//! Cross-platform storage backend for persisting reports.
//!
//! The report list lives in a single key-value slot (see
//! [`REPORTS_STORAGE_KEY`](crate::config::REPORTS_STORAGE_KEY)). This module
//! provides the platform-agnostic slot abstraction:
//!
//! - **Web (WASM)**: the browser shell implements [`StorageBackend`] over
//!   `localStorage`
//! - **Desktop**: [`NativeStorage`] writes files under a data directory
//!   (`tokio::fs`, temp file + rename)
//! - **Tests**: [`InMemoryStorage`] keeps bytes in a map
//!
//! # Storage Backend Trait
//!
//! - `save(key, data)` - Replace the slot with new bytes
//! - `load(key)` - Read the slot back
//!
//! Clearing the reports writes an empty list rather than deleting the slot.
//!
//! # Error Handling
//!
//! All storage operations return `Result<T, StorageError>`. A failed write is
//! reportable but never fatal: the store rolls back and the session may carry
//! on in memory.

#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeStorage;

use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Storage backend abstraction for cross-platform persistence.
#[async_trait::async_trait(?Send)]
pub trait StorageBackend {
    /// Save binary data to storage with a key, replacing any previous value.
    #[must_use = "Storage save failures should be handled"]
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Load binary data from storage by key.
    #[must_use = "Storage load failures should be handled"]
    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Storage quota exceeded")]
    QuotaExceeded,
}

/// Storage failures surfaced by the report store.
pub type PersistenceError = StorageError;

/// In-memory storage backend.
///
/// Keeps every slot in a map for the lifetime of the value. Used by tests and
/// by frontends that run without durable storage.
#[derive(Default)]
pub struct InMemoryStorage {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait(?Send)]
impl StorageBackend for InMemoryStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|e| StorageError::IoError(format!("Lock poisoned: {}", e)))?;
        slots.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let slots = self
            .slots
            .read()
            .map_err(|e| StorageError::IoError(format!("Lock poisoned: {}", e)))?;
        slots
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

// Blanket implementation for Arc<T> where T: StorageBackend
// This allows several stores to share one backend (e.g., reload in tests)
#[async_trait::async_trait(?Send)]
impl<T: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<T> {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        (**self).save(key, data).await
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).load(key).await
    }
}
