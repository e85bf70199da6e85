//! Write-through report store.
//!
//! [`ReportStore`] exclusively owns the report list. Every mutation is staged
//! on a copy of the list, written to the storage slot, and only then swapped
//! in. A failed write leaves the previous list untouched and returns
//! [`StoreError::Persistence`].
//!
//! # Id assignment
//!
//! Ids are `max(existing) + 1`. The store also remembers the highest id it
//! has handed out, so deleting the newest report does not let its id be
//! reused later in the same session. Once `u64::MAX` is taken, `add` fails
//! with [`StoreError::IdsExhausted`].
//!
//! # Memory-only mode
//!
//! After a persistence failure the caller may call
//! [`ReportStore::detach_storage`] and keep working in memory for the rest of
//! the session.

use crate::config::REPORTS_STORAGE_KEY;
use crate::error::StoreError;
use crate::report::{Report, ReportId, ReportStatus};
use crate::storage::{PersistenceError, StorageBackend, StorageError};
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub struct ReportStore<S> {
    storage: Option<S>,
    reports: Vec<Report>,
    /// Highest id ever held by this store
    high_water: u64,
}

impl<S: StorageBackend> ReportStore<S> {
    /// Opens the store over `storage` and loads the persisted list.
    ///
    /// Absent or malformed data yields an empty store; this never fails.
    pub async fn open(storage: S) -> Self {
        let mut store = Self {
            storage: Some(storage),
            reports: Vec::new(),
            high_water: 0,
        };
        store.load().await;
        store
    }

    /// Creates a store that never touches storage.
    pub fn in_memory() -> Self {
        Self {
            storage: None,
            reports: Vec::new(),
            high_water: 0,
        }
    }

    /// Re-reads the storage slot, replacing the in-memory list.
    ///
    /// Returns the loaded reports. Missing, unreadable or malformed data
    /// yields an empty list; individual malformed records and duplicate ids
    /// are skipped with a warning.
    pub async fn load(&mut self) -> Vec<Report> {
        let reports = match &self.storage {
            Some(storage) => read_slot(storage).await,
            None => return self.reports.clone(),
        };

        self.high_water = max_id(&reports);
        self.reports = reports;
        info!("Loaded {} reports", self.reports.len());
        self.reports.clone()
    }

    /// Serializes `reports` and writes them to the storage slot.
    ///
    /// In memory-only mode this is a no-op.
    pub async fn save(&self, reports: &[Report]) -> Result<(), PersistenceError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        let bytes = serde_json::to_vec(reports).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize reports: {}", e))
        })?;
        storage.save(REPORTS_STORAGE_KEY, &bytes).await?;
        debug!("Persisted {} reports ({} bytes)", reports.len(), bytes.len());
        Ok(())
    }

    /// Assigns the next id, appends, persists and returns the stored record.
    ///
    /// Any id already on `report` is ignored.
    pub async fn add(&mut self, mut report: Report) -> Result<Report, StoreError> {
        report.id = self.next_id()?;

        let mut next = self.reports.clone();
        next.push(report.clone());
        self.commit(next).await?;

        self.high_water = self.high_water.max(report.id.as_u64());
        info!("Added report {} ({})", report.id, report.emergency_type);
        Ok(report)
    }

    /// Replaces the record matching `id`. The stored record keeps `id`.
    ///
    /// A resolved report cannot be reopened through an update.
    pub async fn update(&mut self, id: ReportId, mut report: Report) -> Result<Report, StoreError> {
        let index = self.index_of(id)?;
        let current = self.reports[index].status;
        if !current.can_transition_to(report.status) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: report.status,
            });
        }

        report.id = id;
        let mut next = self.reports.clone();
        next[index] = report.clone();
        self.commit(next).await?;

        info!("Updated report {}", id);
        Ok(report)
    }

    /// Removes the record matching `id`.
    pub async fn remove(&mut self, id: ReportId) -> Result<(), StoreError> {
        let index = self.index_of(id)?;

        let mut next = self.reports.clone();
        next.remove(index);
        self.commit(next).await?;

        info!("Removed report {}", id);
        Ok(())
    }

    /// Changes the status of `id`.
    ///
    /// Setting the status a report already has is a no-op that returns the
    /// record without writing. RESOLVED -> OPEN is rejected.
    pub async fn set_status(
        &mut self,
        id: ReportId,
        status: ReportStatus,
    ) -> Result<Report, StoreError> {
        let index = self.index_of(id)?;
        let current = self.reports[index].status;

        if current == status {
            return Ok(self.reports[index].clone());
        }
        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        let mut next = self.reports.clone();
        next[index].status = status;
        let updated = next[index].clone();
        self.commit(next).await?;

        info!("Report {} is now {}", id, status);
        Ok(updated)
    }

    /// Empties the list.
    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.commit(Vec::new()).await?;
        info!("Cleared all reports");
        Ok(())
    }

    /// Stops persisting. Returns the detached backend, if any.
    pub fn detach_storage(&mut self) -> Option<S> {
        if self.storage.is_some() {
            warn!("Report store switched to memory-only mode");
        }
        self.storage.take()
    }

    async fn commit(&mut self, next: Vec<Report>) -> Result<(), StoreError> {
        if let Err(e) = self.save(&next).await {
            warn!("Failed to persist reports, keeping previous state: {}", e);
            return Err(StoreError::Persistence(e));
        }
        self.reports = next;
        Ok(())
    }
}

impl<S> ReportStore<S> {
    /// Read-only view of the current list, in insertion order.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn get(&self, id: ReportId) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: ReportId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Whether mutations are written through to storage.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// The id the next `add` will assign.
    pub fn next_id(&self) -> Result<ReportId, StoreError> {
        ReportId::from_u64(self.high_water.max(max_id(&self.reports)))
            .next()
            .ok_or(StoreError::IdsExhausted)
    }

    fn index_of(&self, id: ReportId) -> Result<usize, StoreError> {
        self.reports
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

fn max_id(reports: &[Report]) -> u64 {
    reports.iter().map(|r| r.id.as_u64()).max().unwrap_or(0)
}

async fn read_slot<S: StorageBackend>(storage: &S) -> Vec<Report> {
    let bytes = match storage.load(REPORTS_STORAGE_KEY).await {
        Ok(bytes) => bytes,
        Err(StorageError::NotFound(_)) => return Vec::new(),
        Err(e) => {
            warn!("Failed to read reports, starting empty: {}", e);
            return Vec::new();
        }
    };

    let values: Vec<serde_json::Value> = match serde_json::from_slice(&bytes) {
        Ok(values) => values,
        Err(e) => {
            warn!("Stored reports are malformed, starting empty: {}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut reports = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<Report>(value) {
            Ok(report) if seen.insert(report.id) => reports.push(report),
            Ok(report) => warn!("Skipping report with duplicate id {}", report.id),
            Err(e) => warn!("Skipping malformed report: {}", e),
        }
    }
    reports
}
