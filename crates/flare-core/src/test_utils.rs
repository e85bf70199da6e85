//! Test utilities for flare-core.
//!
//! Shared fixtures for unit tests. Only compiled when running tests.

use crate::error::LookupError;
use crate::geocoding::{AddressDetails, Geocoder, ReverseGeocode, Suggestion};
use crate::report::{EmergencyType, Geocode, Report, ReportId, ReportStatus};
use crate::storage::{StorageBackend, StorageError};
use chrono::{TimeZone, Utc};
use std::cell::Cell;

pub fn sample_report(id: u64, lat: f64, lng: f64) -> Report {
    Report {
        id: ReportId::from_u64(id),
        geocode: Some(Geocode { lat, lng }),
        reporter_name: "A".to_string(),
        reporter_phone: "6041234567".to_string(),
        emergency_type: EmergencyType::Fire,
        address: "X".to_string(),
        place_name: String::new(),
        picture_url: None,
        comments: None,
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        status: ReportStatus::Open,
    }
}

/// Storage whose reads and writes always fail.
pub struct FailingStorage;

#[async_trait::async_trait(?Send)]
impl StorageBackend for FailingStorage {
    async fn save(&self, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::QuotaExceeded)
    }

    async fn load(&self, _key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::IoError("disk unavailable".to_string()))
    }
}

/// Storage that returns a saved list but has no room for writes.
pub struct FullStorage {
    bytes: Vec<u8>,
}

impl FullStorage {
    pub fn holding(reports: &[Report]) -> Self {
        Self {
            bytes: serde_json::to_vec(reports).unwrap(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl StorageBackend for FullStorage {
    async fn save(&self, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::QuotaExceeded)
    }

    async fn load(&self, _key: &str) -> Result<Vec<u8>, StorageError> {
        Ok(self.bytes.clone())
    }
}

/// Geocoder with canned answers that counts its calls.
pub struct StubGeocoder {
    suggestions: Vec<Suggestion>,
    failure: Option<LookupError>,
    search_calls: Cell<usize>,
    reverse_calls: Cell<usize>,
}

impl StubGeocoder {
    /// Returns `count` suggestions for every search, ignoring the limit.
    /// The first one sits at (49.2, -122.9).
    pub fn with_suggestions(count: usize) -> Self {
        let suggestions = (0..count)
            .map(|i| Suggestion {
                display_name: format!("{} Royal Avenue, New Westminster", 100 + i),
                lat: 49.2 + i as f64 * 0.001,
                lon: -122.9,
            })
            .collect();
        Self {
            suggestions,
            failure: None,
            search_calls: Cell::new(0),
            reverse_calls: Cell::new(0),
        }
    }

    /// Fails every lookup with `error`.
    pub fn failing(error: LookupError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_suggestions(0)
        }
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.get()
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.get()
    }
}

#[async_trait::async_trait(?Send)]
impl Geocoder for StubGeocoder {
    async fn reverse(&self, _point: Geocode) -> Result<ReverseGeocode, LookupError> {
        self.reverse_calls.set(self.reverse_calls.get() + 1);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(ReverseGeocode {
            display_name: "511, Royal Avenue, Downtown, New Westminster, BC, Canada".to_string(),
            address: AddressDetails {
                house_number: Some("511".to_string()),
                road: Some("Royal Avenue".to_string()),
                city: Some("New Westminster".to_string()),
            },
        })
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Suggestion>, LookupError> {
        self.search_calls.set(self.search_calls.get() + 1);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.suggestions.clone())
    }
}
