//! # Flare Core
//!
//! Platform-independent library behind the Flare emergency report map.
//!
//! Users click a map, fill a form, and a list of emergency reports is kept
//! in durable local storage. Status changes, edits and deletions are gated
//! behind a shared passcode. This crate holds everything that is not map
//! rendering or DOM handling, so the same logic drives the browser shell and
//! the CLI.
//!
//! ## Modules
//!
//! - [`report`] - Report records, identifiers and status
//! - [`store`] - Write-through report store over a storage slot
//! - [`storage`] - Platform-agnostic key-value storage trait
//! - [`viewport`] - Bounding boxes, viewport filtering and readiness
//! - [`selection`] - Focused report tracking and reconciliation
//! - [`form`] - New-report validation and address prefill
//! - [`access`] - Passcode gate for privileged mutations
//! - [`geocoding`] - Reverse lookup and address search
//! - [`sort`] - Report table ordering
//! - [`session`] - UI-facing session wiring the components together
//! - [`config`] - Map and lookup configuration constants
//! - [`error`] - Error taxonomy

pub mod access;
pub mod config;
pub mod error;
pub mod form;
pub mod geocoding;
pub mod report;
pub mod selection;
pub mod session;
pub mod sort;
pub mod storage;
pub mod store;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use access::AccessGate;
pub use error::{AuthorizationError, LookupError, SessionError, StoreError, ValidationError};
pub use report::{EmergencyType, Geocode, Report, ReportId, ReportStatus};
pub use session::ReportSession;
pub use store::ReportStore;
pub use viewport::{BoundingBox, ViewportFilter};
