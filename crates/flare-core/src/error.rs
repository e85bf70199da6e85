//! Error types for flare-core.
//!
//! Nothing here is fatal. Every error leaves the in-memory report list as it
//! was before the failed action, and each one maps to a user-visible message.

use crate::report::{ReportId, ReportStatus};
use crate::storage::StorageError;
use thiserror::Error;

/// Bad user input. The user corrects the form and resubmits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    /// Phone number does not match the configured format
    #[error("Invalid phone number format")]
    InvalidPhoneFormat,
    /// Latitude/longitude missing, non-finite or out of range
    #[error("Invalid coordinate")]
    InvalidCoordinate,
}

/// Geocoding service failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The request could not be built (bad base URL, bad parameters)
    #[error("Invalid lookup request: {0}")]
    InvalidRequest(String),
    /// Transport failure or non-success HTTP status
    #[error("Lookup request failed: {0}")]
    RequestFailed(String),
    /// The client-side timeout expired
    #[error("Lookup timed out")]
    Timeout,
    /// The service answered but the payload could not be used
    #[error("Invalid lookup response: {0}")]
    InvalidResponse(String),
    /// The service found nothing at the given location
    #[error("No result: {0}")]
    NoResult(String),
}

/// Report store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The mutation targeted an id that is not in the store
    #[error("Report not found: {0}")]
    NotFound(ReportId),
    /// Status changes are one-way (OPEN to RESOLVED)
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: ReportStatus, to: ReportStatus },
    /// Every id up to `u64::MAX` is taken
    #[error("No report ids left")]
    IdsExhausted,
    /// The write-through to storage failed; in-memory state was rolled back
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Wrong passcode for a gated action. Not fatal; the user may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("Incorrect passcode")]
    Rejected,
    #[error("No passcode has been configured for privileged actions")]
    NotConfigured,
}

/// Invalid startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid passcode digest: {0}")]
    InvalidPasscodeDigest(String),
    #[error("Unknown phone format: {0}")]
    UnknownPhoneFormat(String),
}

/// Any failure surfaced by a [`ReportSession`](crate::session::ReportSession) action.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}

impl SessionError {
    /// Returns true when the error came from a mutation aimed at a missing id.
    ///
    /// The UI should refresh from the store in that case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::Store(StoreError::NotFound(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            ValidationError::MissingField("reporterName").to_string(),
            "Missing required field: reporterName"
        );
        assert_eq!(AuthorizationError::Rejected.to_string(), "Incorrect passcode");
        assert_eq!(
            StoreError::NotFound(ReportId::from_u64(7)).to_string(),
            "Report not found: 7"
        );
    }

    #[test]
    fn test_session_error_not_found() {
        let err: SessionError = StoreError::NotFound(ReportId::from_u64(1)).into();
        assert!(err.is_not_found());

        let err: SessionError = AuthorizationError::Rejected.into();
        assert!(!err.is_not_found());
    }
}
