//! Reverse lookup and address search.
//!
//! The core never talks to a geocoding service directly. Frontends hand the
//! session a [`Geocoder`]; [`NominatimGeocoder`] is the HTTP implementation
//! used on desktop.
//!
//! Lookups are the only suspension points in a session. They may resolve out
//! of order; whichever result is applied last wins. A failed or timed-out
//! lookup is never fatal, but it is returned to the caller so the UI can say
//! why no address or suggestion appeared.

#[cfg(not(target_arch = "wasm32"))]
mod nominatim;

#[cfg(not(target_arch = "wasm32"))]
pub use nominatim::{NominatimConfig, NominatimGeocoder};

use crate::config::MIN_SUGGESTION_QUERY_CHARS;
use crate::error::LookupError;
use crate::report::Geocode;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Structured address breakdown from a reverse lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Result of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseGeocode {
    /// Preformatted, comma-separated address
    pub display_name: String,
    #[serde(default)]
    pub address: AddressDetails,
}

impl ReverseGeocode {
    /// Short address for prefilling the form.
    ///
    /// Keeps the first two comma-separated parts of the display name, or
    /// three when the point resolved to a house number (the number is the
    /// first part then).
    pub fn short_address(&self) -> String {
        let parts = if self.address.house_number.is_some() { 3 } else { 2 };
        self.display_name
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .take(parts)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A candidate from an address search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Suggestion {
    /// The suggestion's coordinate, if valid.
    pub fn geocode(&self) -> Option<Geocode> {
        Geocode::new(self.lat, self.lon).ok()
    }
}

/// Geocoding service.
#[async_trait::async_trait(?Send)]
pub trait Geocoder {
    /// Resolves a coordinate to a human-readable address.
    async fn reverse(&self, point: Geocode) -> Result<ReverseGeocode, LookupError>;

    /// Returns up to `limit` candidates for a free-text query.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, LookupError>;
}

/// Typeahead suggestions for `query`.
///
/// Queries shorter than [`MIN_SUGGESTION_QUERY_CHARS`] return nothing
/// without a lookup.
pub async fn suggest<G: Geocoder + ?Sized>(
    geocoder: &G,
    query: &str,
    limit: usize,
) -> Result<Vec<Suggestion>, LookupError> {
    let query = query.trim();
    if query.chars().count() < MIN_SUGGESTION_QUERY_CHARS {
        return Ok(Vec::new());
    }

    let mut suggestions = geocoder.search(query, limit).await.map_err(|e| {
        warn!("Address suggestions unavailable: {}", e);
        e
    })?;
    suggestions.truncate(limit);
    Ok(suggestions)
}

/// Resolves a typed address to a coordinate using the best search match.
///
/// Returns `Ok(None)` when nothing matched.
pub async fn locate_address<G: Geocoder + ?Sized>(
    geocoder: &G,
    address: &str,
) -> Result<Option<Geocode>, LookupError> {
    let address = address.trim();
    if address.is_empty() {
        return Ok(None);
    }
    let matches = geocoder.search(address, 1).await?;
    Ok(matches.iter().find_map(Suggestion::geocode))
}
