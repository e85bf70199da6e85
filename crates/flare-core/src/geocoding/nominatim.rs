//! Nominatim (OpenStreetMap) geocoding over HTTP.
//!
//! Wraps reqwest with a client-side timeout and the user agent Nominatim's
//! usage policy asks for. The client pools connections internally, so one
//! `NominatimGeocoder` should be reused for the whole session.

use super::{AddressDetails, Geocoder, ReverseGeocode, Suggestion};
use crate::config::{LOOKUP_TIMEOUT_SECS, NOMINATIM_BASE_URL, USER_AGENT};
use crate::error::LookupError;
use crate::report::Geocode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Connection settings for [`NominatimGeocoder`].
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Service root, e.g. `https://nominatim.openstreetmap.org`
    pub base_url: String,
    /// Per-request timeout; expiry maps to [`LookupError::Timeout`]
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: NOMINATIM_BASE_URL.to_string(),
            timeout: Duration::from_secs(LOOKUP_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// `/reverse?format=jsonv2` payload. Failed lookups come back as
/// `{"error": "..."}` with a 200 status.
#[derive(Deserialize)]
struct RawReverse {
    display_name: Option<String>,
    #[serde(default)]
    address: Option<AddressDetails>,
    error: Option<String>,
}

/// `/search?format=json` entry. Coordinates are strings on the wire.
#[derive(Deserialize)]
struct RawPlace {
    display_name: String,
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: Url,
}

impl NominatimGeocoder {
    pub fn new(config: NominatimConfig) -> Result<Self, LookupError> {
        // Url::join replaces the last segment unless the base ends with '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| LookupError::InvalidRequest(format!("{}: {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LookupError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, LookupError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| LookupError::InvalidRequest(format!("{}: {}", path, e)))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LookupError> {
        debug!("Geocoding request: {}", url);

        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::RequestFailed(format!("HTTP {}", status)));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::InvalidResponse(e.to_string())
            }
        })
    }
}

fn classify(e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::RequestFailed(e.to_string())
    }
}

#[async_trait::async_trait(?Send)]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, point: Geocode) -> Result<ReverseGeocode, LookupError> {
        if !point.is_valid() {
            return Err(LookupError::InvalidRequest(format!(
                "coordinate out of range: {}",
                point
            )));
        }

        let url = self.endpoint(
            "reverse",
            &[
                ("format", "jsonv2".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
            ],
        )?;
        let raw: RawReverse = self.get_json(url).await?;

        if let Some(error) = raw.error {
            return Err(LookupError::NoResult(error));
        }
        let display_name = raw
            .display_name
            .ok_or_else(|| LookupError::InvalidResponse("missing display_name".to_string()))?;

        Ok(ReverseGeocode {
            display_name,
            address: raw.address.unwrap_or_default(),
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, LookupError> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.endpoint(
            "search",
            &[
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("limit", limit.to_string()),
                ("q", query.to_string()),
            ],
        )?;
        let places: Vec<RawPlace> = self.get_json(url).await?;

        Ok(places
            .into_iter()
            .filter_map(|place| match (place.lat.parse(), place.lon.parse()) {
                (Ok(lat), Ok(lon)) => Some(Suggestion {
                    display_name: place.display_name,
                    lat,
                    lon,
                }),
                _ => {
                    debug!("Skipping place with unparseable coordinates: {}", place.display_name);
                    None
                }
            })
            .take(limit)
            .collect())
    }
}
