//! Report records and their identifiers.
//!
//! A [`Report`] is the only persisted entity. Field names serialize in
//! camelCase so the stored JSON matches what the browser shell writes.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unique report identifier.
///
/// Assigned by the [`ReportStore`](crate::store::ReportStore) as
/// `max(existing) + 1`. Use `ReportId::from_u64` only for lookups or tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(u64);

impl ReportId {
    /// Creates a ReportId from a raw u64 value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one, or `None` past `u64::MAX`.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geocode {
    pub lat: f64,
    pub lng: f64,
}

impl Geocode {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(ValidationError::InvalidCoordinate)
        }
    }

    /// True when both components are finite and within
    /// `-90 <= lat <= 90`, `-180 <= lng <= 180`.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Geocode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Report lifecycle status. The only transition is OPEN -> RESOLVED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    Open,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "OPEN",
            ReportStatus::Resolved => "RESOLVED",
        }
    }

    /// Whether moving from `self` to `to` is allowed. Same-state moves are
    /// allowed so repeated resolves stay idempotent.
    pub fn can_transition_to(&self, to: ReportStatus) -> bool {
        !matches!((self, to), (ReportStatus::Resolved, ReportStatus::Open))
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nature of the emergency.
///
/// The form offers a fixed list; anything else is kept verbatim as
/// [`EmergencyType::Other`]. Serialized as its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmergencyType {
    Fire,
    Shooting,
    VehicleAccident,
    Medical,
    Other(String),
}

impl EmergencyType {
    /// Labels offered by the report form, in display order.
    pub const KNOWN: [EmergencyType; 4] = [
        EmergencyType::Fire,
        EmergencyType::Shooting,
        EmergencyType::VehicleAccident,
        EmergencyType::Medical,
    ];

    /// Parses a label. Known labels match case-insensitively; anything else
    /// becomes `Other` with surrounding whitespace trimmed.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        Self::KNOWN
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| EmergencyType::Other(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            EmergencyType::Fire => "Fire",
            EmergencyType::Shooting => "Shooting",
            EmergencyType::VehicleAccident => "Vehicle Accident",
            EmergencyType::Medical => "Medical",
            EmergencyType::Other(label) => label,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for EmergencyType {
    fn from(label: String) -> Self {
        EmergencyType::parse(&label)
    }
}

impl From<EmergencyType> for String {
    fn from(kind: EmergencyType) -> Self {
        match kind {
            EmergencyType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single emergency incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    /// Marker position. Reports without a usable geocode are never visible
    /// in a viewport.
    #[serde(default, deserialize_with = "deserialize_geocode")]
    pub geocode: Option<Geocode>,
    pub reporter_name: String,
    pub reporter_phone: String,
    pub emergency_type: EmergencyType,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: ReportStatus,
}

impl Report {
    /// Returns the marker position if the geocode is present and valid.
    pub fn position(&self) -> Option<Geocode> {
        self.geocode.filter(Geocode::is_valid)
    }

    pub fn is_open(&self) -> bool {
        self.status == ReportStatus::Open
    }

    /// One-line label used by lists and marker tooltips.
    pub fn label(&self) -> String {
        let location = if !self.address.is_empty() {
            self.address.as_str()
        } else if !self.place_name.is_empty() {
            self.place_name.as_str()
        } else {
            "unknown location"
        };
        format!("{} at {}", self.emergency_type, location)
    }
}

/// Raw geocode as found in storage. Components written as `null` (non-finite
/// numbers serialize that way) turn the whole geocode into `None` instead of
/// failing the record.
#[derive(Deserialize)]
struct RawGeocode {
    lat: Option<f64>,
    lng: Option<f64>,
}

fn deserialize_geocode<'de, D>(deserializer: D) -> Result<Option<Geocode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawGeocode>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match (raw.lat, raw.lng) {
        (Some(lat), Some(lng)) => Some(Geocode { lat, lng }),
        _ => None,
    }))
}
