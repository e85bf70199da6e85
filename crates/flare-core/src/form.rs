//! New-report form handling.
//!
//! [`ReportInput`] is the raw, editable form state. The
//! [`ReportFormController`] turns it into a [`Report`] or explains why it
//! cannot, and prefills it from lookups.

use crate::error::{ConfigError, ValidationError};
use crate::geocoding::{ReverseGeocode, Suggestion};
use crate::report::{EmergencyType, Geocode, Report, ReportId, ReportStatus};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

static TEN_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{10}$").expect("Invalid phone pattern"));

static NORTH_AMERICAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\d{3}\) \d{3} \d{4}$").expect("Invalid phone pattern"));

/// Accepted shape of the reporter phone number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhoneFormat {
    /// `6041234567`
    #[default]
    TenDigits,
    /// `(604) 123 4567`
    NorthAmerican,
}

impl PhoneFormat {
    pub fn matches(&self, phone: &str) -> bool {
        match self {
            PhoneFormat::TenDigits => TEN_DIGITS.is_match(phone),
            PhoneFormat::NorthAmerican => NORTH_AMERICAN.is_match(phone),
        }
    }

    /// Progressive input mask: strips non-digits and renders what is there
    /// as `(604) 123 4567`, dropping digits past the tenth.
    ///
    /// ```
    /// use flare_core::form::PhoneFormat;
    ///
    /// assert_eq!(PhoneFormat::mask("60"), "(60");
    /// assert_eq!(PhoneFormat::mask("604-123-4567"), "(604) 123 4567");
    /// ```
    pub fn mask(raw: &str) -> String {
        let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).take(10).collect();
        let segment = |from: usize, to: usize| -> String {
            digits[from.min(digits.len())..to.min(digits.len())]
                .iter()
                .collect()
        };

        let mut masked = String::with_capacity(14);
        if !digits.is_empty() {
            masked.push('(');
            masked.push_str(&segment(0, 3));
        }
        if digits.len() >= 3 {
            masked.push_str(") ");
            masked.push_str(&segment(3, 6));
        }
        if digits.len() >= 6 {
            masked.push(' ');
            masked.push_str(&segment(6, 10));
        }
        masked
    }

    /// Renders `phone` in this format when it holds exactly ten digits,
    /// otherwise returns it unchanged.
    pub fn normalize(&self, phone: &str) -> String {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != 10 {
            return phone.to_string();
        }
        match self {
            PhoneFormat::TenDigits => digits,
            PhoneFormat::NorthAmerican => Self::mask(&digits),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneFormat::TenDigits => "ten-digits",
            PhoneFormat::NorthAmerican => "north-american",
        }
    }
}

impl FromStr for PhoneFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ten-digits" | "digits" => Ok(PhoneFormat::TenDigits),
            "north-american" | "nanp" => Ok(PhoneFormat::NorthAmerican),
            other => Err(ConfigError::UnknownPhoneFormat(other.to_string())),
        }
    }
}

/// Editable form state for a new or modified report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportInput {
    pub reporter_name: String,
    pub reporter_phone: String,
    pub emergency_type: String,
    pub address: String,
    pub place_name: String,
    pub picture_url: String,
    pub comments: String,
    pub geocode: Option<Geocode>,
}

impl ReportInput {
    /// Form state for editing an existing report.
    pub fn from_report(report: &Report) -> Self {
        Self {
            reporter_name: report.reporter_name.clone(),
            reporter_phone: report.reporter_phone.clone(),
            emergency_type: report.emergency_type.to_string(),
            address: report.address.clone(),
            place_name: report.place_name.clone(),
            picture_url: report.picture_url.clone().unwrap_or_default(),
            comments: report.comments.clone().unwrap_or_default(),
            geocode: report.geocode,
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct ReportFormController {
    phone_format: PhoneFormat,
}

impl ReportFormController {
    pub fn new(phone_format: PhoneFormat) -> Self {
        Self { phone_format }
    }

    pub fn phone_format(&self) -> PhoneFormat {
        self.phone_format
    }

    /// Validates `input` and builds an OPEN report stamped with the current
    /// time and `next_id`.
    ///
    /// Checks run in form order and the first failure is returned: name,
    /// phone, phone format, emergency type, then location. A geocode that is
    /// present must be valid even when an address is given.
    pub fn validate(&self, input: &ReportInput, next_id: ReportId) -> Result<Report, ValidationError> {
        let fields = self.check(input)?;
        Ok(Report {
            id: next_id,
            status: ReportStatus::Open,
            timestamp: Utc::now(),
            ..fields
        })
    }

    /// Applies an edit to `existing`, keeping its id, timestamp and status.
    pub fn apply_edit(&self, existing: &Report, input: &ReportInput) -> Result<Report, ValidationError> {
        let fields = self.check(input)?;
        Ok(Report {
            id: existing.id,
            status: existing.status,
            timestamp: existing.timestamp,
            ..fields
        })
    }

    /// Copies a chosen search suggestion into the form.
    pub fn apply_suggestion(&self, input: &mut ReportInput, suggestion: &Suggestion) {
        input.address = suggestion.display_name.clone();
        if let Some(point) = suggestion.geocode() {
            input.geocode = Some(point);
        }
    }

    /// Prefills the form from a map click and its reverse lookup.
    pub fn apply_reverse_geocode(&self, input: &mut ReportInput, point: Geocode, lookup: &ReverseGeocode) {
        input.geocode = Some(point);
        input.address = lookup.short_address();
    }

    fn check(&self, input: &ReportInput) -> Result<Report, ValidationError> {
        let reporter_name = input.reporter_name.trim();
        if reporter_name.is_empty() {
            return Err(ValidationError::MissingField("reporterName"));
        }

        let reporter_phone = input.reporter_phone.trim();
        if reporter_phone.is_empty() {
            return Err(ValidationError::MissingField("reporterPhone"));
        }
        if !self.phone_format.matches(reporter_phone) {
            return Err(ValidationError::InvalidPhoneFormat);
        }

        let emergency_type = EmergencyType::parse(&input.emergency_type);
        if emergency_type.is_empty() {
            return Err(ValidationError::MissingField("emergencyType"));
        }

        if let Some(point) = input.geocode {
            if !point.is_valid() {
                return Err(ValidationError::InvalidCoordinate);
            }
        }
        let address = input.address.trim();
        if address.is_empty() && input.geocode.is_none() {
            return Err(ValidationError::MissingField("address"));
        }

        Ok(Report {
            id: ReportId::from_u64(0),
            geocode: input.geocode,
            reporter_name: reporter_name.to_string(),
            reporter_phone: reporter_phone.to_string(),
            emergency_type,
            address: address.to_string(),
            place_name: input.place_name.trim().to_string(),
            picture_url: optional(&input.picture_url),
            comments: optional(&input.comments),
            timestamp: Utc::now(),
            status: ReportStatus::Open,
        })
    }
}
