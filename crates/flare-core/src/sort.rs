//! Report table ordering.
//!
//! Text columns compare case-insensitively. Ties fall back to id order so
//! the result is stable across calls.

use crate::report::Report;
use std::cmp::Ordering;
use std::str::FromStr;

/// Column to order the report table by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Id,
    EmergencyType,
    ReporterName,
    Address,
    Status,
    Timestamp,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "type" | "emergency-type" => Ok(SortKey::EmergencyType),
            "reporter" | "name" => Ok(SortKey::ReporterName),
            "address" => Ok(SortKey::Address),
            "status" => Ok(SortKey::Status),
            "time" | "timestamp" => Ok(SortKey::Timestamp),
            other => Err(format!(
                "unknown sort key '{}' (expected id, type, reporter, address, status or time)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare(a: &Report, b: &Report, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Id => Ordering::Equal,
        SortKey::EmergencyType => compare_text(a.emergency_type.as_str(), b.emergency_type.as_str()),
        SortKey::ReporterName => compare_text(&a.reporter_name, &b.reporter_name),
        SortKey::Address => compare_text(&a.address, &b.address),
        SortKey::Status => a.status.cmp(&b.status),
        SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Sorts `reports` in place.
pub fn sort_reports(reports: &mut [Report], key: SortKey, order: SortOrder) {
    reports.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// Sorted copy of `reports`.
pub fn sorted(reports: &[Report], key: SortKey, order: SortOrder) -> Vec<Report> {
    let mut reports = reports.to_vec();
    sort_reports(&mut reports, key, order);
    reports
}
