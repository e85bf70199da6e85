//! Output formatting for command results.
//!
//! Supports both human-readable terminal output and JSON for scripting.
//! JSON reports use the same camelCase layout as the report file.

use flare_core::geocoding::{ReverseGeocode, Suggestion};
use flare_core::selection::FocusTarget;
use flare_core::{Report, ReportId};
use serde::Serialize;

/// Maximum characters of free text shown per table row
const COMMENT_MAX_LEN: usize = 60;

/// Result of one CLI command.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutput {
    Reports {
        reports: Vec<Report>,
        focused: Option<ReportId>,
    },
    Report {
        report: Report,
    },
    Focus {
        id: ReportId,
        target: Option<FocusTarget>,
    },
    Suggestions {
        query: String,
        suggestions: Vec<Suggestion>,
    },
    Address {
        lookup: ReverseGeocode,
        short_address: String,
    },
    Deleted {
        id: ReportId,
    },
    Cleared {
        count: usize,
    },
}

/// Formats a command result as JSON.
pub fn format_json(output: &CommandOutput) -> String {
    serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a command result for human-readable terminal output.
pub fn format_human(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Reports { reports, focused } => format_table(reports, *focused),
        CommandOutput::Report { report } => format_report(report),
        CommandOutput::Focus { id, target } => match target {
            Some(target) => format!(
                "Focused report {}: fly to {} at zoom {}",
                id, target.center, target.zoom
            ),
            None => format!("Focused report {} (no map position)", id),
        },
        CommandOutput::Suggestions { query, suggestions } => {
            if suggestions.is_empty() {
                return format!("No suggestions for \"{}\"", query);
            }
            suggestions
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {} ({:.6}, {:.6})", i + 1, s.display_name, s.lat, s.lon))
                .collect::<Vec<_>>()
                .join("\n")
        }
        CommandOutput::Address {
            lookup,
            short_address,
        } => format!("{}\n   {}", short_address, lookup.display_name),
        CommandOutput::Deleted { id } => format!("Deleted report {}", id),
        CommandOutput::Cleared { count } => format!(
            "Cleared {} report{}",
            count,
            if *count == 1 { "" } else { "s" }
        ),
    }
}

fn format_table(reports: &[Report], focused: Option<ReportId>) -> String {
    if reports.is_empty() {
        return "No reports".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{} report{}:\n\n",
        reports.len(),
        if reports.len() == 1 { "" } else { "s" }
    ));

    for report in reports {
        let marker = if Some(report.id) == focused { "*" } else { " " };
        output.push_str(&format!(
            "{}{:>4}  {:<8}  {:<18}  {:<16}  {}\n",
            marker,
            report.id.as_u64(),
            report.status.as_str(),
            truncate_text(report.emergency_type.as_str(), 18),
            report.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            truncate_text(&location(report), COMMENT_MAX_LEN),
        ));
    }

    output.trim_end().to_string()
}

fn format_report(report: &Report) -> String {
    let mut lines = vec![
        format!("Report {} [{}]", report.id, report.status),
        format!("   Type:     {}", report.emergency_type),
        format!("   Reporter: {} ({})", report.reporter_name, report.reporter_phone),
        format!("   Location: {}", location(report)),
    ];
    if let Some(point) = report.position() {
        lines.push(format!("   Geocode:  {}", point));
    }
    if !report.place_name.is_empty() && !report.address.is_empty() {
        lines.push(format!("   Place:    {}", report.place_name));
    }
    if let Some(url) = &report.picture_url {
        lines.push(format!("   Picture:  {}", url));
    }
    if let Some(comments) = &report.comments {
        lines.push(format!("   Comments: {}", comments));
    }
    lines.push(format!("   Reported: {}", report.timestamp.to_rfc3339()));
    lines.join("\n")
}

fn location(report: &Report) -> String {
    if !report.address.is_empty() {
        report.address.clone()
    } else if !report.place_name.is_empty() {
        report.place_name.clone()
    } else {
        report
            .position()
            .map(|point| point.to_string())
            .unwrap_or_else(|| "unknown location".to_string())
    }
}

/// Truncates text to a maximum number of characters, adding ellipsis if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len).collect();
        format!("{}...", truncated.trim_end())
    }
}
