//! Focused report tracking.
//!
//! The focused id is highlighted in the table and on the map. It must be
//! reconciled after every store mutation so the UI never points at a report
//! that has been deleted.

use crate::config::FOCUS_ZOOM;
use crate::report::{Geocode, Report, ReportId};
use serde::Serialize;
use tracing::debug;

/// Where the view layer should fly to when focus changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusTarget {
    pub id: ReportId,
    pub center: Geocode,
    pub zoom: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    focused: Option<ReportId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<ReportId> {
        self.focused
    }

    /// Focuses `id`. Existence is not checked; an unknown id just highlights
    /// nothing until it is reconciled away.
    pub fn select(&mut self, id: ReportId) {
        self.focused = Some(id);
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    /// Clears focus if the focused id is no longer in `reports`.
    ///
    /// Returns true when focus was cleared.
    pub fn reconcile(&mut self, reports: &[Report]) -> bool {
        match self.focused {
            Some(id) if !reports.iter().any(|r| r.id == id) => {
                debug!("Focused report {} is gone, clearing focus", id);
                self.focused = None;
                true
            }
            _ => false,
        }
    }

    /// The re-center target for the focused report, if it exists and has a
    /// usable position.
    pub fn focus_target(&self, reports: &[Report]) -> Option<FocusTarget> {
        let id = self.focused?;
        let report = reports.iter().find(|r| r.id == id)?;
        Some(FocusTarget {
            id,
            center: report.position()?,
            zoom: FOCUS_ZOOM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_report;

    #[test]
    fn test_select_unknown_id_is_allowed() {
        let mut selection = SelectionTracker::new();
        selection.select(ReportId::from_u64(42));

        assert_eq!(selection.focused(), Some(ReportId::from_u64(42)));
        assert_eq!(selection.focus_target(&[]), None);
    }

    #[test]
    fn test_reconcile_clears_removed_focus() {
        let mut reports = vec![
            sample_report(1, 49.25, -122.9),
            sample_report(2, 49.3, -122.8),
        ];
        let mut selection = SelectionTracker::new();
        selection.select(ReportId::from_u64(2));

        assert!(!selection.reconcile(&reports));
        assert_eq!(selection.focused(), Some(ReportId::from_u64(2)));

        reports.retain(|r| r.id != ReportId::from_u64(2));
        assert!(selection.reconcile(&reports));
        assert_eq!(selection.focused(), None);
    }

    #[test]
    fn test_reconcile_without_focus_is_noop() {
        let mut selection = SelectionTracker::new();
        assert!(!selection.reconcile(&[]));
        assert_eq!(selection.focused(), None);
    }

    #[test]
    fn test_focus_target_uses_focus_zoom() {
        let reports = vec![sample_report(1, 49.25, -122.9)];
        let mut selection = SelectionTracker::new();
        selection.select(ReportId::from_u64(1));

        let target = selection.focus_target(&reports).unwrap();
        assert_eq!(target.center, Geocode { lat: 49.25, lng: -122.9 });
        assert_eq!(target.zoom, FOCUS_ZOOM);
    }

    #[test]
    fn test_focus_target_skips_reports_without_position() {
        let mut report = sample_report(1, 49.25, -122.9);
        report.geocode = None;
        let mut selection = SelectionTracker::new();
        selection.select(report.id);

        assert_eq!(selection.focus_target(&[report]), None);
    }
}
