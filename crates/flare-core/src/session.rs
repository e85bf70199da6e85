//! UI-facing session.
//!
//! [`ReportSession`] owns one of each component and exposes what a frontend
//! renders (visible reports, focused id, pending form) plus the callbacks it
//! wires to buttons. After every store mutation and every viewport change
//! the session reconciles the selection and then recomputes the visible
//! list, in that order.
//!
//! Lookups are awaited inside `&mut self` calls, so a frontend that fires
//! several at once applies whichever finishes last. Lookup failures come back
//! to the caller: on the pending form for a map click, as
//! [`SessionError::Lookup`] everywhere else.

use crate::access::AccessGate;
use crate::config::DEFAULT_SUGGESTION_LIMIT;
use crate::error::{AuthorizationError, LookupError, SessionError, StoreError, ValidationError};
use crate::form::{ReportFormController, ReportInput};
use crate::geocoding::{self, Geocoder, Suggestion};
use crate::report::{Geocode, Report, ReportId, ReportStatus};
use crate::selection::{FocusTarget, SelectionTracker};
use crate::storage::StorageBackend;
use crate::store::ReportStore;
use crate::viewport::{BoundingBox, Viewport, ViewportFilter};
use tracing::{debug, info, warn};

/// A form opened by a map click (or a chosen suggestion), not yet submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReport {
    pub point: Geocode,
    pub input: ReportInput,
    /// Why the address could not be prefilled, for display next to the form
    pub lookup_error: Option<LookupError>,
}

pub struct ReportSession<S, G> {
    store: ReportStore<S>,
    geocoder: G,
    gate: Option<AccessGate>,
    form: ReportFormController,
    selection: SelectionTracker,
    viewport: Viewport,
    pending: Option<PendingReport>,
    visible: Vec<Report>,
}

impl<S: StorageBackend, G: Geocoder> ReportSession<S, G> {
    /// Creates a session over an opened store. Privileged actions are refused
    /// with [`AuthorizationError::NotConfigured`] until a gate is attached.
    pub fn new(store: ReportStore<S>, geocoder: G) -> Self {
        Self {
            store,
            geocoder,
            gate: None,
            form: ReportFormController::default(),
            selection: SelectionTracker::new(),
            viewport: Viewport::new(),
            pending: None,
            visible: Vec::new(),
        }
    }

    pub fn with_access_gate(mut self, gate: AccessGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_form(mut self, form: ReportFormController) -> Self {
        self.form = form;
        self
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Reports inside the current viewport, in store order. Empty until the
    /// viewport is ready.
    pub fn visible_reports(&self) -> &[Report] {
        &self.visible
    }

    pub fn focused_id(&self) -> Option<ReportId> {
        self.selection.focused()
    }

    /// Every report, regardless of viewport.
    pub fn reports(&self) -> &[Report] {
        self.store.reports()
    }

    pub fn store(&self) -> &ReportStore<S> {
        &self.store
    }

    /// Direct store access, e.g. to switch to memory-only mode after a
    /// persistence failure.
    pub fn store_mut(&mut self) -> &mut ReportStore<S> {
        &mut self.store
    }

    pub fn form(&self) -> &ReportFormController {
        &self.form
    }

    pub fn pending(&self) -> Option<&PendingReport> {
        self.pending.as_ref()
    }

    /// Editable access to the open form.
    pub fn pending_input_mut(&mut self) -> Option<&mut ReportInput> {
        self.pending.as_mut().map(|pending| &mut pending.input)
    }

    /// Map move/zoom (and the first ready event).
    pub fn set_bounds(&mut self, bounds: BoundingBox) {
        self.viewport.set_bounds(bounds);
        self.refresh();
    }

    /// Reconciles focus against the store, then recomputes the visible list.
    pub fn refresh(&mut self) {
        self.selection.reconcile(self.store.reports());
        self.visible = match self.viewport.bounds() {
            Some(bounds) => ViewportFilter::filter(self.store.reports(), &bounds),
            None => Vec::new(),
        };
        debug!(
            "{} of {} reports visible",
            self.visible.len(),
            self.store.len()
        );
    }

    /// Opens a pending form at `point` prefilled with its address.
    ///
    /// A failed lookup leaves the address empty and is kept in
    /// [`PendingReport::lookup_error`]; the user can still type an address.
    pub async fn handle_map_click(&mut self, point: Geocode) -> Result<&PendingReport, SessionError> {
        let point = Geocode::new(point.lat, point.lng)?;
        let mut input = ReportInput {
            geocode: Some(point),
            ..Default::default()
        };

        let lookup_error = match self.geocoder.reverse(point).await {
            Ok(lookup) => {
                self.form.apply_reverse_geocode(&mut input, point, &lookup);
                None
            }
            Err(e) => {
                warn!("Reverse lookup for {} failed: {}", point, e);
                Some(e)
            }
        };

        let pending = self.pending.insert(PendingReport {
            point,
            input,
            lookup_error,
        });
        Ok(&*pending)
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Address typeahead. Short queries yield nothing without a lookup.
    pub async fn suggest_addresses(&self, query: &str) -> Result<Vec<Suggestion>, LookupError> {
        geocoding::suggest(&self.geocoder, query, DEFAULT_SUGGESTION_LIMIT).await
    }

    /// Applies a chosen suggestion to the open form, opening one at the
    /// suggestion's coordinate if none is open.
    pub fn choose_suggestion(&mut self, suggestion: &Suggestion) -> Result<&PendingReport, ValidationError> {
        let point = suggestion.geocode().ok_or(ValidationError::InvalidCoordinate)?;
        let pending = self.pending.get_or_insert_with(|| PendingReport {
            point,
            input: ReportInput::default(),
            lookup_error: None,
        });
        self.form.apply_suggestion(&mut pending.input, suggestion);
        pending.point = point;
        pending.lookup_error = None;
        Ok(&*pending)
    }

    /// Validates and stores a new report, then focuses it.
    ///
    /// An input with an address but no coordinate is forward-geocoded. If
    /// that fails or finds nothing the submit is rejected with
    /// [`SessionError::Lookup`] and nothing is stored.
    pub async fn submit(&mut self, input: ReportInput) -> Result<Report, SessionError> {
        let mut report = self.form.validate(&input, self.store.next_id()?)?;

        if report.geocode.is_none() {
            report.geocode = Some(self.locate(&report.address).await?);
        }

        let report = self.store.add(report).await?;
        self.pending = None;
        self.selection.select(report.id);
        self.refresh();
        Ok(report)
    }

    /// Submits the open form. Returns `Ok(None)` when no form is open; on a
    /// validation or lookup error the form stays open for correction.
    pub async fn submit_pending(&mut self) -> Result<Option<Report>, SessionError> {
        let Some(pending) = &self.pending else {
            return Ok(None);
        };
        let input = pending.input.clone();
        self.submit(input).await.map(Some)
    }

    /// Focuses `id` and returns where the map should fly to, if anywhere.
    pub fn select(&mut self, id: ReportId) -> Option<FocusTarget> {
        self.selection.select(id);
        self.selection.focus_target(self.store.reports())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Marks `id` resolved. Requires the passcode.
    pub async fn resolve(&mut self, id: ReportId, passcode: &str) -> Result<Report, SessionError> {
        self.authorize(passcode)?;
        let report = self.store.set_status(id, ReportStatus::Resolved).await?;
        self.refresh();
        Ok(report)
    }

    /// The form for editing `id`, prefilled from the stored report. Requires
    /// the passcode, checked before the id is looked up.
    pub fn edit_form(&self, id: ReportId, passcode: &str) -> Result<ReportInput, SessionError> {
        self.authorize(passcode)?;
        let existing = self.store.get(id).ok_or(StoreError::NotFound(id))?;
        Ok(ReportInput::from_report(existing))
    }

    /// Replaces the editable fields of `id`. Requires the passcode.
    ///
    /// Clearing the coordinate re-locates the report from its address; if
    /// that lookup fails the report is left as it was.
    pub async fn modify(
        &mut self,
        id: ReportId,
        input: ReportInput,
        passcode: &str,
    ) -> Result<Report, SessionError> {
        self.authorize(passcode)?;
        let existing = self.store.get(id).cloned().ok_or(StoreError::NotFound(id))?;
        let mut report = self.form.apply_edit(&existing, &input)?;

        if report.geocode.is_none() {
            report.geocode = Some(self.locate(&report.address).await?);
        }

        let report = self.store.update(id, report).await?;
        self.refresh();
        Ok(report)
    }

    /// Deletes `id`. Requires the passcode.
    pub async fn delete(&mut self, id: ReportId, passcode: &str) -> Result<(), SessionError> {
        self.authorize(passcode)?;
        self.store.remove(id).await?;
        self.refresh();
        Ok(())
    }

    /// Deletes every report. Not passcode-gated.
    pub async fn clear_all(&mut self) -> Result<(), SessionError> {
        warn!("Clearing all {} reports without a passcode", self.store.len());
        self.store.clear().await?;
        self.refresh();
        Ok(())
    }

    fn authorize(&self, passcode: &str) -> Result<(), AuthorizationError> {
        match &self.gate {
            Some(gate) => gate.require(passcode),
            None => Err(AuthorizationError::NotConfigured),
        }
    }

    /// Forward-geocodes `address`. Finding nothing is [`LookupError::NoResult`].
    async fn locate(&self, address: &str) -> Result<Geocode, LookupError> {
        match geocoding::locate_address(&self.geocoder, address).await {
            Ok(Some(point)) => {
                info!("Located '{}' at {}", address, point);
                Ok(point)
            }
            Ok(None) => {
                warn!("No coordinate found for '{}'", address);
                Err(LookupError::NoResult(format!(
                    "Location not found: {}",
                    address.trim()
                )))
            }
            Err(e) => {
                warn!("Address lookup for '{}' failed: {}", address, e);
                Err(e)
            }
        }
    }
}
