//! Viewport bounds, visibility filtering and map readiness.
//!
//! [`ViewportFilter::filter`] is the pure function the UI calls after every
//! bounds change and every store mutation. A linear scan per call is the
//! reference behavior; report lists are small.
//!
//! [`Viewport`] holds the bounds reported by the map widget. The widget
//! calls [`Viewport::set_bounds`] once it has a handle (its "ready" event)
//! and on every move/zoom; consumers await [`Viewport::ready`] instead of
//! polling for the map.

use crate::error::ValidationError;
use crate::report::{Geocode, Report};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::watch;
use tracing::debug;

/// Geographic rectangle, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Creates a well-formed box: finite, in range, `south <= north`,
    /// `west <= east`. Degenerate (zero-area) boxes are allowed here and
    /// simply contain nothing.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, ValidationError> {
        let corners = [Geocode::new(south, west)?, Geocode::new(north, east)?];
        if corners[0].lat > corners[1].lat || corners[0].lng > corners[1].lng {
            return Err(ValidationError::InvalidCoordinate);
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// True when the box spans no area (or is inverted or non-finite).
    pub fn is_zero_area(&self) -> bool {
        !(self.south < self.north && self.west < self.east)
    }

    /// Whether `point` is a valid coordinate inside the box, edges included.
    pub fn contains(&self, point: Geocode) -> bool {
        !self.is_zero_area()
            && point.is_valid()
            && point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    pub fn center(&self) -> Geocode {
        Geocode {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }
}

/// Parses `"south,west,north,east"`.
impl FromStr for BoundingBox {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ValidationError::InvalidCoordinate)?;

        match parts.as_slice() {
            [south, west, north, east] => Self::new(*south, *west, *north, *east),
            _ => Err(ValidationError::InvalidCoordinate),
        }
    }
}

/// Selects the reports visible in a viewport.
pub struct ViewportFilter;

impl ViewportFilter {
    /// Returns the reports whose geocode is present, valid and inside
    /// `bounds`, preserving input order.
    ///
    /// Empty input or zero-area bounds yield an empty list.
    pub fn filter(reports: &[Report], bounds: &BoundingBox) -> Vec<Report> {
        if bounds.is_zero_area() {
            return Vec::new();
        }
        reports
            .iter()
            .filter(|report| report.geocode.is_some_and(|point| bounds.contains(point)))
            .cloned()
            .collect()
    }
}

/// Current map viewport with an explicit ready notification.
///
/// Bounds are `None` until the map widget reports its first viewport.
pub struct Viewport {
    bounds: watch::Sender<Option<BoundingBox>>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        let (bounds, _) = watch::channel(None);
        Self { bounds }
    }

    /// Records the current bounds. The first call marks the viewport ready.
    pub fn set_bounds(&self, bounds: BoundingBox) {
        let previous = self.bounds.send_replace(Some(bounds));
        if previous.is_none() {
            debug!("Viewport ready: {:?}", bounds);
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        *self.bounds.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.bounds.borrow().is_some()
    }

    /// Waits until the map widget has reported bounds, then returns them.
    pub async fn ready(&self) -> BoundingBox {
        let mut rx = self.bounds.subscribe();
        loop {
            if let Some(bounds) = *rx.borrow_and_update() {
                return bounds;
            }
            // The sender lives in `self`, so `changed` cannot fail while we wait
            let _ = rx.changed().await;
        }
    }

    /// Subscribes to bounds changes (move/zoom events).
    pub fn subscribe(&self) -> watch::Receiver<Option<BoundingBox>> {
        self.bounds.subscribe()
    }
}
