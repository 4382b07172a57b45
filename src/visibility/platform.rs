//! The seam between trackers and the host's intersection-observation primitive

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use super::geometry::ElementBounds;
use crate::error::{ForkfulError, Result};

/// Root margin applied to every observation so near-viewport elements count early
pub const ROOT_MARGIN_PX: f64 = 50.0;

const DEFAULT_THRESHOLD: f64 = 0.1;

/// Opaque handle to a renderable region owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Handle to one registration with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationId(pub u64);

/// Minimum intersecting-area ratio, within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct VisibilityThreshold(f64);

impl VisibilityThreshold {
    pub fn new(ratio: f64) -> Result<Self> {
        if ratio.is_nan() || !(0.0..=1.0).contains(&ratio) {
            return Err(ForkfulError::InvalidThreshold(ratio));
        }
        Ok(Self(ratio))
    }

    pub fn ratio(&self) -> f64 {
        self.0
    }
}

impl Default for VisibilityThreshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for VisibilityThreshold {
    type Error = ForkfulError;

    fn try_from(ratio: f64) -> Result<Self> {
        Self::new(ratio)
    }
}

impl From<VisibilityThreshold> for f64 {
    fn from(threshold: VisibilityThreshold) -> Self {
        threshold.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    pub threshold: VisibilityThreshold,
    pub root_margin_px: f64,
}

impl ObserverOptions {
    pub fn with_threshold(threshold: VisibilityThreshold) -> Self {
        Self {
            threshold,
            root_margin_px: ROOT_MARGIN_PX,
        }
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self::with_threshold(VisibilityThreshold::default())
    }
}

/// One intersection notification for an observed element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub element: ElementId,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

/// Host-provided viewport observation.
///
/// Implementations deliver [`IntersectionEntry`] values through the sender
/// handed to [`observe`](ObservationPlatform::observe) until the matching
/// [`unobserve`](ObservationPlatform::unobserve). Hosts without an
/// observation primitive return [`ForkfulError::ObserverUnavailable`].
pub trait ObservationPlatform {
    fn viewport_height(&self) -> f64;

    /// Element box relative to the viewport's top-left corner.
    fn bounding_rect(&self, element: ElementId) -> Option<ElementBounds>;

    fn observe(
        &self,
        element: ElementId,
        options: ObserverOptions,
        sink: Sender<IntersectionEntry>,
    ) -> Result<ObservationId>;

    fn unobserve(&self, observation: ObservationId);
}
