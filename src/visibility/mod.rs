//! Viewport visibility latches
//!
//! A [`VisibilityTracker`] reports once that its element entered the viewport,
//! either already at mount or through an intersection notification delivered
//! by the host's [`ObservationPlatform`]. Hosts without a native primitive can
//! use [`HeadlessViewport`].

mod geometry;
mod headless;
mod platform;
mod subscription;
mod tracker;

pub use geometry::{intersection_ratio, ElementBounds};
pub use headless::HeadlessViewport;
pub use platform::{
    ElementId, IntersectionEntry, ObservationId, ObservationPlatform, ObserverOptions,
    VisibilityThreshold, ROOT_MARGIN_PX,
};
pub use subscription::{subscribe, VisibilitySubscription};
pub use tracker::{ObserverStatus, Visibility, VisibilityTracker};
