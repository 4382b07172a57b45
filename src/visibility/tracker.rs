use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

use super::platform::{
    ElementId, IntersectionEntry, ObservationId, ObservationPlatform, ObserverOptions,
    VisibilityThreshold,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    /// Terminal; never reverts to `Hidden`
    Visible,
}

/// What the tracker currently holds from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverStatus {
    Observing,
    Released,
    /// The host has no observation primitive; the element stays `Hidden`
    Unavailable,
}

struct Registration {
    id: ObservationId,
    rx: Receiver<IntersectionEntry>,
}

/// One-shot visibility latch for a single element.
///
/// Observation is acquired in [`attach`](Self::attach) and released as soon as
/// the element latches visible, on [`detach`](Self::detach), or on drop.
pub struct VisibilityTracker {
    platform: Rc<dyn ObservationPlatform>,
    element: ElementId,
    threshold: VisibilityThreshold,
    state: Visibility,
    registration: Option<Registration>,
    unavailable: bool,
    detached: bool,
}

impl VisibilityTracker {
    pub fn attach(
        platform: Rc<dyn ObservationPlatform>,
        element: ElementId,
        threshold: VisibilityThreshold,
    ) -> Self {
        let mut tracker = Self {
            platform,
            element,
            threshold,
            state: Visibility::Hidden,
            registration: None,
            unavailable: false,
            detached: false,
        };
        tracker.start();
        tracker
    }

    /// Attach with the default 0.1 threshold.
    pub fn attach_default(platform: Rc<dyn ObservationPlatform>, element: ElementId) -> Self {
        Self::attach(platform, element, VisibilityThreshold::default())
    }

    fn start(&mut self) {
        let (tx, rx) = channel();
        let options = ObserverOptions::with_threshold(self.threshold);
        match self.platform.observe(self.element, options, tx) {
            Ok(id) => {
                tracing::trace!("Observing {:?} as {:?}", self.element, id);
                self.registration = Some(Registration { id, rx });
                self.unavailable = false;
            }
            Err(e) => {
                tracing::warn!("Visibility tracking disabled for {:?}: {}", self.element, e);
                self.unavailable = true;
                return;
            }
        }

        // Already on screen at mount: latch before any notification arrives
        let on_screen = self
            .platform
            .bounding_rect(self.element)
            .is_some_and(|bounds| bounds.overlaps_viewport(self.platform.viewport_height()));
        if on_screen {
            self.latch("mount");
        }
    }

    /// Drain pending notifications. Returns true if this call latched the element.
    pub fn poll(&mut self) -> bool {
        let Some(registration) = &self.registration else {
            return false;
        };

        let mut latest: Option<IntersectionEntry> = None;
        let mut disconnected = false;
        loop {
            match registration.rx.try_recv() {
                Ok(entry) if entry.element == self.element => latest = Some(entry),
                Ok(_) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if latest.is_some_and(|entry| entry.is_intersecting) {
            return self.latch("intersection");
        }
        if disconnected {
            tracing::debug!("Observation of {:?} ended by the platform", self.element);
            self.release();
        }
        false
    }

    fn latch(&mut self, source: &str) -> bool {
        if self.state == Visibility::Visible {
            return false;
        }
        self.state = Visibility::Visible;
        tracing::debug!("{:?} became visible ({})", self.element, source);
        self.release();
        true
    }

    fn release(&mut self) {
        if let Some(registration) = self.registration.take() {
            self.platform.unobserve(registration.id);
            tracing::trace!("Released {:?} for {:?}", registration.id, self.element);
        }
    }

    /// Release the observation for good. Safe to call any number of times.
    pub fn detach(&mut self) {
        self.detached = true;
        self.release();
    }

    /// Re-attach with a new threshold and re-run the mount check.
    /// No-op once detached.
    pub fn set_threshold(&mut self, threshold: VisibilityThreshold) {
        if self.detached || threshold == self.threshold {
            return;
        }
        self.release();
        self.threshold = threshold;
        if self.state == Visibility::Hidden {
            self.start();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state == Visibility::Visible
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn threshold(&self) -> VisibilityThreshold {
        self.threshold
    }

    pub fn status(&self) -> ObserverStatus {
        if self.unavailable {
            ObserverStatus::Unavailable
        } else if self.registration.is_some() {
            ObserverStatus::Observing
        } else {
            ObserverStatus::Released
        }
    }
}

impl Drop for VisibilityTracker {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for VisibilityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("element", &self.element)
            .field("threshold", &self.threshold)
            .field("state", &self.state)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::geometry::ElementBounds;
    use crate::visibility::headless::HeadlessViewport;
    use pretty_assertions::assert_eq;

    fn setup(top: f64) -> (Rc<HeadlessViewport>, ElementId) {
        let viewport = Rc::new(HeadlessViewport::new(400.0, 800.0));
        let element = viewport.place(ElementBounds::new(0.0, top, 400.0, 100.0));
        (viewport, element)
    }

    #[test]
    fn test_on_screen_at_mount_is_visible_immediately() {
        let (viewport, element) = setup(100.0);
        let tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        assert!(tracker.is_visible());
        assert_eq!(tracker.status(), ObserverStatus::Released);
        assert_eq!(viewport.active_observations(), 0);
    }

    #[test]
    fn test_partially_above_viewport_counts_as_on_screen() {
        let (viewport, element) = setup(-60.0);
        let tracker = VisibilityTracker::attach_default(viewport, element);
        assert!(tracker.is_visible());
    }

    #[test]
    fn test_below_viewport_waits_for_notification() {
        let (viewport, element) = setup(3000.0);
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        assert!(!tracker.is_visible());
        assert!(!tracker.poll());
        assert_eq!(tracker.status(), ObserverStatus::Observing);

        viewport.deliver(element, true);
        assert!(tracker.poll());
        assert!(tracker.is_visible());
        assert_eq!(viewport.active_observations(), 0);

        viewport.deliver(element, false);
        assert!(!tracker.poll());
        assert!(tracker.is_visible());
    }

    #[test]
    fn test_scrolling_into_view_latches() {
        let (viewport, element) = setup(3000.0);
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        viewport.scroll_to(2500.0);
        assert!(tracker.poll());
        viewport.scroll_to(0.0);
        tracker.poll();
        assert_eq!(tracker.state(), Visibility::Visible);
    }

    #[test]
    fn test_only_latest_entry_counts() {
        let (viewport, element) = setup(3000.0);
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        viewport.deliver(element, true);
        viewport.deliver(element, false);
        assert!(!tracker.poll());
        assert!(!tracker.is_visible());
    }

    #[test]
    fn test_detach_before_notification_and_twice() {
        let (viewport, element) = setup(3000.0);
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        assert_eq!(viewport.active_observations(), 1);
        tracker.detach();
        tracker.detach();
        assert_eq!(viewport.active_observations(), 0);
        assert_eq!(tracker.status(), ObserverStatus::Released);

        viewport.deliver(element, true);
        assert!(!tracker.poll());
        assert!(!tracker.is_visible());
    }

    #[test]
    fn test_drop_releases_observation() {
        let (viewport, element) = setup(3000.0);
        {
            let _tracker = VisibilityTracker::attach_default(viewport.clone(), element);
            assert_eq!(viewport.active_observations(), 1);
        }
        assert_eq!(viewport.active_observations(), 0);
    }

    #[test]
    fn test_unavailable_platform_stays_hidden() {
        let viewport = Rc::new(HeadlessViewport::unavailable(400.0, 800.0));
        let element = viewport.place(ElementBounds::new(0.0, 0.0, 400.0, 100.0));
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        assert!(!tracker.is_visible());
        assert_eq!(tracker.status(), ObserverStatus::Unavailable);
        assert!(!tracker.poll());
        tracker.detach();
    }

    #[test]
    fn test_set_threshold_reattaches() {
        // 30px below the fold: inside the margin at 0.1, outside at 0.5
        let (viewport, element) = setup(830.0);
        let strict = VisibilityThreshold::new(0.5).unwrap();
        let mut tracker = VisibilityTracker::attach(viewport.clone(), element, strict);
        assert!(!tracker.poll());
        assert_eq!(viewport.active_observations(), 1);

        tracker.set_threshold(VisibilityThreshold::default());
        assert_eq!(viewport.active_observations(), 1);
        assert!(tracker.poll());
        assert!(tracker.is_visible());
    }

    #[test]
    fn test_set_threshold_reruns_mount_check() {
        let (viewport, element) = setup(3000.0);
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        // The crossing this move queues is never polled; re-attaching discards it
        viewport.move_element(element, ElementBounds::new(0.0, 10.0, 400.0, 100.0));
        tracker.set_threshold(VisibilityThreshold::new(0.9).unwrap());
        assert!(tracker.is_visible());
        assert_eq!(viewport.active_observations(), 0);
    }

    #[test]
    fn test_set_threshold_after_detach_is_noop() {
        let (viewport, element) = setup(3000.0);
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        tracker.detach();
        viewport.move_element(element, ElementBounds::new(0.0, 10.0, 400.0, 100.0));

        tracker.set_threshold(VisibilityThreshold::new(0.9).unwrap());
        assert_eq!(viewport.active_observations(), 0);
        assert_eq!(tracker.status(), ObserverStatus::Released);
        assert!(!tracker.is_visible());
        assert_eq!(tracker.threshold(), VisibilityThreshold::default());
    }

    #[test]
    fn test_set_threshold_after_visible_does_not_observe() {
        let (viewport, element) = setup(100.0);
        let mut tracker = VisibilityTracker::attach_default(viewport.clone(), element);
        tracker.set_threshold(VisibilityThreshold::new(0.9).unwrap());
        assert!(tracker.is_visible());
        assert_eq!(viewport.active_observations(), 0);
    }
}
