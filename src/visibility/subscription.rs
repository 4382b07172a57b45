use std::rc::Rc;

use super::platform::{ElementId, ObservationPlatform, VisibilityThreshold};
use super::tracker::VisibilityTracker;

type OnVisible = Box<dyn FnOnce()>;

/// Disposer returned by [`subscribe`]. Dropping it unsubscribes.
pub struct VisibilitySubscription {
    tracker: VisibilityTracker,
    on_visible: Option<OnVisible>,
}

/// Call `on_visible` once, the first time `element` is seen in the viewport.
///
/// If the element is already on screen the callback runs before this returns.
pub fn subscribe<F>(
    platform: Rc<dyn ObservationPlatform>,
    element: ElementId,
    threshold: VisibilityThreshold,
    on_visible: F,
) -> VisibilitySubscription
where
    F: FnOnce() + 'static,
{
    let mut subscription = VisibilitySubscription {
        tracker: VisibilityTracker::attach(platform, element, threshold),
        on_visible: Some(Box::new(on_visible)),
    };
    subscription.fire_if_visible();
    subscription
}

impl VisibilitySubscription {
    /// Drain pending notifications; returns true if the callback ran.
    pub fn poll(&mut self) -> bool {
        self.tracker.poll();
        self.fire_if_visible()
    }

    fn fire_if_visible(&mut self) -> bool {
        if !self.tracker.is_visible() {
            return false;
        }
        match self.on_visible.take() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Stop observing and drop the callback. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.on_visible = None;
        self.tracker.detach();
    }

    pub fn is_visible(&self) -> bool {
        self.tracker.is_visible()
    }

    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }
}
