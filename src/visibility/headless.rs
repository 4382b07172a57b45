//! In-process viewport for hosts without a native observation primitive
//!
//! Elements are placed in document coordinates; the viewport scrolls over
//! them. Whenever geometry changes, every registration whose element crossed
//! its threshold receives a fresh [`IntersectionEntry`], mirroring how a
//! browser intersection observer reports crossings rather than every frame.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::Sender;

use super::geometry::{intersection_ratio, ElementBounds};
use super::platform::{
    ElementId, IntersectionEntry, ObservationId, ObservationPlatform, ObserverOptions,
};
use crate::error::{ForkfulError, Result};

struct Registration {
    element: ElementId,
    options: ObserverOptions,
    sink: Sender<IntersectionEntry>,
    last_intersecting: Option<bool>,
}

struct Inner {
    width: f64,
    height: f64,
    scroll_y: f64,
    available: bool,
    elements: HashMap<ElementId, ElementBounds>,
    registrations: BTreeMap<ObservationId, Registration>,
    next_element: u64,
    next_observation: u64,
}

pub struct HeadlessViewport {
    inner: RefCell<Inner>,
}

impl HeadlessViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            inner: RefCell::new(Inner {
                width,
                height,
                scroll_y: 0.0,
                available: true,
                elements: HashMap::new(),
                registrations: BTreeMap::new(),
                next_element: 0,
                next_observation: 0,
            }),
        }
    }

    /// A viewport whose observation primitive is missing; `observe` always fails.
    pub fn unavailable(width: f64, height: f64) -> Self {
        let viewport = Self::new(width, height);
        viewport.inner.borrow_mut().available = false;
        viewport
    }

    /// Add an element at `bounds` (document coordinates).
    pub fn place(&self, bounds: ElementBounds) -> ElementId {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = ElementId(inner.next_element);
            inner.next_element += 1;
            inner.elements.insert(id, bounds);
            id
        };
        self.dispatch();
        id
    }

    pub fn move_element(&self, element: ElementId, bounds: ElementBounds) {
        self.inner.borrow_mut().elements.insert(element, bounds);
        self.dispatch();
    }

    pub fn remove(&self, element: ElementId) {
        let mut inner = self.inner.borrow_mut();
        inner.elements.remove(&element);
        inner.registrations.retain(|_, r| r.element != element);
    }

    pub fn scroll_to(&self, y: f64) {
        self.inner.borrow_mut().scroll_y = y;
        self.dispatch();
    }

    pub fn scroll_by(&self, dy: f64) {
        let y = self.scroll_y() + dy;
        self.scroll_to(y);
    }

    pub fn resize(&self, width: f64, height: f64) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.width = width;
            inner.height = height;
        }
        self.dispatch();
    }

    pub fn scroll_y(&self) -> f64 {
        self.inner.borrow().scroll_y
    }

    pub fn width(&self) -> f64 {
        self.inner.borrow().width
    }

    /// Number of live registrations.
    pub fn active_observations(&self) -> usize {
        self.inner.borrow().registrations.len()
    }

    /// Push a raw notification to every registration watching `element`,
    /// bypassing geometry.
    pub fn deliver(&self, element: ElementId, is_intersecting: bool) {
        let entry = IntersectionEntry {
            element,
            is_intersecting,
            intersection_ratio: if is_intersecting { 1.0 } else { 0.0 },
        };
        let mut inner = self.inner.borrow_mut();
        inner.registrations.retain(|id, registration| {
            if registration.element != element {
                return true;
            }
            registration.last_intersecting = Some(is_intersecting);
            Self::send(*id, registration, entry)
        });
    }

    fn send(id: ObservationId, registration: &Registration, entry: IntersectionEntry) -> bool {
        match registration.sink.send(entry) {
            Ok(()) => true,
            Err(_) => {
                tracing::trace!("Dropping observation {:?}: receiver gone", id);
                false
            }
        }
    }

    fn entry_for(inner: &Inner, element: ElementId, options: &ObserverOptions) -> IntersectionEntry {
        let root = ElementBounds::new(0.0, 0.0, inner.width, inner.height)
            .expanded(options.root_margin_px);
        let ratio = inner
            .elements
            .get(&element)
            .map(|bounds| bounds.translated(0.0, -inner.scroll_y))
            .and_then(|bounds| intersection_ratio(&bounds, &root));

        // Edge contact counts as intersecting, so a zero threshold reports it
        let is_intersecting = ratio.is_some_and(|ratio| ratio >= options.threshold.ratio());
        IntersectionEntry {
            element,
            is_intersecting,
            intersection_ratio: ratio.unwrap_or(0.0),
        }
    }

    fn dispatch(&self) {
        let mut inner = self.inner.borrow_mut();
        let entries: Vec<(ObservationId, IntersectionEntry)> = inner
            .registrations
            .iter()
            .map(|(id, r)| (*id, Self::entry_for(&inner, r.element, &r.options)))
            .collect();

        for (id, entry) in entries {
            let keep = match inner.registrations.get_mut(&id) {
                Some(registration) => {
                    if registration.last_intersecting == Some(entry.is_intersecting) {
                        continue;
                    }
                    registration.last_intersecting = Some(entry.is_intersecting);
                    Self::send(id, registration, entry)
                }
                None => continue,
            };
            if !keep {
                inner.registrations.remove(&id);
            }
        }
    }
}

impl ObservationPlatform for HeadlessViewport {
    fn viewport_height(&self) -> f64 {
        self.inner.borrow().height
    }

    fn bounding_rect(&self, element: ElementId) -> Option<ElementBounds> {
        let inner = self.inner.borrow();
        inner
            .elements
            .get(&element)
            .map(|bounds| bounds.translated(0.0, -inner.scroll_y))
    }

    fn observe(
        &self,
        element: ElementId,
        options: ObserverOptions,
        sink: Sender<IntersectionEntry>,
    ) -> Result<ObservationId> {
        let mut inner = self.inner.borrow_mut();
        if !inner.available {
            return Err(ForkfulError::ObserverUnavailable(
                "headless viewport built without observation support".to_string(),
            ));
        }

        let id = ObservationId(inner.next_observation);
        inner.next_observation += 1;

        // Observers report the starting state once, like the browser primitive
        let entry = Self::entry_for(&inner, element, &options);
        let registration = Registration {
            element,
            options,
            sink,
            last_intersecting: Some(entry.is_intersecting),
        };
        if Self::send(id, &registration, entry) {
            inner.registrations.insert(id, registration);
        }
        Ok(id)
    }

    fn unobserve(&self, observation: ObservationId) {
        self.inner.borrow_mut().registrations.remove(&observation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::platform::VisibilityThreshold;
    use std::sync::mpsc::channel;

    fn card(top: f64) -> ElementBounds {
        ElementBounds::new(0.0, top, 400.0, 100.0)
    }

    #[test]
    fn test_observe_reports_initial_state() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        let element = viewport.place(card(2000.0));
        let (tx, rx) = channel();
        viewport
            .observe(element, ObserverOptions::default(), tx)
            .unwrap();
        let entry = rx.try_recv().unwrap();
        assert!(!entry.is_intersecting);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_scroll_delivers_crossing_once() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        let element = viewport.place(card(2000.0));
        let (tx, rx) = channel();
        viewport
            .observe(element, ObserverOptions::default(), tx)
            .unwrap();
        let _ = rx.try_recv();

        viewport.scroll_to(1300.0);
        let entry = rx.try_recv().unwrap();
        assert!(entry.is_intersecting);

        // Still intersecting: no new crossing
        viewport.scroll_by(10.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_margin_counts_near_viewport_elements() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        // 30px below the fold; the 50px margin pulls in 20% of it
        let element = viewport.place(card(830.0));
        let (tx, rx) = channel();
        viewport
            .observe(element, ObserverOptions::default(), tx)
            .unwrap();
        let entry = rx.try_recv().unwrap();
        assert!(entry.is_intersecting);
        assert!((entry.intersection_ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_gates_intersection() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        let element = viewport.place(card(830.0));
        let (tx, rx) = channel();
        let options = ObserverOptions::with_threshold(VisibilityThreshold::new(0.5).unwrap());
        viewport.observe(element, options, tx).unwrap();
        assert!(!rx.try_recv().unwrap().is_intersecting);
    }

    #[test]
    fn test_zero_threshold_reports_edge_contact() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        // Top edge sits exactly on the bottom of the margin-expanded root (850px)
        let element = viewport.place(card(850.0));

        let (tx, rx) = channel();
        let options = ObserverOptions::with_threshold(VisibilityThreshold::new(0.0).unwrap());
        viewport.observe(element, options, tx).unwrap();
        let entry = rx.try_recv().unwrap();
        assert!(entry.is_intersecting);
        assert_eq!(entry.intersection_ratio, 0.0);

        let (tx, rx) = channel();
        viewport.observe(element, ObserverOptions::default(), tx).unwrap();
        assert!(!rx.try_recv().unwrap().is_intersecting);
    }

    #[test]
    fn test_unobserve_stops_delivery() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        let element = viewport.place(card(2000.0));
        let (tx, rx) = channel();
        let id = viewport
            .observe(element, ObserverOptions::default(), tx)
            .unwrap();
        viewport.unobserve(id);
        assert_eq!(viewport.active_observations(), 0);
        let _ = rx.try_recv();
        viewport.scroll_to(1300.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_prunes_registration() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        let element = viewport.place(card(2000.0));
        let (tx, rx) = channel();
        viewport
            .observe(element, ObserverOptions::default(), tx)
            .unwrap();
        drop(rx);
        viewport.scroll_to(1300.0);
        assert_eq!(viewport.active_observations(), 0);
    }

    #[test]
    fn test_unavailable_viewport_refuses_observation() {
        let viewport = HeadlessViewport::unavailable(400.0, 800.0);
        let element = viewport.place(card(0.0));
        let (tx, _rx) = channel();
        let result = viewport.observe(element, ObserverOptions::default(), tx);
        assert!(matches!(result, Err(ForkfulError::ObserverUnavailable(_))));
    }

    #[test]
    fn test_bounding_rect_is_viewport_relative() {
        let viewport = HeadlessViewport::new(400.0, 800.0);
        let element = viewport.place(card(1000.0));
        viewport.scroll_to(600.0);
        let rect = viewport.bounding_rect(element).unwrap();
        assert_eq!(rect.top, 400.0);
        assert_eq!(rect.bottom, 500.0);
    }
}
