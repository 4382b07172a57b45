//! Viewport geometry in CSS-style pixels (y grows downward)

/// Axis-aligned box, relative to whatever origin the caller uses
/// (document coordinates in storage, viewport coordinates when reported).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBounds {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl ElementBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            bottom: top + height.max(0.0),
            left,
            right: left + width.max(0.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            bottom: self.bottom + dy,
            left: self.left + dx,
            right: self.right + dx,
        }
    }

    /// Grow every edge outward by `margin`.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            top: self.top - margin,
            bottom: self.bottom + margin,
            left: self.left - margin,
            right: self.right + margin,
        }
    }

    /// Mount-time check: does the box overlap the unexpanded viewport vertically?
    pub fn overlaps_viewport(&self, viewport_height: f64) -> bool {
        self.top < viewport_height && self.bottom > 0.0
    }

    pub fn intersection(&self, other: &ElementBounds) -> Option<ElementBounds> {
        let top = self.top.max(other.top);
        let bottom = self.bottom.min(other.bottom);
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        (top <= bottom && left <= right).then_some(ElementBounds {
            top,
            bottom,
            left,
            right,
        })
    }
}

/// Visible fraction of `element` against `root` (both in the same coordinates).
///
/// Returns `None` when the boxes do not touch at all. A zero-area element that
/// sits inside the root counts as fully visible.
pub fn intersection_ratio(element: &ElementBounds, root: &ElementBounds) -> Option<f64> {
    let overlap = element.intersection(root)?;
    let area = element.area();
    if area <= 0.0 {
        return Some(1.0);
    }
    Some((overlap.area() / area).clamp(0.0, 1.0))
}
