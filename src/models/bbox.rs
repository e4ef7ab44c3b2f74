//! Bounding boxes
//!
//! Every positionable node carries a `BoundingBox`: an anchor point (the
//! drawing position of the node) plus an optional rectangle expressed
//! relative to that anchor. Geometry here is pure; nothing in this module
//! knows about the tree.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (y grows downwards)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// Create a rectangle from two corners, in any order
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Create a rectangle from its top-left corner and size
    pub fn from_origin(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// A rectangle without area has no visual footprint
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Smallest rectangle containing both; empty rectangles are ignored
    pub fn union(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Rect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Interval of the rectangle along one axis
    pub fn span(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::Horizontal => (self.x1, self.x2),
            Axis::Vertical => (self.y1, self.y2),
        }
    }
}

/// Axis selector for overlap resolution
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn other(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Translations that clear an overlap along one axis
///
/// `forward` moves the box towards increasing coordinates (right/down),
/// `backward` towards decreasing ones. Both are magnitudes, zero when the
/// boxes do not collide.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Offset {
    pub forward: f64,
    pub backward: f64,
}

impl Offset {
    pub const NONE: Offset = Offset {
        forward: 0.0,
        backward: 0.0,
    };

    /// Signed smallest translation (negative means backward)
    pub fn minimal(&self) -> f64 {
        if self.forward <= self.backward {
            self.forward
        } else {
            -self.backward
        }
    }

    pub fn is_none(&self) -> bool {
        self.forward == 0.0 && self.backward == 0.0
    }
}

/// Anchor point plus optional relative rectangle
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct BoundingBox {
    /// Drawing position of the owner
    pub x: f64,
    pub y: f64,
    /// Footprint relative to the anchor, `None` for no visual footprint
    pub rect: Option<Rect>,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, rect: Option<Rect>) -> Self {
        Self { x, y, rect }
    }

    /// A box with an anchor only
    pub fn point(x: f64, y: f64) -> Self {
        Self { x, y, rect: None }
    }

    /// Box for an absolute rectangle, anchored at its top-left corner
    pub fn from_bounds(bounds: Rect) -> Self {
        Self {
            x: bounds.x1,
            y: bounds.y1,
            rect: Some(bounds.translate(-bounds.x1, -bounds.y1)),
        }
    }

    pub fn set_anchor(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Absolute rectangle (zero-size at the anchor when there is no footprint)
    pub fn bounds(&self) -> Rect {
        match self.rect {
            Some(rect) => rect.translate(self.x, self.y),
            None => Rect::new(self.x, self.y, self.x, self.y),
        }
    }

    pub fn has_content(&self) -> bool {
        self.rect.map(|r| !r.is_empty()).unwrap_or(false)
    }

    /// Exact overlap test; touching edges do not overlap
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.overlaps_with_margin(other, Axis::Horizontal, 0.0)
    }

    /// Overlap test with the `axis` interval of `other` widened by `margin`
    pub fn overlaps_with_margin(&self, other: &BoundingBox, axis: Axis, margin: f64) -> bool {
        if !self.has_content() || !other.has_content() {
            return false;
        }
        let (a, b) = (self.bounds(), other.bounds());
        let (a_lo, a_hi) = a.span(axis);
        let (b_lo, b_hi) = b.span(axis);
        if a_hi <= b_lo - margin || a_lo >= b_hi + margin {
            return false;
        }
        let (c_lo, c_hi) = a.span(axis.other());
        let (d_lo, d_hi) = b.span(axis.other());
        c_hi > d_lo && c_lo < d_hi
    }

    /// Minimal translation of `self` along `axis` that removes the overlap
    /// with `other`, keeping `margin` between them
    pub fn offset_to_avoid(&self, other: &BoundingBox, axis: Axis, margin: f64) -> Offset {
        if !self.overlaps_with_margin(other, axis, margin) {
            return Offset::NONE;
        }
        let (a_lo, a_hi) = self.bounds().span(axis);
        let (b_lo, b_hi) = other.bounds().span(axis);
        Offset {
            forward: (b_hi + margin - a_lo).max(0.0),
            backward: (a_hi - (b_lo - margin)).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox::from_bounds(Rect::new(x1, y1, x2, y2))
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = Rect::new(10.0, 8.0, 2.0, 4.0);
        assert_eq!(rect, Rect { x1: 2.0, y1: 4.0, x2: 10.0, y2: 8.0 });
        assert_eq!(rect.width(), 8.0);
        assert_eq!(rect.height(), 4.0);
    }

    #[test]
    fn test_overlap_is_exact() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&bbox(9.0, 9.0, 20.0, 20.0)));
        // Touching edges
        assert!(!a.overlaps(&bbox(10.0, 0.0, 20.0, 10.0)));
        // Horizontal overlap only
        assert!(!a.overlaps(&bbox(5.0, 11.0, 15.0, 20.0)));
    }

    #[test]
    fn test_offset_to_avoid_horizontal() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(8.0, 0.0, 18.0, 10.0);
        let offset = b.offset_to_avoid(&a, Axis::Horizontal, 1.0);
        assert_eq!(offset.forward, 3.0);
        assert_eq!(offset.backward, 19.0);
        assert_eq!(offset.minimal(), 3.0);
    }

    #[test]
    fn test_offset_margin_creates_collision() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(11.0, 0.0, 20.0, 10.0);
        assert!(b.offset_to_avoid(&a, Axis::Horizontal, 0.0).is_none());
        assert_eq!(b.offset_to_avoid(&a, Axis::Horizontal, 2.0).forward, 1.0);
    }

    #[test]
    fn test_offset_vertical() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(0.0, 6.0, 10.0, 12.0);
        let offset = b.offset_to_avoid(&a, Axis::Vertical, 0.0);
        assert_eq!(offset.forward, 4.0);
        assert_eq!(offset.minimal(), 4.0);
    }

    #[test]
    fn test_zero_area_boxes_never_collide() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let empty = BoundingBox::point(5.0, 5.0);
        let flat = bbox(2.0, 5.0, 8.0, 5.0);
        assert!(!a.overlaps(&empty));
        assert!(!a.overlaps(&flat));
        assert!(empty.offset_to_avoid(&a, Axis::Horizontal, 4.0).is_none());
        assert!(a.offset_to_avoid(&flat, Axis::Vertical, 4.0).is_none());
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, -2.0, 6.0, 1.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -2.0, 6.0, 4.0));
        assert_eq!(a.union(&Rect::default()), a);
        assert_eq!(Rect::default().union(&b), b);
    }
}
