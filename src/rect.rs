//! Axis-aligned rectangle geometry.
//!
//! Rectangles may carry negative width or height (a marquee dragged up and to
//! the left, for example). Every comparison normalizes first so callers never
//! have to care which corner a rect was built from.

#[cfg(test)]
#[path = "rect_test.rs"]
mod rect_test;

use crate::camera::Point;

/// An axis-aligned rectangle anchored at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Flip negative dimensions so that `(x, y)` is the top-left corner.
    #[must_use]
    pub fn normalize(self) -> Self {
        let (x, width) = if self.width < 0.0 { (self.x + self.width, -self.width) } else { (self.x, self.width) };
        let (y, height) = if self.height < 0.0 { (self.y + self.height, -self.height) } else { (self.y, self.height) };
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn tuple(self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Whether `p` lies inside the rect, edges included.
    #[must_use]
    pub fn contains_point(self, p: Point) -> bool {
        let r = self.normalize();
        p.x >= r.x && p.x <= r.right() && p.y >= r.y && p.y <= r.bottom()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Compass direction from one object toward another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    N,
    S,
    E,
    W,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::S => "S",
            Self::E => "E",
            Self::W => "W",
        }
    }
}

/// Smallest rect enclosing every input rect, or `None` for an empty slice.
#[must_use]
pub fn min_spanning_rect(rects: &[Rect]) -> Option<Rect> {
    let mut iter = rects.iter().map(|r| r.normalize());
    let first = iter.next()?;
    let (mut left, mut top, mut right, mut bottom) = (first.x, first.y, first.right(), first.bottom());
    for r in iter {
        left = left.min(r.x);
        top = top.min(r.y);
        right = right.max(r.right());
        bottom = bottom.max(r.bottom());
    }
    Some(Rect::new(left, top, right - left, bottom - top))
}

/// Strict containment: every edge of `inner` lies strictly inside `outer`.
#[must_use]
pub fn rect_subset(inner: Rect, outer: Rect) -> bool {
    let a = inner.normalize();
    let b = outer.normalize();
    a.x > b.x && a.right() < b.right() && a.y > b.y && a.bottom() < b.bottom()
}

/// Separating-axis overlap test. Touching edges count as overlapping.
#[must_use]
pub fn rect_overlap(a: Rect, b: Rect) -> bool {
    let a = a.normalize();
    let b = b.normalize();
    !(a.right() < b.x || b.right() < a.x || a.bottom() < b.y || b.bottom() < a.y)
}

#[must_use]
pub fn rect_center(rect: Rect) -> Point {
    let r = rect.normalize();
    Point::new(r.x + r.width / 2.0, r.y + r.height / 2.0)
}

/// Magnitude and angle (degrees, 0 along +x) of the vector from `a` to `b`.
///
/// Angles are measured in screen space where +y points down, so a target
/// above `a` yields a negative angle.
#[must_use]
pub fn vector_from_a_to_b(a: Point, b: Point) -> (f64, f64) {
    let d = b.sub(a);
    let magnitude = d.x.hypot(d.y);
    if magnitude == 0.0 {
        return (0.0, 0.0);
    }
    (magnitude, d.y.atan2(d.x).to_degrees())
}

/// Bucket an angle in degrees into a compass direction.
#[must_use]
pub fn cardinal_direction(angle: f64) -> Direction {
    if angle.abs() < 45.0 {
        Direction::E
    } else if angle.abs() > 135.0 {
        Direction::W
    } else if angle < 0.0 {
        Direction::N
    } else {
        Direction::S
    }
}
