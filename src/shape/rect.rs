use geo::{Point, Rect};
use geoprefix_types::relation::IntersectCase;

use crate::distance::normalize_lon;

const WORLD_SPAN: f64 = 360.0;

/// An axis-aligned rectangle.
///
/// `min_x > max_x` is a valid state meaning the rectangle wraps around the
/// dateline of a geodetic context; widths and areas account for the wrap.
///
/// # Examples
///
/// ```
/// use geoprefix::shape::Rectangle;
///
/// let pacific = Rectangle::new(170.0, -170.0, -10.0, 10.0);
/// assert!(pacific.crosses_dateline());
/// assert_eq!(pacific.width(), 20.0);
/// assert!(pacific.contains_xy(-175.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Rectangle {
    /// Create a rectangle. Arguments are in `min_x, max_x, min_y, max_y` order.
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// A zero-size rectangle at a point.
    pub fn from_point(point: &Point) -> Self {
        Self::new(point.x(), point.x(), point.y(), point.y())
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn crosses_dateline(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn width(&self) -> f64 {
        if self.crosses_dateline() {
            self.max_x + WORLD_SPAN - self.min_x
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Whether the rectangle is non-degenerate in plain (unwrapped) coordinates.
    pub fn has_size(&self) -> bool {
        self.max_x > self.min_x && self.max_y > self.min_y
    }

    pub fn center(&self) -> Point {
        let y = (self.min_y + self.max_y) / 2.0;
        if self.crosses_dateline() {
            Point::new(normalize_lon(self.min_x + self.width() / 2.0), y)
        } else {
            Point::new((self.min_x + self.max_x) / 2.0, y)
        }
    }

    /// Inclusive containment test, honouring dateline wrap.
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        if y < self.min_y || y > self.max_y {
            return false;
        }
        if self.crosses_dateline() {
            x >= self.min_x || x <= self.max_x
        } else {
            x >= self.min_x && x <= self.max_x
        }
    }

    /// Relation of this rectangle to a point: CONTAINS or OUTSIDE.
    pub fn relate_point(&self, point: &Point) -> IntersectCase {
        if self.contains_xy(point.x(), point.y()) {
            IntersectCase::Contains
        } else {
            IntersectCase::Outside
        }
    }

    /// Relation of this rectangle to another.
    ///
    /// Identical rectangles relate as CONTAINS.
    pub fn relate_rect(&self, other: &Rectangle) -> IntersectCase {
        if other.min_y > self.max_y || other.max_y < self.min_y {
            return IntersectCase::Outside;
        }
        let Some(x) = self.x_relation(other) else {
            return IntersectCase::Outside;
        };

        let contains_y = other.min_y >= self.min_y && other.max_y <= self.max_y;
        let within_y = self.min_y >= other.min_y && self.max_y <= other.max_y;

        if x.contains && contains_y {
            IntersectCase::Contains
        } else if x.within && within_y {
            IntersectCase::Within
        } else {
            IntersectCase::Intersects
        }
    }

    /// Compare the x intervals, trying the wrapped shifts when either side
    /// crosses the dateline. `None` means the intervals are disjoint.
    fn x_relation(&self, other: &Rectangle) -> Option<AxisRelation> {
        let (a_lo, a_hi) = self.unwrapped_x();
        let (b_lo, b_hi) = other.unwrapped_x();

        // Only geodetic rectangles wrap, so planar intervals never get here.
        let wraps = self.crosses_dateline() || other.crosses_dateline();
        if wraps {
            let a_world = a_hi - a_lo >= WORLD_SPAN;
            let b_world = b_hi - b_lo >= WORLD_SPAN;
            if a_world || b_world {
                return Some(AxisRelation {
                    contains: a_world,
                    within: b_world,
                });
            }
        }

        let shifts: &[f64] = if wraps {
            &[0.0, -WORLD_SPAN, WORLD_SPAN]
        } else {
            &[0.0]
        };

        let mut overlap = None;
        for shift in shifts {
            let (lo, hi) = (b_lo + shift, b_hi + shift);
            if lo > a_hi || hi < a_lo {
                continue;
            }
            let rel = AxisRelation {
                contains: lo >= a_lo && hi <= a_hi,
                within: a_lo >= lo && a_hi <= hi,
            };
            if rel.contains || rel.within {
                return Some(rel);
            }
            overlap = Some(rel);
        }
        overlap
    }

    fn unwrapped_x(&self) -> (f64, f64) {
        if self.crosses_dateline() {
            (self.min_x, self.max_x + WORLD_SPAN)
        } else {
            (self.min_x, self.max_x)
        }
    }

    /// The equivalent `geo::Rect`, unless the rectangle wraps the dateline.
    pub fn to_geo_rect(&self) -> Option<Rect> {
        if self.crosses_dateline() {
            return None;
        }
        Some(Rect::new(
            geo::coord! { x: self.min_x, y: self.min_y },
            geo::coord! { x: self.max_x, y: self.max_y },
        ))
    }
}

impl From<Rect> for Rectangle {
    fn from(rect: Rect) -> Self {
        Rectangle::new(rect.min().x, rect.max().x, rect.min().y, rect.max().y)
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisRelation {
    contains: bool,
    within: bool,
}
