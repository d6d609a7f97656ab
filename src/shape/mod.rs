//! Shape value types and the pairwise relation matrix between them.
//!
//! Every shape is immutable once built. Relations are computed by an explicit
//! match over the four shape kinds; a reversed pair is answered by relating
//! the pair the other way round and transposing the result.
//!
//! ```rust
//! use geoprefix::context::SpatialContext;
//! use geoprefix::shape::{Rectangle, Shape};
//! use geoprefix_types::relation::IntersectCase;
//!
//! let ctx = SpatialContext::cartesian(Rectangle::new(0.0, 100.0, 0.0, 100.0));
//! let outer = Shape::from(Rectangle::new(0.0, 100.0, 0.0, 100.0));
//! let inner = Shape::from(Rectangle::new(25.0, 75.0, 25.0, 75.0));
//! assert_eq!(outer.relate(&inner, &ctx)?, IntersectCase::Contains);
//! assert_eq!(inner.relate(&outer, &ctx)?, IntersectCase::Within);
//! # Ok::<(), geoprefix::SpatialError>(())
//! ```

mod circle;
mod geometry;
mod rect;

pub use circle::Circle;
pub use geometry::GeometryShape;
pub use rect::Rectangle;

use geo::Point;
use geoprefix_types::relation::IntersectCase;

use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};

/// Any shape the spatial core can relate, index or serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point),
    Rect(Rectangle),
    Circle(Circle),
    Geometry(GeometryShape),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Point(_) => "point",
            Shape::Rect(_) => "rectangle",
            Shape::Circle(_) => "circle",
            Shape::Geometry(_) => "geometry",
        }
    }

    pub fn bounding_box(&self) -> Rectangle {
        match self {
            Shape::Point(p) => Rectangle::from_point(p),
            Shape::Rect(r) => *r,
            Shape::Circle(c) => c.bounding_box(),
            Shape::Geometry(g) => g.bounding_box(),
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Shape::Point(p) => *p,
            Shape::Rect(r) => r.center(),
            Shape::Circle(c) => c.center(),
            Shape::Geometry(g) => g.center(),
        }
    }

    pub fn has_area(&self) -> bool {
        match self {
            Shape::Point(_) => false,
            Shape::Rect(r) => r.has_area(),
            Shape::Circle(c) => c.has_area(),
            Shape::Geometry(g) => g.has_area(),
        }
    }

    /// Area in squared coordinate units. Circles use the planar formula.
    pub fn area(&self) -> f64 {
        match self {
            Shape::Point(_) => 0.0,
            Shape::Rect(r) => r.area(),
            Shape::Circle(c) => std::f64::consts::PI * c.radius() * c.radius(),
            Shape::Geometry(g) => g.area(),
        }
    }

    /// Topological relation of `self` to `other`.
    ///
    /// CONTAINS means `self` covers `other`, WITHIN means `self` is covered by
    /// `other`. Shapes built under different contexts must not be mixed.
    pub fn relate(&self, other: &Shape, ctx: &SpatialContext) -> Result<IntersectCase> {
        match (self, other) {
            (Shape::Point(a), Shape::Point(b)) => Ok(if a == b {
                IntersectCase::Contains
            } else {
                IntersectCase::Outside
            }),
            (Shape::Point(p), Shape::Rect(r)) => Ok(r.relate_point(p).transpose()),
            (Shape::Point(p), Shape::Circle(c)) => Ok(c.relate_point(p).transpose()),

            (Shape::Rect(r), Shape::Point(p)) => Ok(r.relate_point(p)),
            (Shape::Rect(a), Shape::Rect(b)) => Ok(a.relate_rect(b)),
            (Shape::Rect(r), Shape::Circle(c)) => Ok(c.relate_rect(r, ctx)?.transpose()),
            (Shape::Rect(r), Shape::Geometry(g)) => Ok(g.relate_rect(r)?.transpose()),

            (Shape::Circle(c), Shape::Point(p)) => Ok(c.relate_point(p)),
            (Shape::Circle(c), Shape::Rect(r)) => c.relate_rect(r, ctx),
            (Shape::Circle(a), Shape::Circle(b)) => Ok(a.relate_circle(b, ctx)),

            (Shape::Geometry(g), Shape::Rect(r)) => g.relate_rect(r),
            (Shape::Geometry(a), Shape::Geometry(b)) => a.relate_geometry(b),

            (Shape::Point(_), Shape::Geometry(_))
            | (Shape::Geometry(_), Shape::Point(_))
            | (Shape::Circle(_), Shape::Geometry(_))
            | (Shape::Geometry(_), Shape::Circle(_)) => Err(SpatialError::InvalidArgument(
                format!("cannot relate {} to {}", self.kind(), other.kind()),
            )),
        }
    }

    /// Relation of this shape to a rectangle, the hot path of tree traversal.
    pub fn relate_rect(&self, r: &Rectangle, ctx: &SpatialContext) -> Result<IntersectCase> {
        match self {
            Shape::Point(p) => Ok(r.relate_point(p).transpose()),
            Shape::Rect(a) => Ok(a.relate_rect(r)),
            Shape::Circle(c) => c.relate_rect(r, ctx),
            Shape::Geometry(g) => g.relate_rect(r),
        }
    }
}

impl From<Point> for Shape {
    fn from(p: Point) -> Self {
        Shape::Point(p)
    }
}

impl From<Rectangle> for Shape {
    fn from(r: Rectangle) -> Self {
        Shape::Rect(r)
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<GeometryShape> for Shape {
    fn from(g: GeometryShape) -> Self {
        Shape::Geometry(g)
    }
}
