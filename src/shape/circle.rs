use geo::Point;
use geoprefix_types::relation::IntersectCase;
use uuid::Uuid;

use super::Rectangle;
use crate::context::SpatialContext;
use crate::distance::DistanceCalculator;
use crate::error::{Result, SpatialError};

/// A point-radius shape whose distance semantics come from its context.
///
/// The enclosing rectangle is computed once at construction through the
/// context's distance calculator. It may cross the dateline.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    center: Point,
    radius: f64,
    calculator: DistanceCalculator,
    context_id: Uuid,
    enclosing_box: Rectangle,
}

impl Circle {
    /// Create a circle. The radius is assumed to be validated already.
    pub fn new(center: Point, radius: f64, ctx: &SpatialContext) -> Self {
        let calculator = ctx.distance_calculator();
        Self {
            center,
            radius,
            calculator,
            context_id: ctx.id(),
            enclosing_box: calculator.calc_box_by_dist_from_pt(&center, radius),
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn bounding_box(&self) -> Rectangle {
        self.enclosing_box
    }

    pub fn has_area(&self) -> bool {
        self.radius > 0.0
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.calculator.distance_xy(&self.center, x, y) <= self.radius
    }

    fn check_context(&self, ctx: &SpatialContext) {
        debug_assert_eq!(
            self.context_id,
            ctx.id(),
            "circle related under a different spatial context"
        );
    }

    pub fn relate_point(&self, point: &Point) -> IntersectCase {
        if self.contains_xy(point.x(), point.y()) {
            IntersectCase::Contains
        } else {
            IntersectCase::Outside
        }
    }

    pub fn relate_circle(&self, other: &Circle, ctx: &SpatialContext) -> IntersectCase {
        self.check_context(ctx);
        other.check_context(ctx);
        let cross = self.calculator.distance(&self.center, &other.center);
        let (a, b) = (self.radius, other.radius);
        // Coincident circles, including two zero-radius ones.
        if cross == 0.0 && a == b {
            return IntersectCase::Contains;
        }
        if cross > a + b {
            IntersectCase::Outside
        } else if cross < a && cross + b <= a {
            IntersectCase::Contains
        } else if cross < b && cross + a <= b {
            IntersectCase::Within
        } else {
            IntersectCase::Intersects
        }
    }

    /// Relation of this circle to a rectangle.
    ///
    /// The enclosing box is compared first since that is far cheaper than the
    /// distance calculator; only INTERSECTS and CONTAINS box results go on to
    /// the exact test.
    pub fn relate_rect(&self, r: &Rectangle, ctx: &SpatialContext) -> Result<IntersectCase> {
        self.check_context(ctx);
        let bbox_sect = self.enclosing_box.relate_rect(r);
        match bbox_sect {
            IntersectCase::Outside | IntersectCase::Within => return Ok(bbox_sect),
            IntersectCase::Contains if self.enclosing_box == *r => {
                return Ok(IntersectCase::Within);
            }
            _ => {}
        }
        self.relate_rect_phase2(r, bbox_sect)
    }

    fn relate_rect_phase2(&self, r: &Rectangle, bbox_sect: IntersectCase) -> Result<IntersectCase> {
        if r.crosses_dateline() || self.enclosing_box.crosses_dateline() {
            return Err(SpatialError::UnsupportedOperation(
                "circle to rectangle relation across the dateline".to_string(),
            ));
        }

        // From here on the circle cannot be WITHIN r: its box would have been.
        let (ctr_x, ctr_y) = (self.center.x(), self.center.y());
        let closest_x = ctr_x.clamp(r.min_x(), r.max_x());
        let closest_y = ctr_y.clamp(r.min_y(), r.max_y());

        if ctr_x == closest_x {
            let delta_y = (ctr_y - closest_y).abs();
            let reach_y = if ctr_y < closest_y {
                self.enclosing_box.max_y() - ctr_y
            } else {
                ctr_y - self.enclosing_box.min_y()
            };
            if delta_y > reach_y {
                return Ok(IntersectCase::Outside);
            }
        } else if ctr_y == closest_y {
            let delta_x = (ctr_x - closest_x).abs();
            let reach_x = if ctr_x < closest_x {
                self.enclosing_box.max_x() - ctr_x
            } else {
                ctr_x - self.enclosing_box.min_x()
            };
            if delta_x > reach_x {
                return Ok(IntersectCase::Outside);
            }
        } else if !self.contains_xy(closest_x, closest_y) {
            return Ok(IntersectCase::Outside);
        }

        // Not OUTSIDE and not WITHIN. A circle containing r needs a containing box.
        if bbox_sect != IntersectCase::Contains {
            return Ok(IntersectCase::Intersects);
        }

        let farthest_x = if r.max_x() - ctr_x > ctr_x - r.min_x() {
            r.max_x()
        } else {
            r.min_x()
        };
        let farthest_y = if r.max_y() - ctr_y > ctr_y - r.min_y() {
            r.max_y()
        } else {
            r.min_y()
        };
        if self.contains_xy(farthest_x, farthest_y) {
            Ok(IntersectCase::Contains)
        } else {
            Ok(IntersectCase::Intersects)
        }
    }
}
