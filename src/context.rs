//! The spatial context: world bounds, units and the distance calculator.
//!
//! A context is built once and shared (usually behind an `Arc`) by every shape
//! and prefix tree created under it. Nothing here is global; callers pass the
//! context explicitly.

use geo::Point;
use geoprefix_types::units::DistanceUnits;
use uuid::Uuid;

use crate::distance::{DistanceCalculator, normalize_lon};
use crate::error::{Result, SpatialError};
use crate::io;
use crate::shape::{Circle, Rectangle, Shape};

/// Bounds of a geodetic world in degrees.
pub const GEO_WORLD: Rectangle = Rectangle::new(-180.0, 180.0, -90.0, 90.0);

#[derive(Debug, Clone)]
pub struct SpatialContext {
    id: Uuid,
    units: DistanceUnits,
    calculator: DistanceCalculator,
    world_bounds: Rectangle,
}

impl SpatialContext {
    /// A geodetic context (longitude/latitude degrees) measuring in `units`.
    pub fn geo(units: DistanceUnits) -> Self {
        Self::build(units, GEO_WORLD)
    }

    /// A planar context over the given world bounds.
    pub fn cartesian(world_bounds: Rectangle) -> Self {
        Self::build(DistanceUnits::Cartesian, world_bounds)
    }

    /// A context with explicit units and bounds.
    ///
    /// Planar bounds must not wrap and must have area.
    pub fn new(units: DistanceUnits, world_bounds: Rectangle) -> Result<Self> {
        if !world_bounds.has_size() {
            return Err(SpatialError::InvalidArgument(format!(
                "world bounds must have area: {:?}",
                world_bounds
            )));
        }
        Ok(Self::build(units, world_bounds))
    }

    fn build(units: DistanceUnits, world_bounds: Rectangle) -> Self {
        Self {
            id: Uuid::new_v4(),
            units,
            calculator: DistanceCalculator::for_units(units),
            world_bounds,
        }
    }

    /// Identity of this context; shapes record it to catch cross-context use.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn units(&self) -> DistanceUnits {
        self.units
    }

    pub fn is_geo(&self) -> bool {
        self.units.is_geo()
    }

    pub fn distance_calculator(&self) -> DistanceCalculator {
        self.calculator
    }

    pub fn world_bounds(&self) -> Rectangle {
        self.world_bounds
    }

    /// Wrap x into the world for geodetic contexts; planar x is unchanged.
    pub fn normalize_x(&self, x: f64) -> f64 {
        if self.is_geo() { normalize_lon(x) } else { x }
    }

    pub fn make_point(&self, x: f64, y: f64) -> Result<Point> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SpatialError::InvalidShape(format!(
                "non-finite coordinates: {} {}",
                x, y
            )));
        }
        // Planar points may lie beyond the world; they simply relate as outside.
        if self.is_geo() && !(-90.0..=90.0).contains(&y) {
            return Err(SpatialError::InvalidShape(format!(
                "latitude {} is out of range",
                y
            )));
        }
        Ok(Point::new(self.normalize_x(x), y))
    }

    /// Build a rectangle; geodetic contexts accept `min_x > max_x` as a
    /// dateline-crossing rectangle.
    pub fn make_rect(&self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Rectangle> {
        if [min_x, max_x, min_y, max_y].iter().any(|v| !v.is_finite()) {
            return Err(SpatialError::InvalidShape(
                "non-finite rectangle bounds".to_string(),
            ));
        }
        if min_y > max_y {
            return Err(SpatialError::InvalidShape(format!(
                "min_y {} is greater than max_y {}",
                min_y, max_y
            )));
        }
        if !self.is_geo() && min_x > max_x {
            return Err(SpatialError::InvalidShape(format!(
                "min_x {} is greater than max_x {}",
                min_x, max_x
            )));
        }
        // A full-width geodetic rectangle keeps its plain bounds instead of
        // collapsing to a wrapped zero-width one.
        if self.is_geo() && max_x - min_x >= 360.0 {
            return Ok(Rectangle::new(-180.0, 180.0, min_y, max_y));
        }
        Ok(Rectangle::new(
            self.normalize_x(min_x),
            self.normalize_x(max_x),
            min_y,
            max_y,
        ))
    }

    pub fn make_circle(&self, center: Point, radius: f64) -> Result<Circle> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(SpatialError::InvalidShape(format!(
                "circle radius must be a non-negative number, got {}",
                radius
            )));
        }
        Ok(Circle::new(center, radius, self))
    }

    /// Parse the shape text format (see [`crate::io`]).
    pub fn read_shape(&self, value: &str) -> Result<Shape> {
        io::read_shape(value, self)
    }

    pub fn to_shape_string(&self, shape: &Shape) -> Result<String> {
        io::write_shape(shape)
    }
}

impl PartialEq for SpatialContext {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_context() {
        let ctx = SpatialContext::geo(DistanceUnits::Kilometers);
        assert!(ctx.is_geo());
        assert_eq!(ctx.world_bounds(), GEO_WORLD);
        assert_eq!(ctx.make_point(190.0, 10.0).unwrap(), Point::new(-170.0, 10.0));
        assert!(ctx.make_point(0.0, 91.0).is_err());
    }

    #[test]
    fn test_make_rect() {
        let ctx = SpatialContext::geo(DistanceUnits::Miles);
        let wrapped = ctx.make_rect(170.0, 190.0, 0.0, 1.0).unwrap();
        assert!(wrapped.crosses_dateline());
        assert_eq!(wrapped.width(), 20.0);

        let planar = SpatialContext::cartesian(Rectangle::new(0.0, 10.0, 0.0, 10.0));
        assert!(planar.make_rect(5.0, 1.0, 0.0, 1.0).is_err());
        assert!(planar.make_rect(1.0, 5.0, 3.0, 1.0).is_err());
    }

    #[test]
    fn test_make_circle_rejects_negative_radius() {
        let ctx = SpatialContext::cartesian(Rectangle::new(0.0, 10.0, 0.0, 10.0));
        assert!(ctx.make_circle(Point::new(1.0, 1.0), -1.0).is_err());
        assert!(ctx.make_circle(Point::new(1.0, 1.0), 0.0).is_ok());
    }

    #[test]
    fn test_contexts_are_distinct() {
        let a = SpatialContext::geo(DistanceUnits::Kilometers);
        let b = SpatialContext::geo(DistanceUnits::Kilometers);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_new_rejects_empty_bounds() {
        let err = SpatialContext::new(DistanceUnits::Cartesian, Rectangle::new(0.0, 0.0, 0.0, 1.0));
        assert!(matches!(err, Err(SpatialError::InvalidArgument(_))));
    }
}
