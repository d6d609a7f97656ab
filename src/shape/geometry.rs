use std::hash::{Hash, Hasher};

use geo::algorithm::relate::IntersectionMatrix;
use geo::{Area, BoundingRect, Centroid, Geometry, Intersects, Point, Relate};
use geoprefix_types::relation::IntersectCase;

use super::Rectangle;
use crate::error::{Result, SpatialError};

/// A general geometry (polygon, line, collection...) backed by `geo`.
///
/// Equality is exact coordinate equality of the wrapped geometry, not
/// topological equality. The hash only looks at the envelope, which equal
/// geometries always share.
#[derive(Debug, Clone)]
pub struct GeometryShape {
    geom: Geometry<f64>,
    envelope: Rectangle,
    has_area: bool,
}

impl GeometryShape {
    pub fn new(geom: Geometry<f64>) -> Result<Self> {
        let envelope = geom
            .bounding_rect()
            .map(Rectangle::from)
            .ok_or_else(|| SpatialError::InvalidShape("empty geometry".to_string()))?;
        let has_area = !matches!(
            geom,
            Geometry::Point(_)
                | Geometry::MultiPoint(_)
                | Geometry::Line(_)
                | Geometry::LineString(_)
                | Geometry::MultiLineString(_)
        );
        Ok(Self {
            geom,
            envelope,
            has_area,
        })
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geom
    }

    pub fn into_geometry(self) -> Geometry<f64> {
        self.geom
    }

    pub fn bounding_box(&self) -> Rectangle {
        self.envelope
    }

    pub fn has_area(&self) -> bool {
        self.has_area
    }

    pub fn area(&self) -> f64 {
        self.geom.unsigned_area()
    }

    pub fn center(&self) -> Point {
        self.geom
            .centroid()
            .unwrap_or_else(|| self.envelope.center())
    }

    /// Relation of this geometry to a rectangle with size.
    pub fn relate_rect(&self, r: &Rectangle) -> Result<IntersectCase> {
        if r.crosses_dateline() {
            return Err(SpatialError::UnsupportedOperation(
                "geometry relation to a dateline-crossing rectangle".to_string(),
            ));
        }
        require_size(r)?;
        if self.envelope.relate_rect(r) == IntersectCase::Outside {
            return Ok(IntersectCase::Outside);
        }
        let Some(query) = r.to_geo_rect() else {
            return Ok(IntersectCase::Outside);
        };
        if !query.intersects(&self.geom) {
            return Ok(IntersectCase::Outside);
        }
        Ok(classify(self.geom.relate(&query)))
    }

    /// Relation of this geometry to another geometry whose envelope has size.
    pub fn relate_geometry(&self, other: &GeometryShape) -> Result<IntersectCase> {
        require_size(&other.envelope)?;
        if self.envelope.relate_rect(&other.envelope) == IntersectCase::Outside {
            return Ok(IntersectCase::Outside);
        }
        if !other.geom.intersects(&self.geom) {
            return Ok(IntersectCase::Outside);
        }
        Ok(classify(self.geom.relate(&other.geom)))
    }
}

fn require_size(r: &Rectangle) -> Result<()> {
    if r.has_size() {
        Ok(())
    } else {
        Err(SpatialError::InvalidArgument(
            "the query shape must cover some area (not a point or line)".to_string(),
        ))
    }
}

fn classify(matrix: IntersectionMatrix) -> IntersectCase {
    // The intersects test above already proved the pair is not disjoint.
    debug_assert!(!matrix.is_disjoint(), "intersecting shapes related as disjoint");
    if matrix.is_covers() {
        IntersectCase::Contains
    } else if matrix.is_coveredby() {
        IntersectCase::Within
    } else {
        IntersectCase::Intersects
    }
}

impl PartialEq for GeometryShape {
    fn eq(&self, other: &Self) -> bool {
        self.geom == other.geom
    }
}

impl Hash for GeometryShape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let e = &self.envelope;
        for v in [e.min_x(), e.max_x(), e.min_y(), e.max_y()] {
            v.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, polygon};

    fn square(min: f64, max: f64) -> GeometryShape {
        GeometryShape::new(Geometry::Polygon(polygon![
            (x: min, y: min),
            (x: max, y: min),
            (x: max, y: max),
            (x: min, y: max),
            (x: min, y: min),
        ]))
        .unwrap()
    }

    #[test]
    fn test_geometry_vs_rect() {
        let g = square(0.0, 10.0);
        assert_eq!(
            g.relate_rect(&Rectangle::new(2.0, 4.0, 2.0, 4.0)).unwrap(),
            IntersectCase::Contains
        );
        assert_eq!(
            g.relate_rect(&Rectangle::new(-5.0, 15.0, -5.0, 15.0)).unwrap(),
            IntersectCase::Within
        );
        assert_eq!(
            g.relate_rect(&Rectangle::new(5.0, 15.0, 5.0, 15.0)).unwrap(),
            IntersectCase::Intersects
        );
        assert_eq!(
            g.relate_rect(&Rectangle::new(20.0, 30.0, 20.0, 30.0)).unwrap(),
            IntersectCase::Outside
        );
    }

    #[test]
    fn test_triangle_envelope_overlap_but_outside() {
        let tri = GeometryShape::new(Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ]))
        .unwrap();
        // Inside the envelope, beyond the hypotenuse.
        let r = Rectangle::new(8.0, 9.0, 8.0, 9.0);
        assert_eq!(tri.relate_rect(&r).unwrap(), IntersectCase::Outside);
    }

    #[test]
    fn test_requires_area() {
        let g = square(0.0, 10.0);
        let err = g.relate_rect(&Rectangle::new(1.0, 1.0, 1.0, 5.0)).unwrap_err();
        assert!(matches!(err, SpatialError::InvalidArgument(_)));
    }

    #[test]
    fn test_line_has_no_area() {
        let line = GeometryShape::new(Geometry::LineString(LineString::from(vec![
            (0.0, 0.0),
            (1.0, 1.0),
        ])))
        .unwrap();
        assert!(!line.has_area());
        assert!(square(0.0, 1.0).has_area());
    }

    #[test]
    fn test_self_relation_and_equality() {
        let a = square(0.0, 10.0);
        let b = square(0.0, 10.0);
        assert_eq!(a, b);
        assert_eq!(a.relate_geometry(&b).unwrap(), IntersectCase::Contains);
        assert_ne!(a, square(0.0, 11.0));
    }
}
