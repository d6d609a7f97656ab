//! Distance calculations between points and point-radius bounding boxes.
//!
//! Geodetic contexts measure great-circle distance with the haversine formula
//! on a sphere whose radius is expressed in the context's units, so distances
//! come back in kilometers or miles. Cartesian contexts use plain Euclidean
//! distance in coordinate units.

use crate::shape::Rectangle;
use geo::{Distance, HaversineMeasure, Point};
use geoprefix_types::units::DistanceUnits;

/// Distance metric bound to a spatial context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceCalculator {
    /// Planar distance, for projected or abstract coordinates.
    Euclidean,
    /// Great-circle distance on a sphere of the given radius.
    Haversine { radius: f64 },
}

impl DistanceCalculator {
    /// The calculator matching a unit system.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geoprefix::distance::DistanceCalculator;
    /// use geoprefix_types::units::DistanceUnits;
    ///
    /// assert_eq!(
    ///     DistanceCalculator::for_units(DistanceUnits::Cartesian),
    ///     DistanceCalculator::Euclidean
    /// );
    /// ```
    pub fn for_units(units: DistanceUnits) -> Self {
        match units.earth_radius() {
            Some(radius) => DistanceCalculator::Haversine { radius },
            None => DistanceCalculator::Euclidean,
        }
    }

    /// Distance between two points, in context units.
    pub fn distance(&self, from: &Point, to: &Point) -> f64 {
        match self {
            DistanceCalculator::Euclidean => geo::Euclidean.distance(*from, *to),
            DistanceCalculator::Haversine { radius } => {
                HaversineMeasure::new(*radius).distance(*from, *to)
            }
        }
    }

    /// Distance from a point to raw coordinates.
    pub fn distance_xy(&self, from: &Point, x: f64, y: f64) -> f64 {
        self.distance(from, &Point::new(x, y))
    }

    /// The smallest rectangle enclosing every point within `dist` of `center`.
    ///
    /// For geodetic calculators the result may cross the dateline, in which
    /// case `min_x > max_x`. A circle reaching over a pole spans all longitudes.
    pub fn calc_box_by_dist_from_pt(&self, center: &Point, dist: f64) -> Rectangle {
        match self {
            DistanceCalculator::Euclidean => Rectangle::new(
                center.x() - dist,
                center.x() + dist,
                center.y() - dist,
                center.y() + dist,
            ),
            DistanceCalculator::Haversine { radius } => geo_box(center, dist, *radius),
        }
    }
}

fn geo_box(center: &Point, dist: f64, radius: f64) -> Rectangle {
    let angle = dist / radius;
    if angle >= std::f64::consts::PI {
        return Rectangle::new(-180.0, 180.0, -90.0, 90.0);
    }
    let angle_deg = angle.to_degrees();
    let min_y = center.y() - angle_deg;
    let max_y = center.y() + angle_deg;

    // Reaching a pole means every longitude is within range.
    if max_y >= 90.0 || min_y <= -90.0 {
        return Rectangle::new(-180.0, 180.0, min_y.max(-90.0), max_y.min(90.0));
    }

    let ratio = angle.sin() / center.y().to_radians().cos();
    if ratio >= 1.0 {
        return Rectangle::new(-180.0, 180.0, min_y, max_y);
    }
    let lon_delta = ratio.asin().to_degrees();
    if lon_delta >= 180.0 {
        return Rectangle::new(-180.0, 180.0, min_y, max_y);
    }
    Rectangle::new(
        normalize_lon(center.x() - lon_delta),
        normalize_lon(center.x() + lon_delta),
        min_y,
        max_y,
    )
}

/// Wrap a longitude into `[-180, 180]`.
pub fn normalize_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let calc = DistanceCalculator::Euclidean;
        let d = calc.distance(&Point::new(0.0, 0.0), &Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_distance_km() {
        let calc = DistanceCalculator::for_units(DistanceUnits::Kilometers);
        // One degree of latitude is roughly 111.2 km.
        let d = calc.distance(&Point::new(0.0, 0.0), &Point::new(0.0, 1.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_euclidean_box() {
        let calc = DistanceCalculator::Euclidean;
        let r = calc.calc_box_by_dist_from_pt(&Point::new(5.0, 5.0), 2.0);
        assert_eq!(r, Rectangle::new(3.0, 7.0, 3.0, 7.0));
    }

    #[test]
    fn test_geo_box_contains_circle_extent() {
        let calc = DistanceCalculator::for_units(DistanceUnits::Kilometers);
        let center = Point::new(10.0, 45.0);
        let r = calc.calc_box_by_dist_from_pt(&center, 100.0);
        assert!(!r.crosses_dateline());
        // Points due north/east at the radius lie on (or inside) the box.
        let north = Point::new(10.0, 45.0 + (100.0 / DistanceUnits::EARTH_RADIUS_KM).to_degrees());
        assert!(r.contains_xy(north.x(), north.y() - 1e-9));
        assert!(r.min_x() < 10.0 && r.max_x() > 10.0);
        assert!(r.width() > r.height());
    }

    #[test]
    fn test_geo_box_crosses_dateline() {
        let calc = DistanceCalculator::for_units(DistanceUnits::Kilometers);
        let r = calc.calc_box_by_dist_from_pt(&Point::new(179.5, 0.0), 200.0);
        assert!(r.crosses_dateline());
        assert!(r.contains_xy(-179.9, 0.0));
        assert!(r.contains_xy(179.9, 0.0));
    }

    #[test]
    fn test_geo_box_over_pole() {
        let calc = DistanceCalculator::for_units(DistanceUnits::Kilometers);
        let r = calc.calc_box_by_dist_from_pt(&Point::new(0.0, 89.5), 200.0);
        assert_eq!(r.min_x(), -180.0);
        assert_eq!(r.max_x(), 180.0);
        assert_eq!(r.max_y(), 90.0);
    }

    #[test]
    fn test_normalize_lon() {
        assert_eq!(normalize_lon(190.0), -170.0);
        assert_eq!(normalize_lon(-190.0), 170.0);
        assert_eq!(normalize_lon(180.0), 180.0);
    }
}
