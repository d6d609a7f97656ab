use serde::{Deserialize, Serialize};

/// Units used for distances (and, implicitly, for coordinates) in a spatial context.
///
/// Kilometers and miles imply geodetic coordinates in degrees; cartesian means
/// planar coordinates where distances are in the same units as the axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnits {
    #[default]
    Kilometers,
    Miles,
    Cartesian,
}

impl DistanceUnits {
    /// Mean earth radius in kilometers.
    pub const EARTH_RADIUS_KM: f64 = 6371.0087714;
    /// Mean earth radius in miles.
    pub const EARTH_RADIUS_MILES: f64 = 3958.761;

    /// The earth radius expressed in these units, `None` for cartesian.
    pub fn earth_radius(self) -> Option<f64> {
        match self {
            DistanceUnits::Kilometers => Some(Self::EARTH_RADIUS_KM),
            DistanceUnits::Miles => Some(Self::EARTH_RADIUS_MILES),
            DistanceUnits::Cartesian => None,
        }
    }

    /// Whether coordinates are longitude/latitude degrees.
    pub fn is_geo(self) -> bool {
        self != DistanceUnits::Cartesian
    }

    /// Parse a unit name as found in configuration files (`km`, `miles`, `cartesian`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Some(DistanceUnits::Kilometers),
            "mi" | "miles" => Some(DistanceUnits::Miles),
            "cartesian" | "planar" => Some(DistanceUnits::Cartesian),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earth_radius() {
        assert_eq!(
            DistanceUnits::Kilometers.earth_radius(),
            Some(DistanceUnits::EARTH_RADIUS_KM)
        );
        assert!(DistanceUnits::Cartesian.earth_radius().is_none());
        assert!(!DistanceUnits::Cartesian.is_geo());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DistanceUnits::from_name("KM"), Some(DistanceUnits::Kilometers));
        assert_eq!(DistanceUnits::from_name(" miles "), Some(DistanceUnits::Miles));
        assert_eq!(DistanceUnits::from_name("furlongs"), None);
    }
}
