use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A spatial predicate a query can ask for, along with its area requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialOperation {
    /// Bounding box of the query shape intersects the indexed shape.
    BBoxIntersects,
    /// Indexed shape is within the bounding box of the query shape.
    BBoxWithin,
    Contains,
    Intersects,
    IsEqualTo,
    IsDisjointTo,
    IsWithin,
    Overlaps,
    SimilarTo,
}

impl SpatialOperation {
    pub const ALL: [SpatialOperation; 9] = [
        SpatialOperation::BBoxIntersects,
        SpatialOperation::BBoxWithin,
        SpatialOperation::Contains,
        SpatialOperation::Intersects,
        SpatialOperation::IsEqualTo,
        SpatialOperation::IsDisjointTo,
        SpatialOperation::IsWithin,
        SpatialOperation::Overlaps,
        SpatialOperation::SimilarTo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpatialOperation::BBoxIntersects => "BBoxIntersects",
            SpatialOperation::BBoxWithin => "BBoxWithin",
            SpatialOperation::Contains => "Contains",
            SpatialOperation::Intersects => "Intersects",
            SpatialOperation::IsEqualTo => "IsEqualTo",
            SpatialOperation::IsDisjointTo => "IsDisjointTo",
            SpatialOperation::IsWithin => "IsWithin",
            SpatialOperation::Overlaps => "Overlaps",
            SpatialOperation::SimilarTo => "SimilarTo",
        }
    }

    /// Whether a relevance score derived from this operation means anything.
    pub fn is_score_meaningful(self) -> bool {
        !matches!(
            self,
            SpatialOperation::IsEqualTo | SpatialOperation::IsDisjointTo
        )
    }

    /// Whether the indexed shape must have area.
    pub fn is_source_needs_area(self) -> bool {
        self == SpatialOperation::Contains
    }

    /// Whether the query shape must have area.
    pub fn is_target_needs_area(self) -> bool {
        matches!(self, SpatialOperation::IsWithin | SpatialOperation::Overlaps)
    }

    /// Look up an operation by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for SpatialOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no known operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperation(pub String);

impl fmt::Display for UnknownOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown spatial operation: {}", self.0)
    }
}

impl std::error::Error for UnknownOperation {}

impl FromStr for SpatialOperation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for op in SpatialOperation::ALL {
            assert_eq!(op.name().parse::<SpatialOperation>().unwrap(), op);
        }
        assert_eq!(
            SpatialOperation::from_name("iswithin"),
            Some(SpatialOperation::IsWithin)
        );
        assert!("XXXX".parse::<SpatialOperation>().is_err());
    }

    #[test]
    fn test_area_requirements() {
        assert!(SpatialOperation::IsWithin.is_target_needs_area());
        assert!(!SpatialOperation::Intersects.is_target_needs_area());
        assert!(SpatialOperation::Contains.is_source_needs_area());
        assert!(!SpatialOperation::IsDisjointTo.is_score_meaningful());
    }
}
