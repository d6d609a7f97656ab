use serde::{Deserialize, Serialize};
use std::fmt;

/// The topological relation of one shape (A) to another (B).
///
/// `Contains` means A ⊇ B and `Within` means A ⊆ B. `Outside` and
/// `Intersects` are symmetric.
///
/// # Examples
///
/// ```
/// use geoprefix_types::relation::IntersectCase;
///
/// assert_eq!(IntersectCase::Within.transpose(), IntersectCase::Contains);
/// assert_eq!(IntersectCase::Outside.transpose(), IntersectCase::Outside);
/// assert!(IntersectCase::Within.intersects());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntersectCase {
    /// The shapes share no point.
    Outside,
    /// The shapes overlap but neither contains the other.
    Intersects,
    /// A contains B.
    Contains,
    /// A is within B.
    Within,
}

impl IntersectCase {
    /// The relation of B to A, given the relation of A to B.
    pub fn transpose(self) -> Self {
        match self {
            IntersectCase::Contains => IntersectCase::Within,
            IntersectCase::Within => IntersectCase::Contains,
            other => other,
        }
    }

    /// True for every relation except `Outside`.
    pub fn intersects(self) -> bool {
        self != IntersectCase::Outside
    }
}

impl fmt::Display for IntersectCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntersectCase::Outside => "OUTSIDE",
            IntersectCase::Intersects => "INTERSECTS",
            IntersectCase::Contains => "CONTAINS",
            IntersectCase::Within => "WITHIN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_is_involution() {
        for case in [
            IntersectCase::Outside,
            IntersectCase::Intersects,
            IntersectCase::Contains,
            IntersectCase::Within,
        ] {
            assert_eq!(case.transpose().transpose(), case);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&IntersectCase::Intersects).unwrap();
        assert_eq!(json, "\"INTERSECTS\"");
        let back: IntersectCase = serde_json::from_str("\"WITHIN\"").unwrap();
        assert_eq!(back, IntersectCase::Within);
    }
}
