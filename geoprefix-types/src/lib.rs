//! # geoprefix-types
//!
//! Core value types shared by the geoprefix spatial prefix trees and their callers.
//!
//! - **Relations**: `IntersectCase`, the topological relation between two shapes
//! - **Units**: `DistanceUnits`, the coordinate/distance units of a spatial context
//! - **Operations**: `SpatialOperation`, the named predicates a spatial query can ask for
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use geoprefix_types::relation::IntersectCase;
//! use geoprefix_types::units::DistanceUnits;
//!
//! assert_eq!(IntersectCase::Contains.transpose(), IntersectCase::Within);
//! assert!(DistanceUnits::Kilometers.is_geo());
//! ```

pub mod operation;
pub mod relation;
pub mod units;
