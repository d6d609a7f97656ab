//! Hierarchical spatial prefix trees for indexing shapes as terms.
//!
//! Shapes are approximated by cells of a quad tree or geohash tree; each cell
//! is addressed by a short token that a search engine can index like a word.
//!
//! ```rust
//! use geoprefix::prelude::*;
//!
//! let strategy = PrefixTreeBuilder::new()
//!     .tree(TreeKind::Geohash)
//!     .max_levels(6)
//!     .build_strategy()?;
//!
//! let ctx = strategy.tree().context().clone();
//! let tokens = strategy.create_field_tokens(&ctx.read_shape("-74.006 40.7128")?)?;
//! assert_eq!(tokens.last().map(String::as_str), Some("dr5reg"));
//!
//! let args = SpatialArgs::parse("Intersects(-74.1 40.7 -74.0 40.8)", &ctx)?;
//! let query = strategy.query_tokens(&args)?;
//! assert!(!query.is_empty());
//! # Ok::<(), geoprefix::SpatialError>(())
//! ```

pub mod args;
pub mod builder;
pub mod cache;
pub mod config;
pub mod context;
pub mod distance;
pub mod error;
pub mod io;
pub mod prefix;
pub mod shape;
pub mod strategy;

pub use args::SpatialArgs;
pub use builder::{BuiltTree, PrefixTreeBuilder};
pub use cache::{
    CachedDistanceValueSource, MemorySegment, PointPrefixTreeShapeReader, SegmentId,
    SegmentTerms, ShapeFieldCache, ShapeFieldCacheProvider, ShapeReader,
};
pub use config::{GridConfig, TreeKind};
pub use context::SpatialContext;
pub use distance::DistanceCalculator;
pub use error::{Result, SpatialError};
pub use prefix::{Cell, GeohashPrefixTree, QuadPrefixTree, SpatialPrefixTree};
pub use shape::{Circle, GeometryShape, Rectangle, Shape};
pub use strategy::PrefixTreeStrategy;

pub use geoprefix_types::operation::SpatialOperation;
pub use geoprefix_types::relation::IntersectCase;
pub use geoprefix_types::units::DistanceUnits;

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{PrefixTreeBuilder, Result, SpatialError};

    pub use crate::{GridConfig, TreeKind};

    pub use crate::{GeohashPrefixTree, QuadPrefixTree, SpatialPrefixTree};

    pub use crate::{Cell, Circle, Rectangle, Shape, SpatialContext};

    pub use crate::{PrefixTreeStrategy, SpatialArgs};

    pub use crate::{DistanceUnits, IntersectCase, SpatialOperation};

    pub use geo::Point;

    pub use std::sync::Arc;
}
