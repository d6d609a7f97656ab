//! Prefix tree builder
//!
//! Builds a [`SpatialContext`] and a prefix tree together, either from a
//! [`GridConfig`] or through fluent setters.

use std::sync::Arc;

use geoprefix_types::units::DistanceUnits;

use crate::config::{GridConfig, TreeKind};
use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::prefix::{GeohashPrefixTree, QuadPrefixTree, SpatialPrefixTree};
use crate::shape::Rectangle;
use crate::strategy::PrefixTreeStrategy;

/// A shared context and the tree built over it.
pub type BuiltTree = (Arc<SpatialContext>, Arc<dyn SpatialPrefixTree>);

/// Builder for a spatial context and prefix tree.
#[derive(Debug, Clone)]
pub struct PrefixTreeBuilder {
    config: GridConfig,
}

impl PrefixTreeBuilder {
    /// Start from the default configuration: a geohash tree over kilometers.
    pub fn new() -> Self {
        Self {
            config: GridConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tree(mut self, tree: TreeKind) -> Self {
        self.config.tree = tree;
        self
    }

    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.config.max_levels = Some(max_levels);
        self
    }

    pub fn units(mut self, units: DistanceUnits) -> Self {
        self.config.units = units;
        self
    }

    pub fn world_bounds(mut self, bounds: Rectangle) -> Self {
        self.config = self.config.with_world_bounds(bounds);
        self
    }

    pub fn dist_err_pct(mut self, pct: f64) -> Self {
        self.config.dist_err_pct = pct;
        self
    }

    /// Build straight from a configuration.
    pub fn from_config(config: GridConfig) -> Result<BuiltTree> {
        Self::new().config(config).build()
    }

    /// Validate the configuration and build the context and tree.
    pub fn build(self) -> Result<BuiltTree> {
        self.config.validate().map_err(SpatialError::InvalidArgument)?;

        let ctx = Arc::new(match self.config.world_rect() {
            Some(bounds) => SpatialContext::new(self.config.units, bounds)?,
            None => SpatialContext::geo(self.config.units),
        });

        let max_levels = self.config.max_levels();
        let tree: Arc<dyn SpatialPrefixTree> = match self.config.tree {
            TreeKind::Quad => Arc::new(QuadPrefixTree::new(Arc::clone(&ctx), max_levels)?),
            TreeKind::Geohash => Arc::new(GeohashPrefixTree::new(Arc::clone(&ctx), max_levels)?),
        };

        log::debug!(
            "Built {} tree: max_levels={} units={:?} world={:?}",
            tree.name(),
            max_levels,
            ctx.units(),
            ctx.world_bounds()
        );
        Ok((ctx, tree))
    }

    /// Build the tree and wrap it in an indexing strategy carrying the
    /// configured precision and field cache defaults.
    pub fn build_strategy(self) -> Result<PrefixTreeStrategy> {
        let config = self.config.clone();
        let (_, tree) = self.build()?;
        Ok(PrefixTreeStrategy::new(tree)
            .with_dist_err_pct(config.dist_err_pct)
            .with_default_field_values_len(config.default_field_values_len)
            .with_max_wkb_bytes(config.max_wkb_bytes))
    }
}

impl Default for PrefixTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default_geohash() {
        let (ctx, tree) = PrefixTreeBuilder::new().build().unwrap();
        assert!(ctx.is_geo());
        assert_eq!(tree.name(), "geohash");
        assert_eq!(tree.max_levels(), 11);
        assert!(Arc::ptr_eq(tree.context(), &ctx));
    }

    #[test]
    fn test_builder_cartesian_quad() {
        let (ctx, tree) = PrefixTreeBuilder::new()
            .tree(TreeKind::Quad)
            .units(DistanceUnits::Cartesian)
            .world_bounds(Rectangle::new(0.0, 10.0, 0.0, 10.0))
            .max_levels(4)
            .build()
            .unwrap();
        assert!(!ctx.is_geo());
        assert_eq!(tree.name(), "quad");
        assert_eq!(tree.world_bounds(), Rectangle::new(0.0, 10.0, 0.0, 10.0));
        assert_eq!(tree.level_width(1), 5.0);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let err = PrefixTreeBuilder::new()
            .units(DistanceUnits::Cartesian)
            .build()
            .unwrap_err();
        assert!(matches!(err, SpatialError::InvalidArgument(_)));

        let err = PrefixTreeBuilder::new().max_levels(0).build().unwrap_err();
        assert!(matches!(err, SpatialError::InvalidArgument(_)));
    }

    #[test]
    fn test_from_config() {
        let config = GridConfig::from_json(r#"{"tree": "quad", "max_levels": 3}"#).unwrap();
        let (_, tree) = PrefixTreeBuilder::from_config(config).unwrap();
        assert_eq!(tree.max_levels(), 3);
        assert_eq!(tree.world_bounds(), Rectangle::new(-180.0, 180.0, -90.0, 90.0));
    }

    #[test]
    fn test_build_strategy_carries_settings() {
        let strategy = PrefixTreeBuilder::new()
            .dist_err_pct(0.1)
            .build_strategy()
            .unwrap();
        assert_eq!(strategy.dist_err_pct(), 0.1);
        assert_eq!(strategy.tree().name(), "geohash");
    }
}
