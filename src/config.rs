//! Prefix tree configuration
//!
//! A [`GridConfig`] captures everything needed to build a spatial context and
//! a prefix tree, and the indexing defaults of the strategy on top of them.
//! It round-trips through JSON, and through TOML with the `toml` feature.
use serde::de::Error;

use geoprefix_types::units::DistanceUnits;

use crate::args::DEFAULT_DIST_PRECISION;
use crate::io::DEFAULT_MAX_WKB_BYTES;
use crate::prefix::{GeohashPrefixTree, QuadPrefixTree};
use crate::shape::Rectangle;

/// Which prefix tree to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeKind {
    Quad,
    #[default]
    Geohash,
}

impl TreeKind {
    pub const fn default_max_levels(self) -> usize {
        match self {
            TreeKind::Quad => QuadPrefixTree::DEFAULT_MAX_LEVELS,
            TreeKind::Geohash => GeohashPrefixTree::DEFAULT_MAX_LEVELS,
        }
    }

    pub const fn max_levels_possible(self) -> usize {
        match self {
            TreeKind::Quad => QuadPrefixTree::MAX_LEVELS_POSSIBLE,
            TreeKind::Geohash => GeohashPrefixTree::MAX_LEVELS_POSSIBLE,
        }
    }
}

/// Prefix tree and indexing configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    #[serde(default)]
    pub tree: TreeKind,

    /// Tree depth; the tree kind's default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_levels: Option<usize>,

    #[serde(default)]
    pub units: DistanceUnits,

    /// `[min_x, max_x, min_y, max_y]`. Required for cartesian units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_bounds: Option<[f64; 4]>,

    /// Fraction of a shape's size tolerated as error when indexing it
    #[serde(default = "GridConfig::default_dist_err_pct")]
    pub dist_err_pct: f64,

    /// Size budget for stored geometry WKB
    #[serde(default = "GridConfig::default_max_wkb_bytes")]
    pub max_wkb_bytes: usize,

    /// Initial per-document capacity of field cache entries
    #[serde(default = "GridConfig::default_field_values_len")]
    pub default_field_values_len: usize,
}

impl GridConfig {
    const fn default_dist_err_pct() -> f64 {
        DEFAULT_DIST_PRECISION
    }

    const fn default_max_wkb_bytes() -> usize {
        DEFAULT_MAX_WKB_BYTES
    }

    const fn default_field_values_len() -> usize {
        2
    }

    pub fn with_tree(mut self, tree: TreeKind) -> Self {
        self.tree = tree;
        self
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = Some(max_levels);
        self
    }

    pub fn with_units(mut self, units: DistanceUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_world_bounds(mut self, bounds: Rectangle) -> Self {
        self.world_bounds = Some([bounds.min_x(), bounds.max_x(), bounds.min_y(), bounds.max_y()]);
        self
    }

    pub fn with_dist_err_pct(mut self, pct: f64) -> Self {
        self.dist_err_pct = pct;
        self
    }

    pub fn with_max_wkb_bytes(mut self, bytes: usize) -> Self {
        self.max_wkb_bytes = bytes;
        self
    }

    pub fn with_default_field_values_len(mut self, len: usize) -> Self {
        assert!(len > 0, "Default field values length must be greater than zero");
        self.default_field_values_len = len;
        self
    }

    /// Effective tree depth.
    pub fn max_levels(&self) -> usize {
        self.max_levels
            .unwrap_or_else(|| self.tree.default_max_levels())
    }

    pub fn world_rect(&self) -> Option<Rectangle> {
        self.world_bounds
            .map(|[min_x, max_x, min_y, max_y]| Rectangle::new(min_x, max_x, min_y, max_y))
    }

    pub fn validate(&self) -> Result<(), String> {
        let levels = self.max_levels();
        let possible = self.tree.max_levels_possible();
        if levels == 0 || levels > possible {
            return Err(format!(
                "max_levels must be between 1 and {} for {:?} trees, got {}",
                possible, self.tree, levels
            ));
        }

        if self.tree == TreeKind::Geohash && !self.units.is_geo() {
            return Err("Geohash trees require geodetic units".to_string());
        }

        match self.world_rect() {
            Some(r) => {
                let finite = [r.min_x(), r.max_x(), r.min_y(), r.max_y()]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite || !r.has_size() {
                    return Err(format!(
                        "world_bounds must be finite with min < max on both axes: {:?}",
                        self.world_bounds
                    ));
                }
            }
            None if !self.units.is_geo() => {
                return Err("Cartesian units require world_bounds".to_string());
            }
            None => {}
        }

        if !(0.0..=0.5).contains(&self.dist_err_pct) {
            return Err(format!(
                "dist_err_pct must be between 0 and 0.5, got {}",
                self.dist_err_pct
            ));
        }

        if self.max_wkb_bytes == 0 {
            return Err("max_wkb_bytes must be greater than zero".to_string());
        }

        if self.default_field_values_len == 0 {
            return Err("default_field_values_len must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: GridConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: GridConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tree: TreeKind::default(),
            max_levels: None,
            units: DistanceUnits::default(),
            world_bounds: None,
            dist_err_pct: Self::default_dist_err_pct(),
            max_wkb_bytes: Self::default_max_wkb_bytes(),
            default_field_values_len: Self::default_field_values_len(),
        }
    }
}
