use std::sync::Arc;

use geo::{Coord, Point};

use super::{Cell, SpatialPrefixTree};
use crate::context::{GEO_WORLD, SpatialContext};
use crate::error::{Result, SpatialError};
use crate::shape::Rectangle;

const BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";
const BITS_PER_SYMBOL: usize = 5;

/// A 32-ary prefix tree whose tokens are standard geohashes.
///
/// Each symbol carries five bits interleaving longitude and latitude,
/// longitude first. Only geodetic contexts are supported.
#[derive(Debug, Clone)]
pub struct GeohashPrefixTree {
    ctx: Arc<SpatialContext>,
    max_levels: usize,
    level_w: Vec<f64>,
    level_h: Vec<f64>,
}

impl GeohashPrefixTree {
    /// Longest geohash the point encoder supports.
    pub const MAX_LEVELS_POSSIBLE: usize = 12;
    pub const DEFAULT_MAX_LEVELS: usize = 11;

    pub fn new(ctx: Arc<SpatialContext>, max_levels: usize) -> Result<Self> {
        if !ctx.is_geo() {
            return Err(SpatialError::InvalidArgument(
                "geohash trees need a geodetic context".to_string(),
            ));
        }
        if max_levels == 0 || max_levels > Self::MAX_LEVELS_POSSIBLE {
            return Err(SpatialError::InvalidArgument(format!(
                "geohash max levels must be in 1..={}, got {}",
                Self::MAX_LEVELS_POSSIBLE,
                max_levels
            )));
        }
        let (level_w, level_h) = (0..=max_levels)
            .map(|level| {
                let bits = level * BITS_PER_SYMBOL;
                let lon_bits = bits.div_ceil(2) as i32;
                let lat_bits = (bits / 2) as i32;
                (
                    GEO_WORLD.width() / 2f64.powi(lon_bits),
                    GEO_WORLD.height() / 2f64.powi(lat_bits),
                )
            })
            .unzip();
        log::debug!("geohash tree: max_levels={}", max_levels);
        Ok(Self {
            ctx,
            max_levels,
            level_w,
            level_h,
        })
    }

    /// Smallest level whose cells fit within `width` x `height`.
    pub fn lookup_level_for_size(&self, width: f64, height: f64) -> usize {
        (1..=self.max_levels)
            .find(|&level| self.level_w[level] <= width && self.level_h[level] <= height)
            .unwrap_or(self.max_levels)
    }
}

impl SpatialPrefixTree for GeohashPrefixTree {
    fn name(&self) -> &'static str {
        "geohash"
    }

    fn context(&self) -> &Arc<SpatialContext> {
        &self.ctx
    }

    fn max_levels(&self) -> usize {
        self.max_levels
    }

    fn world_bounds(&self) -> Rectangle {
        GEO_WORLD
    }

    fn level_width(&self, level: usize) -> f64 {
        self.level_w[level.min(self.max_levels)]
    }

    fn level_height(&self, level: usize) -> f64 {
        self.level_h[level.min(self.max_levels)]
    }

    fn alphabet(&self) -> &'static [u8] {
        BASE32
    }

    fn child_rect(&self, parent: &Rectangle, level: usize, digit: usize) -> Rectangle {
        let first_bit = (level - 1) * BITS_PER_SYMBOL;
        let (mut x, mut y) = (parent.min_x(), parent.min_y());
        let (mut w, mut h) = (self.level_width(level - 1), self.level_height(level - 1));
        for i in 0..BITS_PER_SYMBOL {
            let set = (digit >> (BITS_PER_SYMBOL - 1 - i)) & 1 == 1;
            if (first_bit + i) % 2 == 0 {
                w /= 2.0;
                if set {
                    x += w;
                }
            } else {
                h /= 2.0;
                if set {
                    y += h;
                }
            }
        }
        Rectangle::new(x, x + w, y, y + h)
    }

    fn cell_for_point(&self, point: &Point, level: usize) -> Result<Cell> {
        if level > self.max_levels {
            return Err(SpatialError::InvalidArgument(format!(
                "level {} exceeds max levels {}",
                level, self.max_levels
            )));
        }
        if !GEO_WORLD.contains_xy(point.x(), point.y()) {
            return Err(SpatialError::InvalidArgument(format!(
                "point {:?} is outside the world",
                point
            )));
        }
        if level == 0 {
            return Ok(self.world_cell());
        }
        // The encoder maps the upper edges back to the lower ones.
        let coord = Coord {
            x: if point.x() >= GEO_WORLD.max_x() {
                GEO_WORLD.max_x().next_down()
            } else {
                point.x()
            },
            y: if point.y() >= GEO_WORLD.max_y() {
                GEO_WORLD.max_y().next_down()
            } else {
                point.y()
            },
        };
        let hash = ::geohash::encode(coord, level)
            .map_err(|e| SpatialError::InvalidArgument(e.to_string()))?;
        self.cell_from_token(&hash)
    }
}
