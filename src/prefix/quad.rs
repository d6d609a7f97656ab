use std::sync::Arc;

use geo::Point;
use serde::Serialize;

use super::{Cell, SpatialPrefixTree};
use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::shape::Rectangle;

const ALPHABET: &[u8] = b"ABCD";

/// Levels beyond this warn: cell counts get out of hand for indexing.
const DEEP_TREE_WARN: usize = 26;

/// One row of a quad tree's level table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: usize,
    pub width: f64,
    pub height: f64,
    /// Cells along one side of the world.
    pub side: u64,
    /// Cells covering the whole world.
    pub cells: u128,
}

/// A 4-ary prefix tree over arbitrary bounds.
///
/// Each level halves the cell width and height. Children are ordered in
/// Z-order: `A` upper-left, `B` upper-right, `C` lower-left, `D` lower-right.
#[derive(Debug, Clone)]
pub struct QuadPrefixTree {
    ctx: Arc<SpatialContext>,
    bounds: Rectangle,
    max_levels: usize,
    // Indexed by level; entry 0 is the world.
    level_w: Vec<f64>,
    level_h: Vec<f64>,
}

impl QuadPrefixTree {
    pub const MAX_LEVELS_POSSIBLE: usize = 50;
    pub const DEFAULT_MAX_LEVELS: usize = 12;

    /// A tree over the context's world bounds.
    pub fn new(ctx: Arc<SpatialContext>, max_levels: usize) -> Result<Self> {
        let bounds = ctx.world_bounds();
        Self::with_bounds(ctx, bounds, max_levels)
    }

    /// A tree over explicit bounds.
    pub fn with_bounds(ctx: Arc<SpatialContext>, bounds: Rectangle, max_levels: usize) -> Result<Self> {
        if max_levels == 0 || max_levels > Self::MAX_LEVELS_POSSIBLE {
            return Err(SpatialError::InvalidArgument(format!(
                "quad tree max levels must be in 1..={}, got {}",
                Self::MAX_LEVELS_POSSIBLE,
                max_levels
            )));
        }
        if !bounds.has_size() {
            return Err(SpatialError::InvalidArgument(format!(
                "quad tree bounds must have area and not wrap: {:?}",
                bounds
            )));
        }
        if max_levels > DEEP_TREE_WARN {
            log::warn!(
                "quad tree with {} levels; leaf cells will be tiny and numerous",
                max_levels
            );
        }

        let mut level_w = Vec::with_capacity(max_levels + 1);
        let mut level_h = Vec::with_capacity(max_levels + 1);
        level_w.push(bounds.width());
        level_h.push(bounds.height());
        for i in 1..=max_levels {
            level_w.push(level_w[i - 1] / 2.0);
            level_h.push(level_h[i - 1] / 2.0);
        }
        log::debug!(
            "quad tree: bounds={:?} max_levels={} leaf={}x{}",
            bounds,
            max_levels,
            level_w[max_levels],
            level_h[max_levels]
        );

        Ok(Self {
            ctx,
            bounds,
            max_levels,
            level_w,
            level_h,
        })
    }

    /// Cells along one side of the world at `level`.
    pub fn level_side(&self, level: usize) -> u64 {
        1u64 << level.min(63)
    }

    /// Cells covering the world at `level`.
    pub fn level_cells(&self, level: usize) -> u128 {
        1u128 << (2 * level).min(127)
    }

    /// The per-level table, one row per level from 1 to the max.
    pub fn level_info(&self) -> Vec<LevelInfo> {
        (1..=self.max_levels)
            .map(|level| LevelInfo {
                level,
                width: self.level_w[level],
                height: self.level_h[level],
                side: self.level_side(level),
                cells: self.level_cells(level),
            })
            .collect()
    }
}

impl SpatialPrefixTree for QuadPrefixTree {
    fn name(&self) -> &'static str {
        "quad"
    }

    fn context(&self) -> &Arc<SpatialContext> {
        &self.ctx
    }

    fn max_levels(&self) -> usize {
        self.max_levels
    }

    fn world_bounds(&self) -> Rectangle {
        self.bounds
    }

    fn level_width(&self, level: usize) -> f64 {
        self.level_w[level.min(self.max_levels)]
    }

    fn level_height(&self, level: usize) -> f64 {
        self.level_h[level.min(self.max_levels)]
    }

    fn alphabet(&self) -> &'static [u8] {
        ALPHABET
    }

    fn child_rect(&self, parent: &Rectangle, level: usize, digit: usize) -> Rectangle {
        let w = self.level_width(level);
        let h = self.level_height(level);
        let (x, y) = match digit {
            0 => (parent.min_x(), parent.min_y() + h),
            1 => (parent.min_x() + w, parent.min_y() + h),
            2 => (parent.min_x(), parent.min_y()),
            _ => (parent.min_x() + w, parent.min_y()),
        };
        Rectangle::new(x, x + w, y, y + h)
    }

    fn cell_for_point(&self, point: &Point, level: usize) -> Result<Cell> {
        if level > self.max_levels {
            return Err(SpatialError::InvalidArgument(format!(
                "level {} exceeds max levels {}",
                level, self.max_levels
            )));
        }
        if !self.bounds.contains_xy(point.x(), point.y()) {
            return Err(SpatialError::InvalidArgument(format!(
                "point {:?} is outside the tree bounds",
                point
            )));
        }
        let mut token = String::with_capacity(level);
        let mut rect = self.bounds;
        for next in 1..=level {
            let w = self.level_width(next);
            let h = self.level_height(next);
            // Points on a midline go to the first quadrant in Z-order.
            let top = point.y() >= rect.min_y() + h;
            let left = point.x() <= rect.min_x() + w;
            let digit = match (top, left) {
                (true, true) => 0,
                (true, false) => 1,
                (false, true) => 2,
                (false, false) => 3,
            };
            token.push(ALPHABET[digit] as char);
            rect = self.child_rect(&rect, next, digit);
        }
        Ok(Cell::new(token, rect, self.max_levels))
    }
}
