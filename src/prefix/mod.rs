//! Hierarchical spatial prefix trees.
//!
//! A prefix tree recursively subdivides the world into cells addressed by
//! tokens; a child's token is its parent's token plus one symbol. Two trees
//! are provided:
//!
//! - [`QuadPrefixTree`]: 4-ary, symbols `A B C D` in Z-order over any bounds
//! - [`GeohashPrefixTree`]: 32-ary, base-32 geohash symbols over lon/lat
//!
//! Shapes resolve into a deterministic, pre-ordered list of cells (parents
//! before children, siblings in symbol order) suitable for indexing as terms.
//!
//! ```rust
//! use std::sync::Arc;
//! use geoprefix::context::SpatialContext;
//! use geoprefix::prefix::{QuadPrefixTree, SpatialPrefixTree};
//! use geoprefix::shape::{Rectangle, Shape};
//!
//! let ctx = Arc::new(SpatialContext::cartesian(Rectangle::new(0.0, 10.0, 0.0, 10.0)));
//! let tree = QuadPrefixTree::new(ctx, 2)?;
//! let cells = tree.get_cells(&Shape::Point(geo::Point::new(3.0, 3.0)), 2, false)?;
//! assert_eq!(cells[0].token(), "CB");
//! # Ok::<(), geoprefix::SpatialError>(())
//! ```

mod cell;
mod geohash;
mod quad;

pub use cell::{Cell, cells_to_tokens, parse_tokens};
pub use geohash::GeohashPrefixTree;
pub use quad::{LevelInfo, QuadPrefixTree};

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use geo::Point;
use geoprefix_types::relation::IntersectCase;

use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::shape::{Rectangle, Shape};

/// Common behaviour of the quad and geohash trees.
///
/// Implementors describe the geometry of one subdivision step; traversal,
/// token decoding and precision selection are shared.
pub trait SpatialPrefixTree: Debug + Send + Sync {
    /// Short name of the tree kind, e.g. `"quad"`.
    fn name(&self) -> &'static str;

    fn context(&self) -> &Arc<SpatialContext>;

    /// Deepest level of the tree; leaf tokens have this many symbols.
    fn max_levels(&self) -> usize;

    /// Bounds of the level 0 cell.
    fn world_bounds(&self) -> Rectangle;

    /// Cell width at `level`; level 0 is the whole world.
    fn level_width(&self, level: usize) -> f64;

    fn level_height(&self, level: usize) -> f64;

    /// Token symbols in child order. Decoding is case-insensitive.
    fn alphabet(&self) -> &'static [u8];

    /// Rectangle of the child with symbol index `digit` of a cell at
    /// `level - 1` whose bounds are `parent`.
    fn child_rect(&self, parent: &Rectangle, level: usize, digit: usize) -> Rectangle;

    /// The cell at `level` containing `point`.
    fn cell_for_point(&self, point: &Point, level: usize) -> Result<Cell>;

    fn world_cell(&self) -> Cell {
        Cell::new(String::new(), self.world_bounds(), self.max_levels())
    }

    fn cell_from_token(&self, token: &str) -> Result<Cell> {
        let mut canonical = String::with_capacity(token.len());
        let rect = self.walk_token(token.as_bytes(), &mut canonical)?;
        Ok(Cell::new(canonical, rect, self.max_levels()))
    }

    fn cell_from_bytes(&self, bytes: &[u8]) -> Result<Cell> {
        let mut canonical = String::with_capacity(bytes.len());
        let rect = self.walk_token(bytes, &mut canonical)?;
        Ok(Cell::new(canonical, rect, self.max_levels()))
    }

    /// Decode `bytes` into an existing cell, reusing its token buffer.
    ///
    /// Meant for one thread scanning many terms in a row; the scratch cell
    /// must not be shared while it is being refilled.
    fn read_cell_into(&self, bytes: &[u8], cell: &mut Cell) -> Result<()> {
        cell.token.clear();
        cell.rect = self.walk_token(bytes, &mut cell.token)?;
        cell.shape_rel = None;
        cell.is_leaf = cell.token.len() >= self.max_levels();
        Ok(())
    }

    /// Validate `token`, push its canonical symbols to `canonical` and return
    /// the addressed rectangle.
    fn walk_token(&self, token: &[u8], canonical: &mut String) -> Result<Rectangle> {
        if token.len() > self.max_levels() {
            return Err(SpatialError::InvalidShape(format!(
                "token of length {} exceeds max levels {}",
                token.len(),
                self.max_levels()
            )));
        }
        let alphabet = self.alphabet();
        let mut rect = self.world_bounds();
        for (i, b) in token.iter().enumerate() {
            let digit = alphabet
                .iter()
                .position(|a| a.eq_ignore_ascii_case(b))
                .ok_or_else(|| {
                    SpatialError::InvalidShape(format!(
                        "unexpected symbol {:?} in {} token",
                        *b as char,
                        self.name()
                    ))
                })?;
            canonical.push(alphabet[digit] as char);
            rect = self.child_rect(&rect, i + 1, digit);
        }
        Ok(rect)
    }

    /// Children of `cell` in symbol order; empty for leaves.
    fn sub_cells(&self, cell: &Cell) -> Vec<Cell> {
        let level = cell.level() + 1;
        if level > self.max_levels() {
            return Vec::new();
        }
        self.alphabet()
            .iter()
            .enumerate()
            .map(|(digit, symbol)| {
                let mut token = String::with_capacity(level);
                token.push_str(&cell.token);
                token.push(*symbol as char);
                Cell::new(
                    token,
                    self.child_rect(&cell.rect, level, digit),
                    self.max_levels(),
                )
            })
            .collect()
    }

    /// Resolve `shape` into cells no deeper than `detail_level`.
    ///
    /// Cells fully covered by the shape stop the descent early. With
    /// `include_parents` every intermediate cell visited on the way is also
    /// returned, parents first; the world cell is then the first element.
    fn get_cells(&self, shape: &Shape, detail_level: usize, include_parents: bool) -> Result<Vec<Cell>> {
        if detail_level > self.max_levels() {
            return Err(SpatialError::InvalidArgument(format!(
                "detail level {} exceeds max levels {}",
                detail_level,
                self.max_levels()
            )));
        }
        if let Shape::Point(p) = shape {
            return self.cells_for_point_path(p, detail_level, include_parents);
        }
        let mut out = Vec::new();
        self.collect_cells(self.world_cell(), shape, detail_level, include_parents, &mut out)?;
        Ok(out)
    }

    #[doc(hidden)]
    fn collect_cells(
        &self,
        cell: Cell,
        shape: &Shape,
        detail_level: usize,
        include_parents: bool,
        out: &mut Vec<Cell>,
    ) -> Result<()> {
        let rel = shape.relate_rect(&cell.rect, self.context())?;
        if rel == IntersectCase::Outside {
            return Ok(());
        }
        let level = cell.level();
        let cell = cell.with_rel(rel.transpose());
        if (rel == IntersectCase::Contains && level > 0) || level == detail_level {
            out.push(cell);
            return Ok(());
        }
        let children = self.sub_cells(&cell);
        if include_parents {
            out.push(cell);
        }
        for child in children {
            self.collect_cells(child, shape, detail_level, include_parents, out)?;
        }
        Ok(())
    }

    #[doc(hidden)]
    fn cells_for_point_path(&self, p: &Point, detail_level: usize, include_parents: bool) -> Result<Vec<Cell>> {
        // Same answer the recursion gives: nothing in the world relates.
        if !self.world_bounds().contains_xy(p.x(), p.y()) {
            return Ok(Vec::new());
        }
        let leaf = self
            .cell_for_point(p, detail_level)?
            .with_rel(IntersectCase::Contains);
        if !include_parents {
            return Ok(vec![leaf]);
        }
        let mut out = Vec::with_capacity(detail_level + 1);
        for level in 0..detail_level {
            out.push(
                self.cell_from_token(&leaf.token[..level])?
                    .with_rel(IntersectCase::Contains),
            );
        }
        out.push(leaf);
        Ok(out)
    }

    /// Smallest level whose cells are no wider or taller than `dist`,
    /// clamped to the max level. A non-positive distance asks for full detail.
    fn level_for_distance(&self, dist: f64) -> usize {
        if dist <= 0.0 || dist.is_nan() {
            return self.max_levels();
        }
        (1..=self.max_levels())
            .find(|&level| self.level_width(level) <= dist && self.level_height(level) <= dist)
            .unwrap_or(self.max_levels())
    }

    /// Level matching an error of `dist_err_pct` relative to the shape size,
    /// taken as half the side of a square with the bounding box's area.
    ///
    /// A bounding box with no area, such as that of a horizontal or vertical
    /// line, gives a distance of zero and so resolves at the max level. Long
    /// lines can then expand to thousands of leaf cells; callers indexing
    /// them may want to pass an explicit level instead.
    fn max_level_for_precision(&self, shape: &Shape, dist_err_pct: f64) -> Result<usize> {
        if !(0.0..=0.5).contains(&dist_err_pct) {
            return Err(SpatialError::InvalidArgument(format!(
                "dist_err_pct must be in [0, 0.5], got {}",
                dist_err_pct
            )));
        }
        if dist_err_pct == 0.0 || matches!(shape, Shape::Point(_)) {
            return Ok(self.max_levels());
        }
        let bbox = shape.bounding_box();
        let dist = bbox.area().sqrt() / 2.0 * dist_err_pct;
        let level = self.level_for_distance(dist);
        log::debug!(
            "{} tree precision: dist_err_pct={} dist={} level={}",
            self.name(),
            dist_err_pct,
            dist,
            level
        );
        Ok(level)
    }

    /// Coarse cover of `rect`: the cells holding its four corners at a level
    /// with cells at least as big as the rectangle, deduplicated, then
    /// expanded one level.
    fn corner_sub_cells(&self, rect: &Rectangle) -> Result<Vec<Cell>> {
        let fine = self.level_for_distance(rect.width().max(rect.height()));
        let level = fine.saturating_sub(1).max(1).min(self.max_levels());
        let world = self.world_bounds();
        let clamp = |x: f64, y: f64| {
            Point::new(
                x.clamp(world.min_x(), world.max_x()),
                y.clamp(world.min_y(), world.max_y()),
            )
        };
        let corners = [
            clamp(rect.min_x(), rect.max_y()),
            clamp(rect.max_x(), rect.max_y()),
            clamp(rect.min_x(), rect.min_y()),
            clamp(rect.max_x(), rect.min_y()),
        ];

        let mut tokens = BTreeSet::new();
        for corner in &corners {
            tokens.insert(self.cell_for_point(corner, level)?.token);
        }

        let mut out = Vec::new();
        for token in tokens {
            let cell = self.cell_from_token(&token)?;
            if cell.is_leaf() {
                out.push(cell);
            } else {
                out.extend(self.sub_cells(&cell));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> QuadPrefixTree {
        let ctx = Arc::new(SpatialContext::cartesian(Rectangle::new(0.0, 10.0, 0.0, 10.0)));
        QuadPrefixTree::new(ctx, 4).unwrap()
    }

    #[test]
    fn test_contained_cells_stop_early() {
        let tree = quad();
        // Exactly the lower-left quadrant.
        let shape = Shape::Rect(Rectangle::new(0.0, 5.0, 0.0, 5.0));
        let cells = tree.get_cells(&shape, 4, false).unwrap();
        let c = cells.iter().find(|c| c.token() == "C").unwrap();
        assert_eq!(c.shape_rel(), Some(IntersectCase::Within));
        assert!(cells.iter().all(|c| !c.token().starts_with('C') || c.token() == "C"));
    }

    #[test]
    fn test_include_parents_order() {
        let tree = quad();
        let shape = Shape::Rect(Rectangle::new(1.0, 2.0, 1.0, 2.0));
        let cells = tree.get_cells(&shape, 2, true).unwrap();
        assert_eq!(cells[0].level(), 0);
        // Every cell's parent precedes it.
        for (i, cell) in cells.iter().enumerate().skip(1) {
            let parent = &cell.token()[..cell.level() - 1];
            assert!(cells[..i].iter().any(|c| c.token() == parent));
        }
    }

    #[test]
    fn test_point_path() {
        let tree = quad();
        let cells = tree
            .get_cells(&Shape::Point(Point::new(3.0, 3.0)), 3, true)
            .unwrap();
        let tokens = cells_to_tokens(&cells);
        assert_eq!(tokens, vec!["", "C", "CB", "CBC"]);
    }

    #[test]
    fn test_level_for_distance() {
        let tree = quad();
        assert_eq!(tree.level_for_distance(0.0), 4);
        assert_eq!(tree.level_for_distance(5.0), 1);
        assert_eq!(tree.level_for_distance(3.0), 2);
        assert_eq!(tree.level_for_distance(100.0), 1);
        assert_eq!(tree.level_for_distance(0.001), 4);
    }

    #[test]
    fn test_precision_rejects_bad_pct() {
        let tree = quad();
        let shape = Shape::Rect(Rectangle::new(0.0, 1.0, 0.0, 1.0));
        assert!(tree.max_level_for_precision(&shape, 0.9).is_err());
        assert_eq!(tree.max_level_for_precision(&shape, 0.0).unwrap(), 4);
    }

    #[test]
    fn test_corner_sub_cells_dedup() {
        let tree = quad();
        let cells = tree
            .corner_sub_cells(&Rectangle::new(0.5, 1.0, 0.5, 1.0))
            .unwrap();
        let tokens = cells_to_tokens(&cells);
        let unique: BTreeSet<_> = tokens.iter().collect();
        assert_eq!(unique.len(), tokens.len());
        assert!(!tokens.is_empty());
    }

    #[test]
    fn test_read_cell_into_reuses_scratch() {
        let tree = quad();
        let mut scratch = Cell::scratch();
        tree.read_cell_into(b"cb", &mut scratch).unwrap();
        assert_eq!(scratch.token(), "CB");
        assert_eq!(scratch.rect(), Rectangle::new(2.5, 5.0, 2.5, 5.0));
        tree.read_cell_into(b"A", &mut scratch).unwrap();
        assert_eq!(scratch.token(), "A");
        assert!(tree.read_cell_into(b"AX", &mut scratch).is_err());
    }
}
