use std::fmt;

use geo::Point;
use geoprefix_types::relation::IntersectCase;

use crate::shape::{Rectangle, Shape};

/// A node of a prefix tree: a token and the rectangle it addresses.
///
/// Cells are plain values produced on demand; the tree itself is never
/// materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub(crate) token: String,
    pub(crate) rect: Rectangle,
    pub(crate) shape_rel: Option<IntersectCase>,
    pub(crate) is_leaf: bool,
}

impl Cell {
    pub(crate) fn new(token: String, rect: Rectangle, max_levels: usize) -> Self {
        let is_leaf = token.len() >= max_levels;
        Self {
            token,
            rect,
            shape_rel: None,
            is_leaf,
        }
    }

    /// An empty cell meant to be refilled with
    /// [`SpatialPrefixTree::read_cell_into`](super::SpatialPrefixTree::read_cell_into).
    pub fn scratch() -> Self {
        Self {
            token: String::new(),
            rect: Rectangle::new(0.0, 0.0, 0.0, 0.0),
            shape_rel: None,
            is_leaf: false,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn to_bytes(&self) -> &[u8] {
        self.token.as_bytes()
    }

    /// Tree depth; the world cell is level 0.
    pub fn level(&self) -> usize {
        self.token.len()
    }

    pub fn rect(&self) -> Rectangle {
        self.rect
    }

    /// How this cell relates to the shape that produced it, if it came from
    /// a shape resolution.
    pub fn shape_rel(&self) -> Option<IntersectCase> {
        self.shape_rel
    }

    pub(crate) fn with_rel(mut self, rel: IntersectCase) -> Self {
        self.shape_rel = Some(rel);
        self
    }

    /// Whether the cell sits at the tree's maximum depth.
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    /// The cell's shape. Leaf cells collapse to their center point.
    pub fn shape(&self) -> Shape {
        if self.is_leaf {
            Shape::Point(self.center())
        } else {
            Shape::Rect(self.rect)
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::scratch()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)?;
        if self.is_leaf {
            f.write_str("+")?;
        }
        Ok(())
    }
}

/// Tokens of the given cells, in order.
pub fn cells_to_tokens(cells: &[Cell]) -> Vec<String> {
    cells.iter().map(|c| c.token.clone()).collect()
}

/// Split a token list such as `"[A, AB, C]"` into its tokens.
pub fn parse_tokens(list: &str) -> Vec<String> {
    list.split(|c: char| c == '[' || c == ']' || c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_tokens("[A, AB, C]"), vec!["A", "AB", "C"]);
        assert_eq!(parse_tokens("[]"), Vec::<String>::new());
        assert_eq!(parse_tokens("dr5 dr5r"), vec!["dr5", "dr5r"]);
    }

    #[test]
    fn test_leaf_shape_is_center() {
        let rect = Rectangle::new(0.0, 2.0, 0.0, 2.0);
        let leaf = Cell::new("AB".to_string(), rect, 2);
        let inner = Cell::new("A".to_string(), rect, 2);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.shape(), Shape::Point(Point::new(1.0, 1.0)));
        assert_eq!(inner.shape(), Shape::Rect(rect));
        assert_eq!(leaf.to_string(), "AB+");
        assert_eq!(cells_to_tokens(&[leaf, inner]), vec!["AB", "A"]);
    }
}
