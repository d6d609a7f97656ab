use std::collections::BTreeSet;

use geoprefix::prefix::{cells_to_tokens, parse_tokens};
use geoprefix::prelude::*;

fn quad(bounds: Rectangle, levels: usize) -> QuadPrefixTree {
    let ctx = Arc::new(SpatialContext::cartesian(bounds));
    QuadPrefixTree::new(ctx, levels).expect("Failed to build quad tree")
}

fn geohash(levels: usize) -> GeohashPrefixTree {
    let ctx = Arc::new(SpatialContext::geo(DistanceUnits::Kilometers));
    GeohashPrefixTree::new(ctx, levels).expect("Failed to build geohash tree")
}

/// Every token of every length up to `depth` over `alphabet`.
fn all_tokens(alphabet: &[u8], depth: usize) -> Vec<String> {
    let mut out = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..depth {
        let mut next = Vec::new();
        for t in &frontier {
            for s in alphabet {
                let mut child = t.clone();
                child.push(*s as char);
                next.push(child);
            }
        }
        out.extend(next.iter().cloned());
        frontier = next;
    }
    out
}

fn rect_within(inner: &Rectangle, outer: &Rectangle) -> bool {
    let eps = 1e-9;
    inner.min_x() >= outer.min_x() - eps
        && inner.max_x() <= outer.max_x() + eps
        && inner.min_y() >= outer.min_y() - eps
        && inner.max_y() <= outer.max_y() + eps
}

#[test]
fn test_point_resolves_to_one_leaf() {
    let tree = quad(Rectangle::new(0.0, 10.0, 0.0, 10.0), 2);
    let cells = tree
        .get_cells(&Shape::Point(Point::new(3.0, 3.0)), 2, false)
        .expect("get_cells failed");
    assert_eq!(cells.len(), 1);

    let leaf = &cells[0];
    assert!(leaf.is_leaf());
    let rect = tree.cell_from_token(leaf.token()).unwrap().rect();
    assert!(rect.contains_xy(3.0, 3.0));
    assert_eq!(rect.width(), 10.0 / 4.0);
    assert_eq!(rect.height(), 10.0 / 4.0);
}

#[test]
fn test_quad_token_round_trip() {
    let tree = quad(Rectangle::new(-50.0, 50.0, 0.0, 20.0), 4);
    for token in all_tokens(b"ABCD", 4) {
        let cell = tree.cell_from_token(&token).unwrap();
        assert_eq!(cell.token(), token);
        assert_eq!(cell.level(), token.len());

        // Walking down from the world gives the same rectangle.
        let mut walked = tree.world_cell();
        for symbol in token.chars() {
            walked = tree
                .sub_cells(&walked)
                .into_iter()
                .find(|c| c.token().ends_with(symbol))
                .unwrap();
        }
        assert_eq!(walked.rect(), cell.rect(), "token {}", token);

        let from_bytes = tree.cell_from_bytes(cell.to_bytes()).unwrap();
        assert_eq!(from_bytes.rect(), cell.rect());
    }
}

#[test]
fn test_geohash_token_round_trip() {
    let tree = geohash(2);
    for token in all_tokens(tree.alphabet(), 2) {
        let cell = tree.cell_from_token(&token).unwrap();
        let mut walked = tree.world_cell();
        for symbol in token.chars() {
            walked = tree
                .sub_cells(&walked)
                .into_iter()
                .find(|c| c.token().ends_with(symbol))
                .unwrap();
        }
        assert_eq!(walked.rect(), cell.rect(), "token {}", token);
    }
}

#[test]
fn test_children_refine_parents() {
    let quad_tree = quad(Rectangle::new(0.0, 16.0, 0.0, 8.0), 5);
    let geo_tree = geohash(4);
    let trees: [(&dyn SpatialPrefixTree, f64, f64); 2] =
        [(&quad_tree, 2.0, 2.0), (&geo_tree, 4.0, 4.0)];

    for (tree, x_fan, y_fan) in trees {
        let mut frontier = vec![tree.world_cell()];
        for _ in 0..3 {
            let mut next = Vec::new();
            for parent in &frontier {
                let children = tree.sub_cells(parent);
                assert_eq!(children.len(), tree.alphabet().len());
                for child in children.iter().take(6) {
                    let (p, c) = (parent.rect(), child.rect());
                    assert!(rect_within(&c, &p), "{} not in {}", child, parent);
                    assert!(c.width() <= p.width() / x_fan.min(y_fan) + 1e-9);
                    assert_eq!(child.level(), parent.level() + 1);
                }
                next.extend(children.into_iter().take(6));
            }
            frontier = next;
        }
    }
}

#[test]
fn test_resolution_is_deterministic_and_ordered() {
    let tree = quad(Rectangle::new(0.0, 100.0, 0.0, 100.0), 6);
    let shape = Shape::Rect(Rectangle::new(12.0, 61.0, 7.0, 38.0));
    let first = cells_to_tokens(&tree.get_cells(&shape, 5, true).unwrap());
    let second = cells_to_tokens(&tree.get_cells(&shape, 5, true).unwrap());
    assert_eq!(first, second);

    // Pre-order: each token follows its parent, siblings in Z-order.
    assert_eq!(first[0], "");
    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(first, sorted);
}

#[test]
fn test_cells_cover_the_shape() {
    let tree = quad(Rectangle::new(0.0, 100.0, 0.0, 100.0), 5);
    let target = Rectangle::new(12.0, 61.0, 7.0, 38.0);
    let cells = tree.get_cells(&Shape::Rect(target), 5, false).unwrap();
    assert!(!cells.is_empty());

    for (x, y) in [(12.0, 7.0), (61.0, 38.0), (30.0, 20.0), (60.9, 7.1)] {
        assert!(
            cells.iter().any(|c| c.rect().contains_xy(x, y)),
            "({}, {}) not covered",
            x,
            y
        );
    }
    for cell in &cells {
        assert!(cell.shape_rel().unwrap().intersects());
    }
}

#[test]
fn test_detail_level_beyond_max_is_rejected() {
    let tree = quad(Rectangle::new(0.0, 10.0, 0.0, 10.0), 3);
    let err = tree
        .get_cells(&Shape::Point(Point::new(1.0, 1.0)), 4, false)
        .unwrap_err();
    assert!(matches!(err, SpatialError::InvalidArgument(_)));
}

#[test]
fn test_bad_tokens() {
    let tree = quad(Rectangle::new(0.0, 10.0, 0.0, 10.0), 3);
    assert!(matches!(
        tree.cell_from_token("ABE"),
        Err(SpatialError::InvalidShape(_))
    ));
    assert!(matches!(
        tree.cell_from_token("ABCD"),
        Err(SpatialError::InvalidShape(_))
    ));
    assert_eq!(tree.cell_from_token("abc").unwrap().token(), "ABC");
}

#[test]
fn test_precision_selection() {
    let tree = quad(Rectangle::new(0.0, 1024.0, 0.0, 1024.0), 12);
    // sqrt(area) / 2 * pct = 256 / 2 * 0.25 = 32: level 5 cells are 32 wide.
    let shape = Shape::Rect(Rectangle::new(0.0, 256.0, 0.0, 256.0));
    assert_eq!(tree.max_level_for_precision(&shape, 0.25).unwrap(), 5);
    assert_eq!(tree.max_level_for_precision(&shape, 0.0).unwrap(), 12);
    assert_eq!(
        tree.max_level_for_precision(&Shape::Point(Point::new(1.0, 1.0)), 0.25)
            .unwrap(),
        12
    );
    assert!(tree.max_level_for_precision(&shape, 0.51).is_err());
    assert!(tree.max_level_for_precision(&shape, -0.1).is_err());

    // Coarser error never asks for deeper cells.
    let mut last = usize::MAX;
    for pct in [0.01, 0.05, 0.1, 0.2, 0.5] {
        let level = tree.max_level_for_precision(&shape, pct).unwrap();
        assert!(level <= last);
        last = level;
    }
}

#[test]
fn test_geohash_matches_reference_encoding() {
    let tree = geohash(11);
    let cell = tree
        .cell_for_point(&Point::new(-74.0060, 40.7128), 7)
        .unwrap();
    assert_eq!(cell.token(), "dr5regw");

    let cells = tree
        .get_cells(&Shape::Point(Point::new(-74.0060, 40.7128)), 5, true)
        .unwrap();
    assert_eq!(
        cells_to_tokens(&cells),
        vec!["", "d", "dr", "dr5", "dr5r", "dr5re"]
    );
}

#[test]
fn test_geohash_covers_dateline_rect() {
    let ctx = Arc::new(SpatialContext::geo(DistanceUnits::Kilometers));
    let tree = GeohashPrefixTree::new(Arc::clone(&ctx), 3).unwrap();
    let wrapped = ctx.make_rect(170.0, -170.0, -5.0, 5.0).unwrap();
    let cells = tree.get_cells(&Shape::Rect(wrapped), 2, false).unwrap();

    let west = cells.iter().any(|c| c.rect().contains_xy(175.0, 0.0));
    let east = cells.iter().any(|c| c.rect().contains_xy(-175.0, 0.0));
    assert!(west && east);
    assert!(!cells.iter().any(|c| c.rect().contains_xy(0.0, 0.0)));
}

#[test]
fn test_corner_sub_cells() {
    let tree = quad(Rectangle::new(0.0, 100.0, 0.0, 100.0), 6);
    let query = Rectangle::new(40.0, 60.0, 40.0, 60.0);
    let cells = tree.corner_sub_cells(&query).unwrap();
    let tokens = cells_to_tokens(&cells);

    let unique: BTreeSet<_> = tokens.iter().collect();
    assert_eq!(unique.len(), tokens.len());
    for (x, y) in [(40.0, 40.0), (60.0, 60.0), (40.0, 60.0), (60.0, 40.0)] {
        assert!(cells.iter().any(|c| c.rect().contains_xy(x, y)));
    }
}

#[test]
fn test_token_list_helpers() {
    let tree = quad(Rectangle::new(0.0, 10.0, 0.0, 10.0), 3);
    let cells: Vec<Cell> = parse_tokens("[A, AB, C]")
        .iter()
        .map(|t| tree.cell_from_token(t).unwrap())
        .collect();
    assert_eq!(cells_to_tokens(&cells), vec!["A", "AB", "C"]);
}

#[test]
fn test_level_info_table() {
    let tree = quad(Rectangle::new(0.0, 8.0, 0.0, 4.0), 3);
    let info = tree.level_info();
    assert_eq!(info.len(), 3);
    assert_eq!(info[0].level, 1);
    assert_eq!(info[0].cells, 4);
    assert_eq!(info[2].side, 8);
    assert_eq!(info[2].cells, 64);
    assert_eq!(info[2].width, 1.0);
    assert_eq!(info[2].height, 0.5);
}
