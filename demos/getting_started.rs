use geoprefix::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see precision decisions)
    env_logger::init();

    println!("=== geoprefix - Getting Started ===\n");

    // === BUILD A TREE ===
    println!("1. Building a geohash tree");
    println!("--------------------------");

    let (ctx, tree) = PrefixTreeBuilder::new()
        .tree(TreeKind::Geohash)
        .max_levels(9)
        .build()?;
    println!(
        "   {} tree, {} levels, leaf cells {:.6} x {:.6} degrees\n",
        tree.name(),
        tree.max_levels(),
        tree.level_width(tree.max_levels()),
        tree.level_height(tree.max_levels())
    );

    // === POINTS TO TOKENS ===
    println!("2. Point to cell tokens");
    println!("-----------------------");

    let nyc = ctx.make_point(-74.0060, 40.7128)?;
    let cells = tree.get_cells(&Shape::Point(nyc), tree.max_levels(), true)?;
    for cell in cells.iter().skip(1) {
        println!("   level {:>2}: {}", cell.level(), cell);
    }
    println!();

    // === SHAPE RELATIONS ===
    println!("3. Shape relations");
    println!("------------------");

    let manhattan = ctx.read_shape("-74.02 40.70 -73.93 40.88")?;
    let around = ctx.read_shape("Circle(-73.98 40.75 d=2)")?;
    println!(
        "   circle vs manhattan box: {}",
        around.relate(&manhattan, &ctx)?
    );
    println!(
        "   nyc point vs manhattan box: {}\n",
        Shape::Point(nyc).relate(&manhattan, &ctx)?
    );

    // === SHAPES TO TOKENS ===
    println!("4. Shape cover at 2.5% precision");
    println!("--------------------------------");

    let level = tree.max_level_for_precision(&manhattan, 0.025)?;
    let cover = tree.get_cells(&manhattan, level, false)?;
    println!("   detail level {} -> {} cells", level, cover.len());
    for cell in cover.iter().take(8) {
        println!("     - {} ({})", cell, cell.shape_rel().map_or("?".into(), |r| r.to_string()));
    }
    println!();

    // === QUAD TREE ===
    println!("5. Quad tree over planar bounds");
    println!("-------------------------------");

    let (_, quad) = PrefixTreeBuilder::new()
        .tree(TreeKind::Quad)
        .units(DistanceUnits::Cartesian)
        .world_bounds(Rectangle::new(0.0, 10.0, 0.0, 10.0))
        .max_levels(2)
        .build()?;
    let leaf = quad.get_cells(&Shape::Point(Point::new(3.0, 3.0)), 2, false)?;
    println!("   Point(3, 3) -> {}", leaf[0]);

    println!("\n=== Done ===");
    Ok(())
}
