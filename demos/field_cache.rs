use geoprefix::MemorySegment;
use geoprefix::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=info to see cache builds)
    env_logger::init();

    println!("=== geoprefix - Field Cache ===\n");

    let strategy = PrefixTreeBuilder::new().max_levels(9).build_strategy()?;
    let ctx = Arc::clone(strategy.tree().context());

    // Index a few cities as documents of one segment.
    let cities = [
        ("New York", -74.0060, 40.7128),
        ("London", -0.1278, 51.5074),
        ("Paris", 2.3522, 48.8566),
        ("Tokyo", 139.6503, 35.6762),
    ];
    let mut segment = MemorySegment::new(1);
    for (doc, (name, lon, lat)) in cities.iter().enumerate() {
        let tokens = strategy.create_field_tokens(&Shape::Point(ctx.make_point(*lon, *lat)?))?;
        segment.add_document(doc as u32, "location", &tokens);
        println!("   indexed {:<9} as {} terms", name, tokens.len());
    }
    println!();

    // Which documents fall in a box around western Europe?
    let args = SpatialArgs::parse("Intersects(-5 45 5 55) distPrec=0.1", &ctx)?;
    let query = strategy.query_tokens(&args)?;
    println!("   query over western Europe uses {} terms", query.len());
    for (doc, (name, _, _)) in cities.iter().enumerate() {
        let hit = query
            .iter()
            .any(|t| segment.docs_for_term("location", t.as_bytes()).contains(&(doc as u32)));
        if hit {
            println!("     - {}", name);
        }
    }
    println!();

    // Distance from Paris to every city, through the cached leaf cells.
    let from_paris = SpatialArgs::parse("Intersects(2.3522 48.8566)", &ctx)?;
    let source = strategy.make_value_source(&from_paris, "location", &segment);
    for (doc, (name, _, _)) in cities.iter().enumerate() {
        println!("   {:<9} {:>8.1} km from Paris", name, source.value(doc as u32));
    }

    strategy.release_segment(1);
    println!("\n=== Done ===");
    Ok(())
}
