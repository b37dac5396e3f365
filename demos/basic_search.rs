//! Example: search a few torrent sources concurrently.

use torrent_search::{Category, Search, SearchOptions, SearchQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let search = Search::with_default_engines(&SearchOptions::default())?;
    println!("Configured {} sources", search.engine_count());

    let query = SearchQuery::new("big buck bunny")
        .with_category(Category::Movies)
        .with_sources(vec![
            "piratebay".to_string(),
            "yts".to_string(),
            "torrentscsv".to_string(),
        ])
        .with_limit(10);

    println!("Searching for: {}", query.query);
    println!();

    let results = search.search(query).await?;

    println!("Found {} results in {}ms", results.count, results.duration_ms);
    println!();

    for (i, result) in results.items().iter().enumerate() {
        println!("{}. {}", i + 1, result.name);
        println!(
            "   {} | seeders {} | leechers {} | {}",
            result.size_display, result.seeders, result.leechers, result.source_name
        );
        println!("   {}", result.link);
        println!();
    }

    for failure in results.errors() {
        println!("{} failed: {}", failure.source_id, failure.message);
    }

    Ok(())
}
