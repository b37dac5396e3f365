//! torrent-search CLI.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use torrent_search::{Category, Search, SearchOptions, SearchQuery, SearchResults};

/// Search many torrent indexes at once
#[derive(Parser)]
#[command(name = "torrent-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every selected source
    Search(SearchArgs),

    /// List available sources
    Sources,

    /// List search categories
    Categories,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Category (all, movies, tv, music, games, software, anime, books)
    #[arg(short, long, default_value = "all")]
    category: String,

    /// Sources to use (comma-separated ids, see `sources`)
    #[arg(short, long, value_delimiter = ',')]
    sources: Option<Vec<String>>,

    /// Maximum number of results to display
    #[arg(short, long, default_value = "20")]
    limit: usize,

    /// Overall search timeout in seconds
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Sources => list_sources(),
        Commands::Categories => list_categories(),
    }
}

fn list_sources() -> Result<()> {
    let search = Search::with_default_engines(&SearchOptions::default())?;
    println!("Available sources:\n");
    for source in search.list_sources() {
        let categories: Vec<&str> = source.categories.iter().map(|c| c.key()).collect();
        println!(
            "  {:<16} {:<16} {}",
            source.id,
            source.display_name,
            categories.join(",")
        );
    }
    println!();
    println!("Usage: torrent-search search \"query\" -s piratebay,yts,nyaa");
    Ok(())
}

fn list_categories() -> Result<()> {
    let search = Search::new();
    for category in search.list_categories() {
        println!("{}", category);
    }
    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let options = SearchOptions {
        overall_timeout_secs: args.timeout,
        ..Default::default()
    };
    let mut search = Search::with_default_engines(&options)?;
    search.set_timeout(Duration::from_secs(args.timeout));

    let category = resolve_category(&args.category);
    let mut query = SearchQuery::new(&args.query)
        .with_category(category)
        .with_limit(args.limit);
    if let Some(sources) = args.sources {
        query = query.with_sources(sources);
    }

    let results = search.search(query).await?;

    match args.format {
        OutputFormat::Text => print_text(&args.query, &results),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Compact => {
            for result in results.items() {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    result.seeders, result.size_display, result.source_name, result.name, result.link
                );
            }
        }
    }

    Ok(())
}

/// Unknown category keys search everything rather than failing.
fn resolve_category(key: &str) -> Category {
    let category = Category::parse_lenient(key);
    if category.key() != key.trim().to_ascii_lowercase() {
        warn!("Unknown category '{}', searching all", key);
    }
    category
}

fn print_text(query: &str, results: &SearchResults) {
    println!(
        "\nSearch results for \"{}\" ({} results in {}ms):\n",
        query, results.count, results.duration_ms
    );

    for (i, result) in results.items().iter().enumerate() {
        println!("{}. {}", i + 1, result.name);
        println!(
            "   {} | S:{} L:{} | {} | {}",
            result.size_display,
            result.seeders,
            result.leechers,
            result.category_label,
            result.source_name
        );
        if !result.description_link.is_empty() {
            println!("   Page: {}", result.description_link);
        }
        println!("   {}", result.link);
        println!();
    }

    if !results.errors().is_empty() {
        println!("Sources with errors:");
        for failure in results.errors() {
            println!("  {}: {}", failure.source_id, failure.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_category() {
        assert_eq!(resolve_category("Movies"), Category::Movies);
        assert_eq!(resolve_category(" tv "), Category::Tv);
        assert_eq!(resolve_category("documentaries"), Category::All);
    }

    #[test]
    fn test_cli_accepts_unknown_category() {
        let cli = Cli::try_parse_from(["torrent-search", "search", "nature", "-c", "documentaries"]);
        match cli.map(|cli| cli.command) {
            Ok(Commands::Search(args)) => assert_eq!(resolve_category(&args.category), Category::All),
            _ => panic!("search command should parse"),
        }
    }
}
