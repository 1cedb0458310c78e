//! Iconhunt CLI — entry point.

mod output;

use clap::Parser;

use iconhunt::{CancellationToken, IconConfig, QueryResolver};

const USAGE: &str = "Usage: iconhunt --query <search_term> [--limit <number>]";

#[derive(Parser)]
#[command(
    name = "iconhunt",
    about = "Iconhunt — fetch SVG icon markup for a search query",
    version,
    after_help = "Icons are scraped from the primary source; curated icons are used when it fails."
)]
struct Cli {
    /// SVG search query (required).
    #[arg(short, long)]
    query: Option<String>,

    /// Maximum number of SVGs to download (values <= 0 mean 3).
    #[arg(short, long, default_value_t = 3, allow_negative_numbers = true)]
    limit: i64,

    /// Output results as JSON (machine-readable).
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let query = match cli.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => {
            eprintln!("Error: query parameter is required");
            eprintln!("{USAGE}");
            eprintln!("Use --help for more information");
            std::process::exit(1);
        }
    };

    if !cli.json {
        println!("Searching for SVGs with query: {query} (limit: {})", cli.limit);
    }

    let resolver = QueryResolver::new(&IconConfig::default())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    // Consistent exit codes: 0=success or nothing found, 1=error
    match resolver.resolve(&query, cli.limit, &cancel).await {
        Ok(result) => output::print_result(&result, cli.json),
        Err(e) => {
            eprintln!("Error fetching SVGs: {e:#}");
            std::process::exit(1);
        }
    }
}
