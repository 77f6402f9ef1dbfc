mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stockview_engine::{Engine, EngineSettings, HttpStockSource, Session, SessionPage};
use tracing_subscriber::EnvFilter;

/// Categories the upstream warehouse serves.
const CATEGORIES: [&str; 3] = ["jackets", "shirts", "accessories"];

#[derive(Debug, Parser)]
#[command(name = "stockview-cli")]
#[command(about = "Browse warehouse catalogs with manufacturer availability")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print one page of a category with availability attached
    List {
        category: String,

        /// 1-indexed page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Print the page as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print every page of a category, reusing cached availability
    Browse { category: String },
    /// Print the known categories
    Categories,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Categories) {
        for category in CATEGORIES {
            println!("{category}");
        }
        return Ok(());
    }

    let config = stockview_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, endpoint = %config.api_endpoint, "configuration loaded");

    let source = HttpStockSource::from_config(&config)
        .context("failed to build warehouse HTTP client")?;
    let session = Session::new(Engine::new(source, EngineSettings::from_config(&config)));

    match cli.command {
        Commands::List {
            category,
            page,
            json,
        } => run_list(&session, &category, page, json).await,
        Commands::Browse { category } => run_browse(&session, &category).await,
        Commands::Categories => Ok(()),
    }
}

async fn run_list(
    session: &Session<HttpStockSource>,
    category: &str,
    page: usize,
    json: bool,
) -> anyhow::Result<()> {
    let loaded = load_page(session, category, page).await?;
    if json {
        let value = render::page_json(category, &loaded.reconciliation);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render::page_table(category, &loaded.reconciliation));
    }
    Ok(())
}

/// Walks every page of `category` through one session. Only the first page
/// fetches availability unless an entry goes stale mid-walk.
async fn run_browse(session: &Session<HttpStockSource>, category: &str) -> anyhow::Result<()> {
    let first = load_page(session, category, 1).await?;
    let total = first.reconciliation.total_page_count;
    print!("{}", render::page_table(category, &first.reconciliation));

    for page in 2..=total {
        let loaded = load_page(session, category, page).await?;
        println!();
        print!("{}", render::page_table(category, &loaded.reconciliation));
    }
    Ok(())
}

async fn load_page(
    session: &Session<HttpStockSource>,
    category: &str,
    page: usize,
) -> anyhow::Result<SessionPage> {
    let loaded = session
        .load(category, page)
        .await
        .with_context(|| format!("failed to load {category} page {page}"))?;
    for failure in &loaded.reconciliation.manufacturer_failures {
        eprintln!("warning: {failure}");
    }
    Ok(loaded)
}
