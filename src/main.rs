//! fredmeyer-crawler - Fred Meyer product crawler
//!
//! Listing and detail pages to a catalog spreadsheet plus normalized images.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fredmeyer_crawler::commands::{serve, CrawlCommand};
use fredmeyer_crawler::config::Config;
use fredmeyer_crawler::crawl::CrawlRequest;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fredmeyer-crawler",
    version,
    about = "Fred Meyer product crawler",
    long_about = "Crawls Fred Meyer listing or product pages with a headless browser and exports a product spreadsheet with normalized images."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Chrome/Chromium executable
    #[arg(long, global = true, env = "FM_CHROMIUM_PATH")]
    chromium: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a listing URL or a single product URL
    #[command(alias = "c")]
    Crawl {
        /// Listing or product detail URL
        url: String,

        /// Maximum number of products (1-200)
        #[arg(short, long)]
        max: Option<usize>,

        /// Skip image download
        #[arg(long)]
        no_images: bool,

        /// Seller code template, e.g. 20250305-W001
        #[arg(long)]
        code: Option<String>,

        /// Directory for spreadsheets and images
        #[arg(short, long)]
        output_root: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP relay (server-sent events + downloads)
    Serve {
        /// Listen address
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(path) = cli.chromium {
        config.chromium_path = Some(path);
    }
    if cli.headed {
        config.headless = false;
    }

    match cli.command {
        Commands::Crawl { url, max, no_images, code, output_root, json } => {
            if let Some(root) = output_root {
                config.output_root = root;
            }

            let mut request = CrawlRequest::new(url);
            request.max_items = max;
            request.download_images = no_images.then_some(false);
            request.product_code = code;

            let cmd = CrawlCommand::new(config);
            let output = cmd.execute(request, json).await?;
            println!("{}", output);
        }

        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            serve::serve(config, &bind).await?;
        }
    }

    Ok(())
}
