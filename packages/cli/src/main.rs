#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! One-shot CLI for the raid map pipeline.
//!
//! Runs the same pipeline the server runs at startup and prints the
//! records to stdout instead of caching them. Handy for checking the
//! board's current state or debugging how individual entries classify.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use raid_map_geocoder::address;
use raid_map_pipeline::{Pipeline, PipelineConfig};
use raid_map_scraper::firecrawl::FirecrawlConfig;
use raid_map_scraper::selector::SelectorExtractor;
use raid_map_scraper::{EntryExtractor as _, StaticSource};

#[derive(Parser)]
#[command(name = "raid_map", about = "Raid map extraction and geocoding tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the board, geocode every entry, and print the records
    Scrape {
        /// Read the board from a saved HTML file instead of Firecrawl
        #[arg(long)]
        html: Option<PathBuf>,
        /// Board URL (overrides `RAID_MAP_SOURCE_URL`)
        #[arg(long)]
        url: Option<String>,
        /// Maximum geocoding requests in flight
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print one indented JSON array instead of JSON lines
        #[arg(long)]
        pretty: bool,
    },
    /// Print the entries found in a saved board page
    Extract {
        /// Saved HTML file
        html: PathBuf,
    },
    /// Show how a single entry is classified
    Classify {
        /// Entry text, e.g. "123 Main St, Springfield, IL, USA"
        entry: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            html,
            url,
            concurrency,
            pretty,
        } => {
            let mut config = PipelineConfig::from_env();
            if let Some(url) = url {
                config.source_url = url;
            }
            if let Some(concurrency) = concurrency {
                config = config.with_concurrency(concurrency);
            }

            let client = reqwest::Client::builder()
                .user_agent(concat!("raid-map/", env!("CARGO_PKG_VERSION")))
                .build()?;

            let pipeline = match html {
                Some(path) => {
                    log::info!("Reading board from {}", path.display());
                    let markup = std::fs::read_to_string(&path)?;
                    Pipeline::with_registry_geocoder(
                        &client,
                        Arc::new(StaticSource::new(markup)),
                        config,
                    )?
                }
                None => Pipeline::production(&client, FirecrawlConfig::from_env(), config)?,
            };

            let run = pipeline.run().await;

            if pretty {
                println!("{}", serde_json::to_string_pretty(&run)?);
            } else {
                for record in run.results() {
                    println!("{}", serde_json::to_string(record)?);
                }
            }
        }
        Commands::Extract { html } => {
            let markup = std::fs::read_to_string(&html)?;
            let entries = SelectorExtractor::board().extract(&markup);
            for (idx, entry) in entries.iter().enumerate() {
                println!("{idx}\t{entry}");
            }
            log::info!("{} entries", entries.len());
        }
        Commands::Classify { entry } => match address::classify(&entry) {
            Ok(candidate) => println!("{}", serde_json::to_string_pretty(&candidate)?),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
