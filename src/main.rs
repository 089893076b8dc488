//! # Mars Scrape
//!
//! Scrapes several public pages about Mars into one record and keeps the
//! latest record on disk for display.
//!
//! ## Sources
//!
//! - Latest headline and teaser from the Mars news site
//! - Featured image from the JPL space-images gallery
//! - Latest weather report from the weather feed
//! - Planet facts table
//! - Titles and full-resolution images of the four hemispheres from USGS
//!
//! ## Usage
//!
//! ```sh
//! mars_scrape scrape
//! mars_scrape show --format markdown
//! ```
//!
//! ## Architecture
//!
//! 1. **Session**: one Chromium session is started for the run
//! 2. **Extraction**: each source is fetched and parsed in turn; a failing
//!    source contributes its placeholder values instead
//! 3. **Merge**: fragments are merged into a six-key record
//! 4. **Store**: the record replaces the one stored record

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod display;
mod error;
mod fetch;
mod models;
mod pipeline;
mod scrapers;
mod store;

use browser::ChromeLauncher;
use cli::{Cli, Command};
use config::ScrapeConfig;
use error::StoreError;
use pipeline::{Pipeline, scrape_and_persist};
use store::{JsonFileStore, RecordStore};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args.config, ?args.store, ?args.command, "Parsed CLI arguments");

    let config = ScrapeConfig::load_or_default(args.config.as_deref())?;
    let store = JsonFileStore::new(&args.store);

    match args.command {
        Command::Scrape { quiet } => {
            info!(store = %store.path().display(), "mars_scrape starting scrape");
            let launcher = ChromeLauncher::new(config.browser.clone());
            let pipeline = Pipeline::new(config)?;

            let record = match scrape_and_persist(&pipeline, &launcher, &store).await {
                Ok(record) => record,
                Err(e) => {
                    error!(error = %e, "Scrape failed; stored record left unchanged");
                    return Err(e.into());
                }
            };

            if !quiet {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Command::Show { format } => match store.get_singleton_or_fail().await {
            Ok(stored) => println!("{}", display::render(&stored, format)?),
            Err(StoreError::NotFound) => {
                error!(
                    store = %store.path().display(),
                    "No record stored yet; run `mars_scrape scrape` first"
                );
                return Err(StoreError::NotFound.into());
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}
