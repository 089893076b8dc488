//! Command-line interface definitions for Mars Scrape.
//!
//! Global options can also be provided via environment variables.

use crate::display::Format;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Mars Scrape application.
///
/// # Examples
///
/// ```sh
/// # Scrape every source and replace the stored record
/// mars_scrape scrape
///
/// # Show the stored record as Markdown
/// mars_scrape --store /var/lib/mars/mars.json show --format markdown
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "MARS_SCRAPE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Path of the JSON file holding the current record
    #[arg(short, long, env = "MARS_SCRAPE_STORE", default_value = "mars_data.json", global = true)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Scrape every source and store the merged record
    Scrape {
        /// Do not print the record after storing it
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the stored record
    Show {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}
