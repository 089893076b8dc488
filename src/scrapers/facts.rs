//! Planet profile table from the facts page.
//!
//! The first `<table>` on the page holds `(description, value)` rows. They
//! are re-rendered with [`FactsTable::to_html`] so the display layer can embed
//! the markup directly.

use super::{all, first, text};
use crate::config::ScrapeConfig;
use crate::error::ExtractionFailure;
use crate::fetch::fetch_static;
use crate::models::{FactRow, FactsTable, Fragment};
use itertools::Itertools;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info, instrument};

/// Parse the first table on the page into fact rows.
///
/// Header rows (only `th` cells) and rows with fewer than two cells are
/// skipped; cells past the second are ignored. A table with no usable rows
/// is a failure.
pub fn parse(html: &str) -> Result<FactsTable, ExtractionFailure> {
    let document = Html::parse_document(html);
    let table = first(document.root_element(), "table")?;

    let mut rows = Vec::new();
    for tr in all(table, "tr")? {
        let cells = all(tr, "th, td")?;
        if cells.iter().all(|c| c.value().name() == "th") {
            continue;
        }
        match cells.into_iter().map(text).next_tuple() {
            Some((description, value)) => rows.push(FactRow { description, value }),
            None => debug!("Skipping facts row with fewer than two cells"),
        }
    }

    if rows.is_empty() {
        return Err(ExtractionFailure::EmptyField("facts_table"));
    }
    Ok(FactsTable { rows })
}

/// GET the facts page and re-render its first table.
///
/// # Returns
///
/// A [`Fragment::Facts`] holding table markup indexed by description.
#[instrument(level = "info", skip_all, fields(url = %config.facts_url))]
pub async fn scrape(client: &Client, config: &ScrapeConfig) -> Result<Fragment, ExtractionFailure> {
    let html = fetch_static(client, &config.facts_url).await?;
    let table = parse(&html)?;
    info!(rows = table.rows.len(), "Scraped facts table");
    Ok(Fragment::Facts(table.to_html()))
}

/// The single-row `(none, none)` table.
pub fn fallback() -> Fragment {
    Fragment::Facts(FactsTable::placeholder().to_html())
}
