//! Latest weather report from the social feed.
//!
//! The feed is fetched with a plain GET. The newest post's text is the first
//! `p` inside `div.js-tweet-text-container`; its trailing link label (the
//! attached picture's short URL) is removed and line breaks become spaces.
//! The feed's markup changes often, so expect this source to fall back.

use super::{first, non_empty, text};
use crate::config::ScrapeConfig;
use crate::error::ExtractionFailure;
use crate::fetch::fetch_static;
use crate::models::{Fragment, WEATHER_NOT_FOUND};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use tracing::{info, instrument};

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").expect("valid regex"));

/// Extract the newest post's text.
pub fn parse(html: &str) -> Result<Fragment, ExtractionFailure> {
    let document = Html::parse_document(html);
    let container = first(document.root_element(), "div.js-tweet-text-container")?;
    let post = first(container, "p")?;

    let body = post.text().collect::<String>();
    let body = LINE_BREAKS.replace_all(&body, " ");
    let mut report = body.trim_end();
    if let Ok(link) = first(post, "a") {
        let label = text(link);
        if !label.is_empty() {
            report = report.strip_suffix(label.as_str()).unwrap_or(report);
        }
    }

    let report = non_empty("mars_weather", report.trim().to_string())?;
    Ok(Fragment::Weather(report))
}

/// GET the weather feed and extract the newest report.
#[instrument(level = "info", skip_all, fields(url = %config.weather_url))]
pub async fn scrape(client: &Client, config: &ScrapeConfig) -> Result<Fragment, ExtractionFailure> {
    let html = fetch_static(client, &config.weather_url).await?;
    let fragment = parse(&html)?;
    info!("Scraped weather report");
    Ok(fragment)
}

pub fn fallback() -> Fragment {
    Fragment::Weather(WEATHER_NOT_FOUND.to_string())
}
