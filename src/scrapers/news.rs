//! Latest headline from the Mars news index.
//!
//! The index is rendered client-side, so it is fetched through the browser.
//! The first `li.slide` is the newest story; its title sits under
//! `div.content_title a` and its teaser in `div.article_teaser_body`.

use super::{first, non_empty, text};
use crate::browser::BrowserSession;
use crate::config::ScrapeConfig;
use crate::error::ExtractionFailure;
use crate::fetch::fetch_rendered;
use crate::models::{Fragment, NO_RESULT};
use scraper::Html;
use tracing::{info, instrument};

/// Extract the newest story's title and teaser.
pub fn parse(html: &str) -> Result<Fragment, ExtractionFailure> {
    let document = Html::parse_document(html);
    let slide = first(document.root_element(), "li.slide")?;
    let title = non_empty("news_title", text(first(slide, "div.content_title a")?))?;
    let paragraph = non_empty("news_p", text(first(slide, "div.article_teaser_body")?))?;
    Ok(Fragment::News { title, paragraph })
}

/// Fetch the rendered news index and extract the latest story.
///
/// # Arguments
///
/// * `session` - Browser session used to render the index
/// * `config` - Supplies the news URL and settle delay
///
/// # Returns
///
/// A [`Fragment::News`], or the failure that stopped extraction.
#[instrument(level = "info", skip_all, fields(url = %config.news_url))]
pub async fn scrape<S: BrowserSession>(
    session: &mut S,
    config: &ScrapeConfig,
) -> Result<Fragment, ExtractionFailure> {
    let html = fetch_rendered(session, &config.news_url, config.settle_delay()).await?;
    let fragment = parse(&html)?;
    info!("Scraped latest news");
    Ok(fragment)
}

/// `no result` for both title and teaser.
pub fn fallback() -> Fragment {
    Fragment::News {
        title: NO_RESULT.to_string(),
        paragraph: NO_RESULT.to_string(),
    }
}
