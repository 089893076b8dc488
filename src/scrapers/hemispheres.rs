//! Hemisphere titles and full-resolution images from the USGS search results.
//!
//! The results page lists four `div.item` entries. Each entry's title links
//! to a detail page whose `div.downloads` section has a `Sample` link to the
//! full-resolution image. The walker clicks into each detail page and goes
//! back to the results before the next entry:
//!
//! ```text
//! Index --click(title)--> Detail --back--> Index --click(title)--> ...
//! ```
//!
//! Any failure abandons the whole walk: the result is either four real
//! entries or, via [`fallback`], four placeholders.

use super::{absolute, all, attr, first, non_empty, text};
use crate::browser::{BrowserSession, wait_for_url_change};
use crate::config::ScrapeConfig;
use crate::error::ExtractionFailure;
use crate::fetch::fetch_rendered;
use crate::models::{Fragment, HEMISPHERE_COUNT, HemisphereEntry};
use scraper::Html;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Where the walker's tab currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Not yet on the results page.
    Start,
    Index,
    Detail { title: String, url: String },
}

/// Titles of the result entries, in listing order.
///
/// Fails unless exactly four entries are listed.
pub fn parse_index(html: &str) -> Result<Vec<String>, ExtractionFailure> {
    let document = Html::parse_document(html);
    let titles = all(document.root_element(), "div.item")?
        .into_iter()
        .map(|item| non_empty("title", text(first(item, "div.description a")?)))
        .collect::<Result<Vec<_>, ExtractionFailure>>()?;

    if titles.len() != HEMISPHERE_COUNT {
        return Err(ExtractionFailure::UnexpectedCount {
            expected: HEMISPHERE_COUNT,
            found: titles.len(),
        });
    }
    Ok(titles)
}

/// Target of the `Sample` link in a detail page's downloads section.
///
/// # Arguments
///
/// * `html` - Rendered detail page
/// * `page_url` - URL of that detail page, used to resolve a relative `href`
///
/// # Returns
///
/// The absolute image URL, or an error if no link is labelled exactly `Sample`.
pub fn parse_sample_link(html: &str, page_url: &str) -> Result<String, ExtractionFailure> {
    const SAMPLE: &str = "div.downloads a";
    let document = Html::parse_document(html);
    let downloads = first(document.root_element(), "div.downloads")?;
    let link = all(downloads, "a")?
        .into_iter()
        .find(|a| text(*a) == "Sample")
        .ok_or(ExtractionFailure::MissingElement { selector: SAMPLE })?;
    absolute(page_url, attr(link, SAMPLE, "href")?)
}

/// Drives one browser session through the results and detail pages.
#[derive(Debug)]
pub struct HemisphereWalker<'s, S> {
    session: &'s mut S,
    index_url: &'s str,
    settle: Duration,
    navigation_timeout: Duration,
    location: Location,
}

impl<'s, S: BrowserSession> HemisphereWalker<'s, S> {
    pub fn new(session: &'s mut S, config: &'s ScrapeConfig) -> Self {
        Self {
            session,
            index_url: &config.hemispheres_url,
            settle: config.settle_delay(),
            navigation_timeout: config.browser.navigation_timeout(),
            location: Location::Start,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Visit every result entry and collect its image, in listing order.
    ///
    /// # Returns
    ///
    /// Exactly four entries, or the first failure met along the way.
    #[instrument(level = "info", skip_all, fields(url = %self.index_url))]
    pub async fn walk(mut self) -> Result<Vec<HemisphereEntry>, ExtractionFailure> {
        let result = self.visit_all().await;
        if let Err(ref e) = result {
            warn!(location = ?self.location(), error = %e, "Hemisphere walk abandoned");
        }
        result
    }

    async fn visit_all(&mut self) -> Result<Vec<HemisphereEntry>, ExtractionFailure> {
        let html = fetch_rendered(&mut *self.session, self.index_url, self.settle).await?;
        self.location = Location::Index;
        let titles = parse_index(&html)?;
        debug!(?titles, "Listed hemisphere entries");

        let mut entries = Vec::with_capacity(titles.len());
        for title in titles {
            let detail_url = self.open_detail(&title).await?;
            let html = self.session.html().await?;
            let image_url = parse_sample_link(&html, &detail_url)?;
            debug!(%title, %image_url, "Found sample image");
            entries.push(HemisphereEntry { title, image_url });

            self.return_to_index().await?;
        }

        info!(count = entries.len(), "Scraped hemisphere images");
        Ok(entries)
    }

    /// Click `title` on the results page and wait there for the detail page.
    async fn open_detail(&mut self, title: &str) -> Result<String, ExtractionFailure> {
        if self.location != Location::Index {
            return Err(ExtractionFailure::Navigation(format!(
                "cannot open {title:?} from {:?}",
                self.location
            )));
        }
        let from = self.session.current_url().await?;
        self.session.click_link_by_text(title).await?;
        let url = wait_for_url_change(&mut *self.session, &from, self.navigation_timeout).await?;
        sleep(self.settle).await;
        self.location = Location::Detail {
            title: title.to_string(),
            url: url.clone(),
        };
        Ok(url)
    }

    async fn return_to_index(&mut self) -> Result<(), ExtractionFailure> {
        let Location::Detail { title, url } = &self.location else {
            return Err(ExtractionFailure::Navigation(format!(
                "cannot go back to the index from {:?}",
                self.location
            )));
        };
        debug!(%title, "Returning to results");
        let from = url.clone();
        self.session.back().await?;
        wait_for_url_change(&mut *self.session, &from, self.navigation_timeout).await?;
        sleep(self.settle).await;
        self.location = Location::Index;
        Ok(())
    }
}

/// Walk the configured results page in `session`.
///
/// # Arguments
///
/// * `session` - Browser session, left on the results page on success
/// * `config` - Supplies the results URL, settle delay and navigation timeout
///
/// # Returns
///
/// A [`Fragment::Hemispheres`] with four entries, or the failure that
/// abandoned the walk.
pub async fn scrape<S: BrowserSession>(
    session: &mut S,
    config: &ScrapeConfig,
) -> Result<Fragment, ExtractionFailure> {
    HemisphereWalker::new(session, config)
        .walk()
        .await
        .map(Fragment::Hemispheres)
}

/// Four `Not Found` entries pointing at the default image.
pub fn fallback(config: &ScrapeConfig) -> Fragment {
    Fragment::Hemispheres(HemisphereEntry::placeholders(&config.default_image_url))
}
