//! Featured image from the JPL space-images gallery.
//!
//! Resolution takes two pages: the gallery's carousel button carries the
//! detail page in `data-link`, and the detail page's `figure.lede` links the
//! full-resolution image. Both references are relative to the site.

use super::{absolute, attr, first};
use crate::browser::BrowserSession;
use crate::config::ScrapeConfig;
use crate::error::ExtractionFailure;
use crate::fetch::fetch_rendered;
use crate::models::Fragment;
use scraper::Html;
use tracing::{debug, info, instrument};

const CAROUSEL_LINK: &str = "div.carousel_container a.button.fancybox";
const LEDE_LINK: &str = "figure.lede a";

/// Absolute URL of the detail page linked from the gallery carousel.
pub fn parse_detail_url(html: &str, page_url: &str) -> Result<String, ExtractionFailure> {
    let document = Html::parse_document(html);
    let link = first(document.root_element(), CAROUSEL_LINK)?;
    absolute(page_url, attr(link, CAROUSEL_LINK, "data-link")?)
}

/// Absolute URL of the full-resolution image on the detail page.
pub fn parse_image_url(html: &str, page_url: &str) -> Result<String, ExtractionFailure> {
    let document = Html::parse_document(html);
    let link = first(document.root_element(), LEDE_LINK)?;
    absolute(page_url, attr(link, LEDE_LINK, "href")?)
}

/// Resolve the featured image through the gallery's detail page.
///
/// Renders the gallery, follows the carousel's `data-link` to the detail
/// page, then reads the full-size image link there. Both links are resolved
/// against the page they were found on.
///
/// # Arguments
///
/// * `session` - Browser session used for both pages
/// * `config` - Supplies the gallery URL and settle delay
///
/// # Returns
///
/// A [`Fragment::FeaturedImage`] holding an absolute URL.
#[instrument(level = "info", skip_all, fields(url = %config.featured_image_url))]
pub async fn scrape<S: BrowserSession>(
    session: &mut S,
    config: &ScrapeConfig,
) -> Result<Fragment, ExtractionFailure> {
    let gallery = fetch_rendered(session, &config.featured_image_url, config.settle_delay()).await?;
    let detail_url = parse_detail_url(&gallery, &config.featured_image_url)?;
    debug!(%detail_url, "Resolved featured image detail page");

    let detail = fetch_rendered(session, &detail_url, config.settle_delay()).await?;
    let image_url = parse_image_url(&detail, &detail_url)?;
    info!(%image_url, "Scraped featured image");
    Ok(Fragment::FeaturedImage(image_url))
}

/// The configured default image.
pub fn fallback(config: &ScrapeConfig) -> Fragment {
    Fragment::FeaturedImage(config.default_image_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeSession, Tracker};
    use std::collections::HashMap;
    use std::sync::Arc;

    const GALLERY_URL: &str = "https://www.jpl.nasa.gov/spaceimages/?search=&category=Mars";

    const GALLERY: &str = r#"
        <div class="carousel_container">
          <div class="carousel_items">
            <article class="carousel_item">
              <a class="button fancybox" data-link="/spaceimages/details.php?id=PIA19083"
                 data-fancybox-href="/spaceimages/images/mediumsize/PIA19083_ip.jpg">FULL IMAGE</a>
            </article>
          </div>
        </div>"#;

    const DETAIL: &str = r#"
        <figure class="lede">
          <a href="/spaceimages/images/largesize/PIA19083_hires.jpg">
            <img src="/spaceimages/images/largesize/PIA19083_ip.jpg">
          </a>
        </figure>"#;

    #[test]
    fn test_parse_detail_url() {
        assert_eq!(
            parse_detail_url(GALLERY, GALLERY_URL).unwrap(),
            "https://www.jpl.nasa.gov/spaceimages/details.php?id=PIA19083"
        );
    }

    #[test]
    fn test_parse_detail_url_without_data_link() {
        let html = r#"<div class="carousel_container"><a class="button fancybox">x</a></div>"#;
        assert!(matches!(
            parse_detail_url(html, GALLERY_URL).unwrap_err(),
            ExtractionFailure::MissingAttribute {
                attribute: "data-link",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_image_url() {
        assert_eq!(
            parse_image_url(DETAIL, "https://www.jpl.nasa.gov/spaceimages/details.php?id=PIA19083")
                .unwrap(),
            "https://www.jpl.nasa.gov/spaceimages/images/largesize/PIA19083_hires.jpg"
        );
    }

    #[tokio::test]
    async fn test_scrape_follows_detail_page() {
        let config = ScrapeConfig {
            settle_delay_ms: 0,
            ..ScrapeConfig::default()
        };
        let mut pages = HashMap::new();
        pages.insert(GALLERY_URL.to_string(), GALLERY.to_string());
        pages.insert(
            "https://www.jpl.nasa.gov/spaceimages/details.php?id=PIA19083".to_string(),
            DETAIL.to_string(),
        );
        let mut session = FakeSession::new(pages, Arc::new(Tracker::default()));

        let fragment = scrape(&mut session, &config).await.unwrap();
        assert_eq!(
            fragment,
            Fragment::FeaturedImage(
                "https://www.jpl.nasa.gov/spaceimages/images/largesize/PIA19083_hires.jpg"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_scrape_detail_without_lede_fails() {
        let config = ScrapeConfig {
            settle_delay_ms: 0,
            ..ScrapeConfig::default()
        };
        let mut pages = HashMap::new();
        pages.insert(GALLERY_URL.to_string(), GALLERY.to_string());
        pages.insert(
            "https://www.jpl.nasa.gov/spaceimages/details.php?id=PIA19083".to_string(),
            "<html><body><p>moved</p></body></html>".to_string(),
        );
        let mut session = FakeSession::new(pages, Arc::new(Tracker::default()));

        let err = scrape(&mut session, &config).await.unwrap_err();
        assert!(matches!(
            err,
            ExtractionFailure::MissingElement {
                selector: "figure.lede a"
            }
        ));
        assert_eq!(
            fallback(&config),
            Fragment::FeaturedImage(config.default_image_url.clone())
        );
    }
}
