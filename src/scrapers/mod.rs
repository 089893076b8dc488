//! Per-source extractors for the Mars record.
//!
//! Each submodule owns one source and follows the same shape:
//!
//! - `parse*`: pure functions from HTML to fields, tested against fixtures
//! - `scrape()`: fetches the page(s) and parses, returning
//!   `Result<Fragment, ExtractionFailure>`
//! - `fallback()`: the fragment substituted when `scrape()` fails
//!
//! # Sources
//!
//! | Source | Module | Fetch | Fallback |
//! |--------|--------|-------|----------|
//! | Mars news | [`news`] | rendered | `"no result"` title and teaser |
//! | JPL featured image | [`featured_image`] | rendered, two pages | default image |
//! | Weather feed | [`weather`] | static GET | `"Data not found!"` |
//! | Planet facts | [`facts`] | static GET | `(none, none)` table |
//! | USGS hemispheres | [`hemispheres`] | rendered, click/back walk | four `"Not Found"` entries |

pub mod facts;
pub mod featured_image;
pub mod hemispheres;
pub mod news;
pub mod weather;

use crate::error::ExtractionFailure;
use scraper::{ElementRef, Selector};
use url::Url;

fn selector(css: &'static str) -> Result<Selector, ExtractionFailure> {
    Selector::parse(css).map_err(|_| ExtractionFailure::MissingElement { selector: css })
}

/// First descendant of `scope` matching `css`.
pub(crate) fn first<'a>(
    scope: ElementRef<'a>,
    css: &'static str,
) -> Result<ElementRef<'a>, ExtractionFailure> {
    scope
        .select(&selector(css)?)
        .next()
        .ok_or(ExtractionFailure::MissingElement { selector: css })
}

/// Every descendant of `scope` matching `css`, in document order.
pub(crate) fn all<'a>(
    scope: ElementRef<'a>,
    css: &'static str,
) -> Result<Vec<ElementRef<'a>>, ExtractionFailure> {
    Ok(scope.select(&selector(css)?).collect())
}

/// Concatenated, trimmed text content.
pub(crate) fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// `attribute` of `element`, which was matched by `css`.
pub(crate) fn attr<'a>(
    element: ElementRef<'a>,
    css: &'static str,
    attribute: &'static str,
) -> Result<&'a str, ExtractionFailure> {
    element
        .value()
        .attr(attribute)
        .ok_or(ExtractionFailure::MissingAttribute {
            selector: css,
            attribute,
        })
}

/// Resolve `href` against the page it was found on.
pub(crate) fn absolute(page_url: &str, href: &str) -> Result<String, ExtractionFailure> {
    Ok(Url::parse(page_url)?.join(href)?.to_string())
}

pub(crate) fn non_empty(field: &'static str, value: String) -> Result<String, ExtractionFailure> {
    if value.is_empty() {
        Err(ExtractionFailure::EmptyField(field))
    } else {
        Ok(value)
    }
}
