//! Data models for the merged Mars record and the fragments it is built from.
//!
//! - [`MergedRecord`]: the six-key document handed to the store
//! - [`Fragment`]: the partial record one extractor produces
//! - [`RecordBuilder`]: merges fragments, refusing to build an incomplete record
//! - [`HemisphereEntry`], [`FactsTable`]: per-source payloads

#[cfg(test)]
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use html_escape::encode_text;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Placeholder text used by the news extractor.
pub const NO_RESULT: &str = "no result";
/// Placeholder text used by the weather extractor.
pub const WEATHER_NOT_FOUND: &str = "Data not found!";
/// Placeholder title used by the hemisphere walker.
pub const HEMISPHERE_NOT_FOUND: &str = "Not Found";
/// Number of hemisphere entries every record carries.
pub const HEMISPHERE_COUNT: usize = 4;

/// Record keys, in merge order.
pub static RECORD_KEYS: [&str; 6] = [
    "news_title",
    "news_p",
    "featured_image_url",
    "mars_weather",
    "facts_table",
    "hemisphere_image_urls",
];

/// The one document a pipeline run produces.
///
/// Every field is always populated; sources that failed carry their
/// placeholder value instead.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MergedRecord {
    pub news_title: String,
    pub news_p: String,
    pub featured_image_url: String,
    pub mars_weather: String,
    /// Pre-rendered `<table>` markup.
    pub facts_table: String,
    pub hemisphere_image_urls: Vec<HemisphereEntry>,
}

#[cfg(test)]
impl MergedRecord {
    /// A record where every source took its fallback.
    pub fn fallback(config: &ScrapeConfig) -> Self {
        Self {
            news_title: NO_RESULT.to_string(),
            news_p: NO_RESULT.to_string(),
            featured_image_url: config.default_image_url.clone(),
            mars_weather: WEATHER_NOT_FOUND.to_string(),
            facts_table: FactsTable::placeholder().to_html(),
            hemisphere_image_urls: HemisphereEntry::placeholders(&config.default_image_url),
        }
    }
}

/// One hemisphere title with its full-resolution image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HemisphereEntry {
    pub title: String,
    pub image_url: String,
}

impl HemisphereEntry {
    /// The four `Not Found` entries substituted when the walk fails.
    pub fn placeholders(default_image_url: &str) -> Vec<Self> {
        vec![
            Self {
                title: HEMISPHERE_NOT_FOUND.to_string(),
                image_url: default_image_url.to_string(),
            };
            HEMISPHERE_COUNT
        ]
    }
}

/// A `(description, value)` row of the facts table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRow {
    pub description: String,
    pub value: String,
}

/// Facts rows keyed by description, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactsTable {
    pub rows: Vec<FactRow>,
}

impl FactsTable {
    /// The single `(none, none)` row used when the source table is unusable.
    pub fn placeholder() -> Self {
        Self {
            rows: vec![FactRow {
                description: "none".to_string(),
                value: "none".to_string(),
            }],
        }
    }

    /// Render as embeddable table markup indexed by description.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<table border=\"1\" class=\"dataframe table table-sm table-striped\">\n");
        html.push_str("  <thead>\n");
        html.push_str("    <tr style=\"text-align: left;\">\n");
        html.push_str("      <th></th>\n");
        html.push_str("      <th>value</th>\n");
        html.push_str("    </tr>\n");
        html.push_str("    <tr>\n");
        html.push_str("      <th>description</th>\n");
        html.push_str("      <th></th>\n");
        html.push_str("    </tr>\n");
        html.push_str("  </thead>\n");
        html.push_str("  <tbody>\n");
        for row in &self.rows {
            // Writing into a String cannot fail.
            let _ = write!(
                html,
                "    <tr>\n      <th>{}</th>\n      <td>{}</td>\n    </tr>\n",
                encode_text(&row.description),
                encode_text(&row.value),
            );
        }
        html.push_str("  </tbody>\n");
        html.push_str("</table>");
        html
    }
}

/// A partial record produced by one extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    News { title: String, paragraph: String },
    FeaturedImage(String),
    Weather(String),
    Facts(String),
    Hemispheres(Vec<HemisphereEntry>),
}

impl Fragment {
    /// Record keys this fragment writes.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Fragment::News { .. } => &RECORD_KEYS[0..2],
            Fragment::FeaturedImage(_) => &RECORD_KEYS[2..3],
            Fragment::Weather(_) => &RECORD_KEYS[3..4],
            Fragment::Facts(_) => &RECORD_KEYS[4..5],
            Fragment::Hemispheres(_) => &RECORD_KEYS[5..6],
        }
    }
}

/// Accumulates fragments into a [`MergedRecord`].
///
/// Merging is last-writer-wins per key.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    news_title: Option<String>,
    news_p: Option<String>,
    featured_image_url: Option<String>,
    mars_weather: Option<String>,
    facts_table: Option<String>,
    hemisphere_image_urls: Option<Vec<HemisphereEntry>>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, fragment: Fragment) -> &mut Self {
        match fragment {
            Fragment::News { title, paragraph } => {
                self.news_title = Some(title);
                self.news_p = Some(paragraph);
            }
            Fragment::FeaturedImage(url) => self.featured_image_url = Some(url),
            Fragment::Weather(text) => self.mars_weather = Some(text),
            Fragment::Facts(html) => self.facts_table = Some(html),
            Fragment::Hemispheres(entries) => self.hemisphere_image_urls = Some(entries),
        }
        self
    }

    /// Finish the record; fails if any key was never merged.
    pub fn build(self) -> Result<MergedRecord, ScrapeError> {
        Ok(MergedRecord {
            news_title: self
                .news_title
                .ok_or(ScrapeError::IncompleteRecord("news_title"))?,
            news_p: self.news_p.ok_or(ScrapeError::IncompleteRecord("news_p"))?,
            featured_image_url: self
                .featured_image_url
                .ok_or(ScrapeError::IncompleteRecord("featured_image_url"))?,
            mars_weather: self
                .mars_weather
                .ok_or(ScrapeError::IncompleteRecord("mars_weather"))?,
            facts_table: self
                .facts_table
                .ok_or(ScrapeError::IncompleteRecord("facts_table"))?,
            hemisphere_image_urls: self
                .hemisphere_image_urls
                .ok_or(ScrapeError::IncompleteRecord("hemisphere_image_urls"))?,
        })
    }
}
