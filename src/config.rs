//! Runtime configuration for the scrape pipeline.
//!
//! All target URLs, the fallback image and the settle delay live in
//! [`ScrapeConfig`], which is handed to the pipeline at construction. A YAML
//! file may override any subset of the defaults:
//!
//! ```yaml
//! settle_delay_ms: 3000
//! browser:
//!   headless: false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Wikimedia Mars image used whenever a source cannot supply one.
pub const DEFAULT_IMAGE_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/0/02/OSIRIS_Mars_true_color.jpg/600px-OSIRIS_Mars_true_color.jpg";

/// Target pages and timing knobs for one pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScrapeConfig {
    /// News index page; the first slide is the latest story.
    pub news_url: String,
    /// Space-images gallery whose carousel links to the featured image.
    pub featured_image_url: String,
    /// Social feed carrying the weather reports.
    pub weather_url: String,
    /// Page whose first table holds the planet profile.
    pub facts_url: String,
    /// Search results listing the four hemisphere entries.
    pub hemispheres_url: String,
    /// Substituted for any image that cannot be scraped.
    pub default_image_url: String,
    /// Wait after each browser navigation, in milliseconds.
    pub settle_delay_ms: u64,
    /// Timeout for static HTTP fetches, in seconds.
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub browser: BrowserOptions,
}

/// How the Chromium session is launched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,
    /// Extra command-line switches passed to the browser.
    pub args: Vec<String>,
    /// Longest wait for a click or history step to leave the current page,
    /// in seconds.
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            args: vec!["--no-sandbox".to_string(), "--disable-gpu".to_string()],
            navigation_timeout_secs: 30,
        }
    }
}

impl BrowserOptions {
    /// Upper bound on waiting for an in-page navigation to start.
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            news_url: "https://mars.nasa.gov/news/".to_string(),
            featured_image_url: "https://www.jpl.nasa.gov/spaceimages/?search=&category=Mars"
                .to_string(),
            weather_url: "https://twitter.com/marswxreport?lang=en".to_string(),
            facts_url: "https://space-facts.com/mars/".to_string(),
            hemispheres_url: "https://astrogeology.usgs.gov/search/results?q=hemisphere+enhanced&k1=target&v1=Mars".to_string(),
            default_image_url: DEFAULT_IMAGE_URL.to_string(),
            settle_delay_ms: 2000,
            http_timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            browser: BrowserOptions::default(),
        }
    }
}

impl ScrapeConfig {
    /// Load a YAML config file; keys it omits keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: ScrapeConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        info!("Loaded configuration");
        Ok(config)
    }

    /// Load `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Check that every configured URL parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("news_url", &self.news_url),
            ("featured_image_url", &self.featured_image_url),
            ("weather_url", &self.weather_url),
            ("facts_url", &self.facts_url),
            ("hemispheres_url", &self.hemispheres_url),
            ("default_image_url", &self.default_image_url),
        ];
        for (field, value) in fields {
            Url::parse(value).map_err(|source| ConfigError::InvalidUrl { field, source })?;
        }
        Ok(())
    }

    /// Pause applied after each browser navigation before the page is read.
    ///
    /// # Returns
    ///
    /// `settle_delay_ms` as a [`Duration`]; zero disables the pause.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Whole-request timeout for static fetches.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
