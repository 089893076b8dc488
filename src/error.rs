//! Error types for fetching, extraction, sessions, persistence and configuration.
//!
//! Failures fall into two groups. Per-source failures ([`FetchError`],
//! [`ExtractionFailure`]) are absorbed by the pipeline and replaced with a
//! fallback fragment. Run-level failures ([`SessionError`], [`StoreError`])
//! abort the run and are surfaced through [`ScrapeError`].

use std::time::Duration;
use thiserror::Error;

/// A page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("no link containing text {0:?}")]
    LinkNotFound(String),

    #[error("still on {url} after {waited:?}")]
    NavigationTimeout { url: String, waited: Duration },
}

/// One source failed to yield its fields.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no element matches `{selector}`")]
    MissingElement { selector: &'static str },

    #[error("element `{selector}` has no `{attribute}` attribute")]
    MissingAttribute {
        selector: &'static str,
        attribute: &'static str,
    },

    #[error("field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("expected {expected} entries, found {found}")]
    UnexpectedCount { expected: usize, found: usize },

    #[error("navigation failed: {0}")]
    Navigation(String),
}

/// The browser session could not be started.
#[derive(Debug, Error)]
#[error("failed to start browser session: {0}")]
pub struct SessionError(pub String);

/// Record persistence failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record has been stored yet")]
    NotFound,

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config field `{field}` is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// A run-level failure: no record is produced or persisted.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("record is missing key `{0}`")]
    IncompleteRecord(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_failure_display() {
        let e = ExtractionFailure::MissingElement { selector: "li.slide" };
        assert_eq!(e.to_string(), "no element matches `li.slide`");

        let e = ExtractionFailure::UnexpectedCount {
            expected: 4,
            found: 2,
        };
        assert_eq!(e.to_string(), "expected 4 entries, found 2");
    }

    #[test]
    fn test_fetch_error_wraps_into_extraction_failure() {
        let fetch = FetchError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        let e: ExtractionFailure = fetch.into();
        assert!(matches!(e, ExtractionFailure::Fetch(_)));
        assert_eq!(e.to_string(), "https://example.com answered with status 503");
    }

    #[test]
    fn test_navigation_timeout_display() {
        let e = FetchError::NavigationTimeout {
            url: "https://example.com/index".to_string(),
            waited: Duration::from_millis(250),
        };
        assert_eq!(e.to_string(), "still on https://example.com/index after 250ms");
    }

    #[test]
    fn test_session_error_into_scrape_error() {
        let e: ScrapeError = SessionError("chrome not found".to_string()).into();
        assert!(e.to_string().contains("chrome not found"));
    }
}
