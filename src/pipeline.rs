//! The scrape pipeline: one browser session, five sources, one record.
//!
//! [`Pipeline::run`] opens a session, runs the extractors in a fixed order
//! (news, featured image, weather, facts, hemispheres), merges their
//! fragments and closes the session before returning. A source that fails
//! contributes its fallback fragment instead, so the record is always
//! complete. Only a session that cannot be started fails the run.

use crate::browser::{BrowserSession, SessionLauncher};
use crate::config::ScrapeConfig;
use crate::error::{ExtractionFailure, FetchError, ScrapeError};
use crate::fetch::http_client;
use crate::models::{Fragment, MergedRecord, RecordBuilder};
use crate::scrapers::{facts, featured_image, hemispheres, news, weather};
use crate::store::RecordStore;
use reqwest::Client;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Runs the extractors against the configured sources.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ScrapeConfig,
    client: Client,
}

impl Pipeline {
    /// Build a pipeline over `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Target URLs, fallbacks and timing for every run
    ///
    /// # Returns
    ///
    /// The pipeline, or an error if the HTTP client for static sources
    /// cannot be built.
    pub fn new(config: ScrapeConfig) -> Result<Self, FetchError> {
        let client = http_client(&config)?;
        Ok(Self { config, client })
    }

    /// Configuration every run uses.
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Scrape every source into a fresh record.
    ///
    /// The session from `launcher` is closed on every path out of this
    /// function once it has been started. A failed close is logged and
    /// does not affect the result.
    ///
    /// # Arguments
    ///
    /// * `launcher` - Starts the browser session used by the rendered sources
    ///
    /// # Returns
    ///
    /// A complete [`MergedRecord`], or [`ScrapeError::Session`] if no session
    /// could be started.
    #[instrument(level = "info", skip_all)]
    pub async fn run<L: SessionLauncher>(&self, launcher: &L) -> Result<MergedRecord, ScrapeError> {
        let start = Instant::now();
        let mut session = launcher.launch().await.inspect_err(|e| {
            error!(error = %e, "Cannot start browser session; aborting run");
        })?;

        let record = self.extract_all(&mut session).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Browser session did not close cleanly");
        }

        let record = record?;
        let elapsed = start.elapsed();
        info!(?elapsed, millis = elapsed.as_millis() as u64, "Scrape complete");
        Ok(record)
    }

    async fn extract_all<S: BrowserSession>(
        &self,
        session: &mut S,
    ) -> Result<MergedRecord, ScrapeError> {
        let config = self.config();
        let mut fallbacks = 0usize;
        let mut builder = RecordBuilder::new();

        let fragment = news::scrape(session, config).await;
        builder.merge(absorb("news", fragment, &mut fallbacks, news::fallback));

        let fragment = featured_image::scrape(session, config).await;
        builder.merge(absorb("featured_image", fragment, &mut fallbacks, || {
            featured_image::fallback(config)
        }));

        let fragment = weather::scrape(&self.client, config).await;
        builder.merge(absorb("weather", fragment, &mut fallbacks, weather::fallback));

        let fragment = facts::scrape(&self.client, config).await;
        builder.merge(absorb("facts", fragment, &mut fallbacks, facts::fallback));

        let fragment = hemispheres::scrape(session, config).await;
        builder.merge(absorb("hemispheres", fragment, &mut fallbacks, || {
            hemispheres::fallback(config)
        }));

        info!(fallbacks, "Merged all sources");
        builder.build()
    }
}

/// Keep a source's fragment, or log the failure and substitute its fallback.
fn absorb(
    source: &'static str,
    result: Result<Fragment, ExtractionFailure>,
    fallbacks: &mut usize,
    fallback: impl FnOnce() -> Fragment,
) -> Fragment {
    result.unwrap_or_else(|e| {
        let fragment = fallback();
        warn!(source, keys = ?fragment.keys(), error = %e, "Source failed; using fallback");
        *fallbacks += 1;
        fragment
    })
}

/// Run the pipeline and replace the stored record with the result.
///
/// Nothing is written when the run fails.
///
/// # Arguments
///
/// * `pipeline` - The configured pipeline
/// * `launcher` - Starts the browser session for this run
/// * `store` - Receives the new record
///
/// # Returns
///
/// The record that was stored.
#[instrument(level = "info", skip_all)]
pub async fn scrape_and_persist<L, R>(
    pipeline: &Pipeline,
    launcher: &L,
    store: &R,
) -> Result<MergedRecord, ScrapeError>
where
    L: SessionLauncher,
    R: RecordStore,
{
    let record = pipeline.run(launcher).await?;
    store.upsert_singleton(&record).await.inspect_err(|e| {
        error!(error = %e, "Failed to store record");
    })?;
    Ok(record)
}
