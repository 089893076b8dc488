//! Page retrieval: plain HTTP GET, or a rendered page from a browser session.
//!
//! Nothing is cached; every call goes back to the network.

use crate::browser::BrowserSession;
use crate::config::ScrapeConfig;
use crate::error::FetchError;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument};

/// Build the HTTP client used for static fetches.
pub fn http_client(config: &ScrapeConfig) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .timeout(config.http_timeout())
        .user_agent(config.user_agent.clone())
        .build()?)
}

/// GET `url` and return the body. Non-success statuses are errors.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_static(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.text().await?;
    debug!(bytes = body.len(), "Fetched static page");
    Ok(body)
}

/// Navigate `session` to `url`, wait `settle` for client-side rendering,
/// then return the rendered HTML.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_rendered<S: BrowserSession>(
    session: &mut S,
    url: &str,
    settle: Duration,
) -> Result<String, FetchError> {
    session.visit(url).await?;
    sleep(settle).await;
    let html = session.html().await?;
    debug!(bytes = html.len(), "Fetched rendered page");
    Ok(html)
}
