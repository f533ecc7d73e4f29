use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::parse::parse_citation_message;
use crate::common::CitationRecord;

/// Crossref REST endpoint for works
pub const CROSSREF_API: &str = "https://api.crossref.org/works";

const RETRY_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_THROTTLE: Duration = Duration::from_millis(200);
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Crossref API client: a fixed throttle before every attempt, a bounded
/// retry budget, and a long cooldown on HTTP 429. A 429 consumes one of
/// the fixed attempts rather than drawing on a separate budget.
#[derive(Clone)]
pub struct CrossrefClient {
    client: Client,
    base_url: String,
    throttle: Duration,
    cooldown: Duration,
}

impl CrossrefClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, CROSSREF_API)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle: REQUEST_THROTTLE,
            cooldown: RATE_LIMIT_COOLDOWN,
        }
    }

    /// Shrink the fixed delays so retry paths finish quickly under test
    #[cfg(test)]
    pub fn with_timings(mut self, throttle: Duration, cooldown: Duration) -> Self {
        self.throttle = throttle;
        self.cooldown = cooldown;
        self
    }

    /// Look up citation metadata for a DOI. Returns an empty record when
    /// the DOI is empty or every attempt fails; a failed lookup degrades
    /// the record, it never aborts the run.
    pub async fn get_citation(&self, doi: &str) -> CitationRecord {
        if doi.is_empty() {
            return CitationRecord::default();
        }

        let url = format!("{}/{}", self.base_url, doi);

        for attempt in 0..RETRY_ATTEMPTS {
            tokio::time::sleep(self.throttle).await;

            let response = match self.client.get(&url).timeout(REQUEST_TIMEOUT).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for DOI {}: {}",
                        attempt + 1,
                        RETRY_ATTEMPTS,
                        doi,
                        e
                    );
                    self.backoff(attempt).await;
                    continue;
                }
            };

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                warn!(
                    "Rate limit hit for DOI {}. Waiting {} seconds...",
                    doi,
                    self.cooldown.as_secs()
                );
                tokio::time::sleep(self.cooldown).await;
                continue;
            }

            let response = match response.error_for_status() {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for DOI {}: {}",
                        attempt + 1,
                        RETRY_ATTEMPTS,
                        doi,
                        e
                    );
                    self.backoff(attempt).await;
                    continue;
                }
            };

            let data: serde_json::Value = match response.json().await {
                Ok(data) => data,
                Err(e) => {
                    error!("Error parsing citation for DOI {}: {}", doi, e);
                    return CitationRecord::default();
                }
            };

            let Some(message) = data.get("message") else {
                return CitationRecord::default();
            };

            debug!("Successfully fetched citation for DOI: {}", doi);
            return parse_citation_message(doi, message);
        }

        error!("Failed to fetch citation for DOI: {}", doi);
        CitationRecord::default()
    }

    /// Exponential backoff between attempts; no sleep after the last one
    async fn backoff(&self, attempt: u32) {
        if attempt + 1 < RETRY_ATTEMPTS {
            tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
        }
    }
}
