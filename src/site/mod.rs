pub mod article;
pub mod landing;
pub mod listing;

pub use article::resolve_article_doi;
pub use landing::{fetch_landing_info, LandingInfo};
pub use listing::fetch_article_listing;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;

/// Stata Journal site root
pub const BASE_URL: &str = "https://www.stata-journal.com";

/// Sage landing pages for Stata Journal DOIs
pub const SAGE_BASE: &str = "https://journals.sagepub.com";

/// Browser-like agent string; the site rejects obvious bot agents
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Create the shared HTTP client used for all page fetches
pub fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}
