use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;

use crate::common::ArticleStub;

/// Artid prefixes for non-article entries: software updates, announcements,
/// and placeholder tags
const SKIP_PREFIXES: [&str; 3] = ["up", "an", "emptytag"];

const LISTING_TIMEOUT: Duration = Duration::from_secs(30);

lazy_static! {
    static ref ARTID_PATTERN: Regex = Regex::new(r#"article=([^"&]+)"#).unwrap();
    // well-formed artids are a letter prefix followed by digits (st0001)
    static ref ARTID_SHAPE: Regex = Regex::new(r"^[a-z]+\d+").unwrap();
}

/// Fetch the keyword-search page with an empty query, which the site treats
/// as "list all", and parse every article link into a stub.
pub async fn fetch_article_listing(client: &Client, base_url: &str) -> Result<Vec<ArticleStub>> {
    let search_url = format!("{}/sjsearch.html?choice=keyword&q=", base_url);

    let body = client
        .get(&search_url)
        .timeout(LISTING_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("Failed to fetch search page: {}", search_url))?
        .error_for_status()
        .context("Search page returned an error status")?
        .text()
        .await
        .context("Failed to read search page body")?;

    Ok(parse_article_listing(&body))
}

/// Extract article stubs from the search page HTML in document order,
/// dropping non-article entries and keeping only the first occurrence of
/// each artid.
pub fn parse_article_listing(html: &str) -> Vec<ArticleStub> {
    let document = Html::parse_document(html);
    let link_selector =
        Selector::parse(r#"a[href*="article.html?article="]"#).expect("static selector");

    let mut stubs = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipped = 0usize;

    for link in document.select(&link_selector) {
        let href = link.value().attr("href").unwrap_or("");
        let Some(cap) = ARTID_PATTERN.captures(href) else {
            continue;
        };
        let art_id = cap[1].trim().to_string();

        let art_id_lower = art_id.to_lowercase();
        if !ARTID_SHAPE.is_match(&art_id_lower) {
            skipped += 1;
            continue;
        }
        if SKIP_PREFIXES.iter().any(|p| art_id_lower.starts_with(p)) {
            skipped += 1;
            continue;
        }

        // First occurrence wins; a skipped first occurrence still claims
        // the artid
        if !seen.insert(art_id.clone()) {
            continue;
        }

        let title = link.text().collect::<String>().trim().to_string();
        if title.to_lowercase().contains("software update") {
            skipped += 1;
            continue;
        }

        stubs.push(ArticleStub::new(art_id, title));
    }

    info!(
        "Found {} articles (skipped {} non-article entries)",
        stubs.len(),
        skipped
    );
    stubs
}
