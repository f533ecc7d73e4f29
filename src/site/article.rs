use anyhow::Result;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);

lazy_static! {
    /// DOI embedded in a Sage citation link, with an optional pdf/ segment
    static ref SAGE_DOI_PATTERN: Regex = Regex::new(r"doi/(pdf/)?(10\.\d+/[^?&#]+)").unwrap();
    /// Bare DOI inside a generic doi.org resolver link
    static ref DOI_ORG_PATTERN: Regex = Regex::new(r"10\.\d+/[^?&#\s]+").unwrap();
}

/// Fetch an article's detail page and pull its DOI out of the outbound
/// links. Returns an empty string when the page has no recognizable DOI
/// link or the fetch fails; resolution failures never abort the run.
pub async fn resolve_article_doi(client: &Client, base_url: &str, art_id: &str) -> String {
    let url = format!("{}/article.html?article={}", base_url, art_id);

    match fetch_page(client, &url).await {
        Ok(body) => extract_doi_from_page(&body),
        Err(e) => {
            debug!("Failed to get DOI for {}: {}", art_id, e);
            String::new()
        }
    }
}

async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let body = client
        .get(url)
        .timeout(DETAIL_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Search rendered links for a Sage citation link first, then fall back to
/// any generic doi.org reference. Extracted DOIs are normalized to
/// lowercase.
pub fn extract_doi_from_page(html: &str) -> String {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").expect("static selector");

    let mut doi_org_fallback = String::new();

    for link in document.select(&link_selector) {
        let href = link.value().attr("href").unwrap_or("");

        if href.contains("journals.sagepub.com/doi/") {
            if let Some(cap) = SAGE_DOI_PATTERN.captures(href) {
                return cap[2].to_lowercase();
            }
        }

        if doi_org_fallback.is_empty() && href.contains("doi.org/") {
            if let Some(m) = DOI_ORG_PATTERN.find(href) {
                doi_org_fallback = m.as_str().to_lowercase();
            }
        }
    }

    doi_org_fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sage_doi() {
        let html = r#"<a href="https://journals.sagepub.com/doi/10.1177/1536867X0600600101">Read</a>"#;
        assert_eq!(extract_doi_from_page(html), "10.1177/1536867x0600600101");
    }

    #[test]
    fn test_extract_sage_pdf_doi() {
        let html = r#"<a href="https://journals.sagepub.com/doi/pdf/10.1177/1536867X0900900101">PDF</a>"#;
        assert_eq!(extract_doi_from_page(html), "10.1177/1536867x0900900101");
    }

    #[test]
    fn test_extract_sage_doi_strips_query() {
        let html = r#"<a href="https://journals.sagepub.com/doi/10.1177/1536867X05333?download=true">x</a>"#;
        assert_eq!(extract_doi_from_page(html), "10.1177/1536867x05333");
    }

    #[test]
    fn test_doi_org_fallback() {
        let html = r#"
            <a href="https://example.com/about.html">About</a>
            <a href="https://doi.org/10.2307/2234208">Crossref</a>
        "#;
        assert_eq!(extract_doi_from_page(html), "10.2307/2234208");
    }

    #[test]
    fn test_sage_link_preferred_over_doi_org() {
        let html = r#"
            <a href="https://doi.org/10.9999/other">other</a>
            <a href="https://journals.sagepub.com/doi/10.1177/1536867X1001000101">sage</a>
        "#;
        assert_eq!(extract_doi_from_page(html), "10.1177/1536867x1001000101");
    }

    #[test]
    fn test_no_doi_links_yields_empty() {
        let html = r#"<a href="article.html?article=st0001">self</a>"#;
        assert_eq!(extract_doi_from_page(html), "");
    }

    #[tokio::test]
    async fn test_resolve_doi_fetch_error_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let client = Client::new();
        let doi = resolve_article_doi(&client, &server.url(), "st0001").await;
        assert_eq!(doi, "");
    }

    #[tokio::test]
    async fn test_resolve_doi_from_server() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/article.html")
            .match_query(mockito::Matcher::UrlEncoded(
                "article".to_string(),
                "st0001".to_string(),
            ))
            .with_status(200)
            .with_body(r#"<a href="https://journals.sagepub.com/doi/10.1177/1536867X0100100101">cite</a>"#)
            .create_async()
            .await;

        let client = Client::new();
        let doi = resolve_article_doi(&client, &server.url(), "st0001").await;
        assert_eq!(doi, "10.1177/1536867x0100100101");
    }
}
