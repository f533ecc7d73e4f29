use anyhow::Result;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

const LANDING_TIMEOUT: Duration = Duration::from_secs(15);

lazy_static! {
    static ref WHITESPACE_PATTERN: Regex = Regex::new(r"\s+").unwrap();
}

/// Metadata scraped from the publisher landing page. Used as a fallback
/// enrichment source when Crossref has nothing for a resolved DOI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandingInfo {
    pub title: String,
    pub authors: String,
    pub first_author_family: String,
    pub first_author_given: String,
    pub author_count: i64,
    pub abstract_text: String,
    pub page: String,
    pub pdf_url: String,
}

/// Fetch the Sage landing page for a DOI and scrape author, abstract,
/// title, page-range, and PDF metadata. Any failure yields an empty result
/// and a debug log; this path never aborts the run.
pub async fn fetch_landing_info(
    client: &Client,
    sage_base: &str,
    doi: &str,
    title_fallback: &str,
) -> LandingInfo {
    if doi.is_empty() {
        return LandingInfo::default();
    }

    let url = format!("{}/doi/{}", sage_base, doi);

    match fetch_page(client, &url).await {
        Ok(body) => parse_landing_page(&body, sage_base, title_fallback),
        Err(e) => {
            debug!("Failed to get web info for DOI {}: {}", doi, e);
            LandingInfo::default()
        }
    }
}

async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let body = client
        .get(url)
        .timeout(LANDING_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Pure extraction over the landing-page HTML. Each field tries a small
/// cascade of selectors because Sage has shipped several page layouts.
pub fn parse_landing_page(html: &str, sage_base: &str, title_fallback: &str) -> LandingInfo {
    let document = Html::parse_document(html);
    let mut info = LandingInfo::default();

    let author_names = extract_author_names(&document);
    if !author_names.is_empty() {
        info.author_count = author_names.len() as i64;
        let (family, given) = split_author_name(&author_names[0]);
        info.first_author_family = family;
        info.first_author_given = given;
        info.authors = author_names.join("; ");
    }

    info.abstract_text = select_text(
        &document,
        &[
            "div.abstractSection",
            r#"section[data-wrapper="abstract"]"#,
            r#"div.article-section__content[role="paragraph"]"#,
        ],
    );

    info.title = select_text(&document, &["h1.citation__title", "h1.article-title"]);
    if info.title.is_empty() {
        info.title = title_fallback.to_string();
    }

    info.page = select_text(&document, &["span.article-page-range", "span.page-range"]);

    info.pdf_url = extract_pdf_url(&document, sage_base);

    info
}

fn extract_author_names(document: &Html) -> Vec<String> {
    let section_selector = Selector::parse(
        "div.accordion-tabbed.loa-accordion, div.author-list",
    )
    .expect("static selector");
    let name_selector =
        Selector::parse(r#"a[class*="author"], span[class*="author"]"#).expect("static selector");

    let Some(section) = document.select(&section_selector).next() else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for elem in section.select(&name_selector) {
        let name = collapse_whitespace(&elem.text().collect::<String>());
        if name.len() > 1 && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Split a display name into (family, given): "Family, Given" when a comma
/// is present, otherwise the last word is taken as the family name.
fn split_author_name(name: &str) -> (String, String) {
    if let Some((family, given)) = name.split_once(',') {
        return (family.trim().to_string(), given.trim().to_string());
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (only.to_string(), String::new()),
        [given @ .., family] => (family.to_string(), given.join(" ")),
    }
}

fn select_text(document: &Html, selectors: &[&str]) -> String {
    for selector_str in selectors {
        let selector = Selector::parse(selector_str).expect("static selector");
        if let Some(elem) = document.select(&selector).next() {
            let text = collapse_whitespace(&elem.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

fn extract_pdf_url(document: &Html, sage_base: &str) -> String {
    let pdf_selector =
        Selector::parse(r#"a.show-pdf, a[href*="/doi/pdf/"]"#).expect("static selector");

    let Some(link) = document.select(&pdf_selector).next() else {
        return String::new();
    };
    let href = link.value().attr("href").unwrap_or("");

    if href.starts_with('/') {
        format!("{}{}", sage_base, href)
    } else {
        href.to_string()
    }
}

fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE_PATTERN.replace_all(raw.trim(), " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAGE_BASE: &str = "https://journals.sagepub.com";

    const LANDING_HTML: &str = r##"
        <html><body>
        <h1 class="citation__title">Estimation of average treatment effects</h1>
        <div class="accordion-tabbed loa-accordion">
            <a class="author-name" href="/author/doe">Doe, Jane</a>
            <span class="author-name">Smith, John</span>
        </div>
        <div class="abstractSection">
            <p>We present   a new
            estimator.</p>
        </div>
        <span class="article-page-range">1-21</span>
        <a class="show-pdf" href="/doi/pdf/10.1177/1536867X0600600101">PDF</a>
        </body></html>
    "##;

    #[test]
    fn test_parse_landing_authors() {
        let info = parse_landing_page(LANDING_HTML, SAGE_BASE, "");
        assert_eq!(info.authors, "Doe, Jane; Smith, John");
        assert_eq!(info.author_count, 2);
        assert_eq!(info.first_author_family, "Doe");
        assert_eq!(info.first_author_given, "Jane");
    }

    #[test]
    fn test_parse_landing_abstract_collapses_whitespace() {
        let info = parse_landing_page(LANDING_HTML, SAGE_BASE, "");
        assert_eq!(info.abstract_text, "We present a new estimator.");
    }

    #[test]
    fn test_parse_landing_title_and_page() {
        let info = parse_landing_page(LANDING_HTML, SAGE_BASE, "ignored");
        assert_eq!(info.title, "Estimation of average treatment effects");
        assert_eq!(info.page, "1-21");
    }

    #[test]
    fn test_parse_landing_title_fallback() {
        let info = parse_landing_page("<html></html>", SAGE_BASE, "Working title");
        assert_eq!(info.title, "Working title");
    }

    #[test]
    fn test_parse_landing_pdf_absolutized() {
        let info = parse_landing_page(LANDING_HTML, SAGE_BASE, "");
        assert_eq!(
            info.pdf_url,
            "https://journals.sagepub.com/doi/pdf/10.1177/1536867X0600600101"
        );
    }

    #[test]
    fn test_split_author_name_no_comma() {
        assert_eq!(
            split_author_name("Jane Q Doe"),
            ("Doe".to_string(), "Jane Q".to_string())
        );
        assert_eq!(split_author_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[tokio::test]
    async fn test_fetch_landing_error_is_default() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let client = Client::new();
        let info = fetch_landing_info(&client, &server.url(), "10.1177/x", "t").await;
        assert_eq!(info, LandingInfo::default());
    }

    #[tokio::test]
    async fn test_fetch_landing_empty_doi_skips_request() {
        let client = Client::new();
        let info = fetch_landing_info(&client, SAGE_BASE, "", "t").await;
        assert_eq!(info, LandingInfo::default());
    }
}
