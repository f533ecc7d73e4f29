use futures::stream::{self, StreamExt};
use log::{error, info};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::citation::CrossrefClient;
use crate::common::{
    create_count_progress_bar, parse_count, ArticleRecord, ArticleStub, CitationRecord,
};
use crate::site::{self, LandingInfo};

/// Fixed worker-pool size; kept small to stay within Crossref rate limits
const MAX_WORKERS: usize = 3;

/// Log a milestone every N completed articles
const PROGRESS_MILESTONE: usize = 50;

/// Process all stubs through resolve -> lookup -> merge under a fixed pool
/// of workers. Completion order is unconstrained; the dataset writer imposes
/// the final ordering. Items whose task fails are logged with their
/// submission index and dropped.
pub async fn assemble_records(
    client: &Client,
    crossref: &CrossrefClient,
    base_url: &str,
    sage_base: &str,
    stubs: Vec<ArticleStub>,
) -> Vec<ArticleRecord> {
    let total = stubs.len();
    let semaphore = Arc::new(Semaphore::new(MAX_WORKERS));
    let processed = Arc::new(AtomicUsize::new(0));
    let progress = create_count_progress_bar(total as u64);

    let results: Vec<(usize, Result<ArticleRecord, tokio::task::JoinError>)> =
        stream::iter(stubs.into_iter().enumerate())
            .map(|(index, stub)| {
                let client = client.clone();
                let crossref = crossref.clone();
                let base_url = base_url.to_string();
                let sage_base = sage_base.to_string();
                let semaphore = semaphore.clone();
                let processed = processed.clone();
                let progress = progress.clone();

                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .expect("semaphore should never be closed");

                    // spawn so a panic in one item is caught and only that
                    // item is dropped
                    let handle = tokio::spawn(async move {
                        process_article(&client, &crossref, &base_url, &sage_base, stub).await
                    });
                    let result = handle.await;

                    let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % PROGRESS_MILESTONE == 0 {
                        info!("Progress: {}/{} articles processed", done, total);
                    }
                    progress.inc(1);

                    (index, result)
                }
            })
            .buffer_unordered(MAX_WORKERS * 2)
            .collect()
            .await;

    progress.finish_with_message("Article processing complete");

    let mut records = Vec::with_capacity(total);
    for (index, result) in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) => error!("Error processing article {}: {}", index, e),
        }
    }
    records
}

/// Build one record for a stub: resolve the DOI, look it up on Crossref,
/// and merge with fallbacks at every step.
async fn process_article(
    client: &Client,
    crossref: &CrossrefClient,
    base_url: &str,
    sage_base: &str,
    stub: ArticleStub,
) -> ArticleRecord {
    let doi = site::resolve_article_doi(client, base_url, &stub.art_id).await;

    if doi.is_empty() {
        return record_from_stub(&stub, base_url);
    }

    let citation = crossref.get_citation(&doi).await;

    if citation.is_empty() {
        // Crossref had nothing; scrape the publisher landing page before
        // settling for stub data
        let landing = site::fetch_landing_info(client, sage_base, &doi, &stub.title_web).await;
        return record_from_landing(&stub, &doi, landing);
    }

    merge_citation(&stub, &doi, citation)
}

/// No DOI: stub data only, URL pointing at the article's own detail page
fn record_from_stub(stub: &ArticleStub, base_url: &str) -> ArticleRecord {
    ArticleRecord {
        art_id: stub.art_id.clone(),
        title: stub.title_web.clone(),
        volume: stub.volume,
        number: stub.number,
        year: stub.year,
        url: format!("{}/article.html?article={}", base_url, stub.art_id),
        ..Default::default()
    }
}

/// DOI resolved but the citation lookup came back empty: keep the DOI,
/// take whatever the landing page recovered, and point the URL at the
/// generic DOI resolver.
fn record_from_landing(stub: &ArticleStub, doi: &str, landing: LandingInfo) -> ArticleRecord {
    let title = if landing.title.is_empty() {
        stub.title_web.clone()
    } else {
        landing.title
    };

    ArticleRecord {
        art_id: stub.art_id.clone(),
        title,
        volume: stub.volume,
        number: stub.number,
        year: stub.year,
        doi: doi.to_string(),
        authors: landing.authors,
        first_author_family: landing.first_author_family,
        first_author_given: landing.first_author_given,
        author_count: landing.author_count,
        abstract_text: landing.abstract_text,
        page: landing.page,
        pdf_url: landing.pdf_url,
        url: format!("https://doi.org/{}", doi),
        ..Default::default()
    }
}

/// Citation data takes precedence; title, volume, number, and year fall
/// back to stub values when the citation field is empty.
fn merge_citation(stub: &ArticleStub, doi: &str, citation: CitationRecord) -> ArticleRecord {
    ArticleRecord {
        art_id: stub.art_id.clone(),
        title: if citation.title.is_empty() {
            stub.title_web.clone()
        } else {
            citation.title
        },
        container_title: citation.container_title,
        publisher: citation.publisher,
        volume: if citation.volume.is_empty() {
            stub.volume
        } else {
            parse_count(&citation.volume)
        },
        number: if citation.issue.is_empty() {
            stub.number
        } else {
            parse_count(&citation.issue)
        },
        page: citation.page,
        article_type: citation.article_type,
        year: if citation.year > 0 { citation.year } else { stub.year },
        month: citation.month,
        doi: doi.to_string(),
        authors: citation.authors,
        first_author_family: citation.first_author_family,
        first_author_given: citation.first_author_given,
        author_count: citation.author_count,
        abstract_text: citation.abstract_text,
        reference_count: citation.reference_count,
        cited_by_count: citation.cited_by_count,
        issn: citation.issn,
        citation_apa: citation.citation_apa,
        url: citation.url,
        pdf_url: citation.pdf_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn stub(art_id: &str, title: &str) -> ArticleStub {
        ArticleStub::new(art_id.to_string(), title.to_string())
    }

    #[test]
    fn test_record_from_stub_points_at_detail_page() {
        let record = record_from_stub(
            &stub("st0001", "Working title"),
            "https://www.stata-journal.com",
        );
        assert_eq!(record.art_id, "st0001");
        assert_eq!(record.doi, "");
        assert_eq!(record.authors, "");
        assert_eq!(record.cited_by_count, 0);
        assert_eq!(
            record.url,
            "https://www.stata-journal.com/article.html?article=st0001"
        );
    }

    #[test]
    fn test_record_from_landing_keeps_doi_and_resolver_url() {
        let landing = LandingInfo {
            authors: "Doe, Jane".to_string(),
            first_author_family: "Doe".to_string(),
            first_author_given: "Jane".to_string(),
            author_count: 1,
            abstract_text: "An abstract.".to_string(),
            page: "1-9".to_string(),
            ..Default::default()
        };
        let record = record_from_landing(&stub("st0002", "Fallback title"), "10.1177/x", landing);
        assert_eq!(record.doi, "10.1177/x");
        assert_eq!(record.url, "https://doi.org/10.1177/x");
        assert_eq!(record.title, "Fallback title");
        assert_eq!(record.authors, "Doe, Jane");
        assert_eq!(record.citation_apa, "");
    }

    #[test]
    fn test_merge_citation_precedence() {
        let citation = CitationRecord {
            title: "Crossref title".to_string(),
            volume: "6".to_string(),
            issue: "1".to_string(),
            year: 2006,
            cited_by_count: 42,
            ..Default::default()
        };
        let record = merge_citation(&stub("st0003", "Web title"), "10.1177/x", citation);
        assert_eq!(record.title, "Crossref title");
        assert_eq!(record.volume, 6);
        assert_eq!(record.number, 1);
        assert_eq!(record.year, 2006);
        assert_eq!(record.cited_by_count, 42);
    }

    #[test]
    fn test_merge_citation_stub_fallbacks() {
        let mut s = stub("st0004", "Web title");
        s.volume = 3;
        s.number = 2;
        s.year = 2003;

        let citation = CitationRecord {
            doi: "10.1177/x".to_string(),
            abstract_text: "Text.".to_string(),
            ..Default::default()
        };
        let record = merge_citation(&s, "10.1177/x", citation);
        assert_eq!(record.title, "Web title");
        assert_eq!(record.volume, 3);
        assert_eq!(record.number, 2);
        assert_eq!(record.year, 2003);
    }

    #[test]
    fn test_merge_citation_unparsable_volume_is_zero() {
        let citation = CitationRecord {
            volume: "vi".to_string(),
            ..Default::default()
        };
        let record = merge_citation(&stub("st0005", "t"), "10.1177/x", citation);
        assert_eq!(record.volume, 0);
    }

    #[tokio::test]
    async fn test_assemble_records_end_to_end() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/article.html")
            .match_query(mockito::Matcher::UrlEncoded(
                "article".to_string(),
                "st0001".to_string(),
            ))
            .with_body(r#"<a href="https://journals.sagepub.com/doi/10.1177/1536867X0600600101">cite</a>"#)
            .create_async()
            .await;

        // no DOI link at all on this page
        server
            .mock("GET", "/article.html")
            .match_query(mockito::Matcher::UrlEncoded(
                "article".to_string(),
                "dm0002".to_string(),
            ))
            .with_body("<html><body>No links here</body></html>")
            .create_async()
            .await;

        server
            .mock("GET", "/works/10.1177/1536867x0600600101")
            .with_body(
                json!({
                    "message": {
                        "DOI": "10.1177/1536867x0600600101",
                        "title": ["Found on Crossref"],
                        "volume": "6",
                        "issue": "1",
                        "is-referenced-by-count": 42,
                        "published-print": {"date-parts": [[2006, 2]]}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Client::new();
        let crossref = CrossrefClient::with_base_url(
            client.clone(),
            &format!("{}/works", server.url()),
        )
        .with_timings(Duration::from_millis(1), Duration::from_millis(5));

        let stubs = vec![stub("st0001", "Web title one"), stub("dm0002", "Web title two")];
        let base = server.url();
        let mut records = assemble_records(&client, &crossref, &base, &base, stubs).await;
        records.sort_by(|a, b| a.art_id.cmp(&b.art_id));

        assert_eq!(records.len(), 2);

        let enriched = &records[1];
        assert_eq!(enriched.art_id, "st0001");
        assert_eq!(enriched.title, "Found on Crossref");
        assert_eq!(enriched.cited_by_count, 42);
        assert_eq!(enriched.volume, 6);

        let bare = &records[0];
        assert_eq!(bare.art_id, "dm0002");
        assert_eq!(bare.doi, "");
        assert_eq!(bare.title, "Web title two");
        assert!(bare.url.contains("article=dm0002"));
    }
}
