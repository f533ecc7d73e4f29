use serde::Serialize;

/// One entry from the search listing, before any enrichment.
/// Volume, number, and year stay 0 until the Crossref data fills them in.
#[derive(Debug, Clone)]
pub struct ArticleStub {
    pub art_id: String,
    pub title_web: String,
    pub volume: i64,
    pub number: i64,
    pub year: i64,
}

impl ArticleStub {
    pub fn new(art_id: String, title_web: String) -> Self {
        Self {
            art_id,
            title_web,
            volume: 0,
            number: 0,
            year: 0,
        }
    }
}

/// Flattened Crossref metadata for one DOI. Transient: merged into an
/// ArticleRecord, never persisted on its own. Volume and issue stay strings
/// here because Crossref reports them that way; coercion happens at merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationRecord {
    pub doi: String,
    pub title: String,
    pub container_title: String,
    pub publisher: String,
    pub volume: String,
    pub issue: String,
    pub page: String,
    pub article_type: String,
    pub reference_count: i64,
    pub cited_by_count: i64,
    pub year: i64,
    pub month: i64,
    pub first_author_family: String,
    pub first_author_given: String,
    pub authors: String,
    pub author_count: i64,
    pub abstract_text: String,
    pub pdf_url: String,
    pub url: String,
    pub issn: String,
    pub citation_apa: String,
}

impl CitationRecord {
    /// A lookup that failed or found nothing yields a record with neither
    /// DOI nor title.
    pub fn is_empty(&self) -> bool {
        self.doi.is_empty() && self.title.is_empty()
    }
}

/// One persisted database row: stub fields merged with citation fields.
/// Every numeric field is a non-negative integer (0 when unknown) and every
/// text field defaults to the empty string.
#[derive(Debug, Clone, Default)]
pub struct ArticleRecord {
    pub art_id: String,
    pub title: String,
    pub container_title: String,
    pub publisher: String,
    pub volume: i64,
    pub number: i64,
    pub page: String,
    pub article_type: String,
    pub year: i64,
    pub month: i64,
    pub doi: String,
    pub authors: String,
    pub first_author_family: String,
    pub first_author_given: String,
    pub author_count: i64,
    pub abstract_text: String,
    pub reference_count: i64,
    pub cited_by_count: i64,
    pub issn: String,
    pub citation_apa: String,
    pub url: String,
    pub pdf_url: String,
}

/// One-row summary persisted next to the dataset. Fully regenerated on
/// every run; no history is kept.
#[derive(Debug, Clone)]
pub struct VersionRecord {
    pub update_date: String,
    pub update_time: String,
    pub total_articles: i64,
    pub articles_with_doi: i64,
    pub articles_with_citation: i64,
    pub year_min: i64,
    pub year_max: i64,
}

/// Entry in the run log's most-cited list
#[derive(Debug, Clone, Serialize)]
pub struct TopCited {
    pub title: String,
    pub cited_by_count: i64,
    pub year: i64,
}

/// JSON run log, overwritten each run
#[derive(Debug, Clone, Serialize)]
pub struct RunLog {
    pub update_datetime: String,
    pub total_articles: usize,
    pub articles_with_doi: usize,
    pub articles_with_citation: usize,
    pub year_range: [i64; 2],
    pub top_cited: Vec<TopCited>,
}

/// Figures for the final summary block
#[derive(Debug, Clone, Default)]
pub struct DatabaseSummary {
    pub total_articles: usize,
    pub articles_with_doi: usize,
    pub articles_with_citation: usize,
    pub articles_with_authors: usize,
    pub articles_with_abstract: usize,
    pub year_min: i64,
    pub year_max: i64,
    pub total_citations: i64,
    pub average_citations: f64,
}
