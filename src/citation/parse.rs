use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::common::CitationRecord;

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// First element of a JSON string array, or empty when the key is absent,
/// not an array, or empty. Crossref wraps title/container-title/ISSN in
/// one-element arrays.
fn first_or_empty(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn str_or_empty(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Volume/issue occasionally arrive as JSON numbers
fn string_or_number(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn count_or_zero(value: &Value, key: &str) -> i64 {
    value
        .get(key)
        .and_then(|v| v.as_i64())
        .filter(|v| *v >= 0)
        .unwrap_or(0)
}

/// Strip HTML/JATS markup and trim surrounding whitespace
pub fn strip_tags(raw: &str) -> String {
    TAG_PATTERN.replace_all(raw, "").trim().to_string()
}

/// Flatten a Crossref `message` envelope into a citation record.
/// `requested_doi` fills in when the response carries no DOI of its own.
pub fn parse_citation_message(requested_doi: &str, message: &Value) -> CitationRecord {
    let mut record = CitationRecord {
        doi: str_or_empty(message, "DOI"),
        title: first_or_empty(message, "title"),
        container_title: first_or_empty(message, "container-title"),
        publisher: str_or_empty(message, "publisher"),
        volume: string_or_number(message, "volume"),
        issue: string_or_number(message, "issue"),
        page: str_or_empty(message, "page"),
        article_type: str_or_empty(message, "type"),
        reference_count: count_or_zero(message, "reference-count"),
        cited_by_count: count_or_zero(message, "is-referenced-by-count"),
        url: str_or_empty(message, "URL"),
        issn: first_or_empty(message, "ISSN"),
        abstract_text: strip_tags(&str_or_empty(message, "abstract")),
        ..Default::default()
    };

    if record.doi.is_empty() {
        record.doi = requested_doi.to_string();
    }

    // Prefer the print date, fall back to online publication
    let published = message
        .get("published-print")
        .or_else(|| message.get("published-online"));
    if let Some(parts) = published
        .and_then(|p| p.get("date-parts"))
        .and_then(|d| d.get(0))
        .and_then(|p| p.as_array())
    {
        record.year = parts.first().and_then(|v| v.as_i64()).unwrap_or(0);
        record.month = parts.get(1).and_then(|v| v.as_i64()).unwrap_or(0);
    }

    if let Some(authors) = message
        .get("author")
        .and_then(|v| v.as_array())
        .filter(|a| !a.is_empty())
    {
        record.first_author_family = str_or_empty(&authors[0], "family");
        record.first_author_given = str_or_empty(&authors[0], "given");

        let mut formatted = Vec::new();
        for author in authors {
            let family = str_or_empty(author, "family");
            if family.is_empty() {
                continue;
            }
            let given = str_or_empty(author, "given");
            formatted.push(if given.is_empty() {
                family
            } else {
                format!("{}, {}", family, given)
            });
        }
        record.authors = formatted.join("; ");
        record.author_count = authors.len() as i64;
    }

    if let Some(links) = message.get("link").and_then(|v| v.as_array()) {
        for link in links {
            if str_or_empty(link, "content-type").to_lowercase().contains("pdf") {
                record.pdf_url = str_or_empty(link, "URL");
                break;
            }
        }
    }

    record.citation_apa = format_citation_apa(&record);
    record
}

/// Compose an APA-style display citation:
/// `<authors> (<year>) <title>. <container>, <volume>(<issue>): <page>.`
/// Segments whose source field is empty are omitted; present segments are
/// joined with single spaces.
pub fn format_citation_apa(info: &CitationRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !info.authors.is_empty() {
        parts.push(info.authors.clone());
    }

    if info.year > 0 {
        parts.push(format!("({})", info.year));
    }

    if !info.title.is_empty() {
        parts.push(format!("{}.", info.title));
    }

    if !info.container_title.is_empty() {
        let mut journal = info.container_title.clone();
        if !info.volume.is_empty() {
            journal.push_str(&format!(", {}", info.volume));
            if !info.issue.is_empty() {
                journal.push_str(&format!("({})", info.issue));
            }
        }
        if !info.page.is_empty() {
            journal.push_str(&format!(": {}", info.page));
        }
        parts.push(format!("{}.", journal));
    }

    parts.join(" ")
}
