use anyhow::{Context, Result};
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::common::{
    ArticleRecord, DatabaseSummary, OutputPaths, RunLog, TopCited, VersionRecord,
};

/// How many records the run log's most-cited list carries
const TOP_CITED_COUNT: usize = 10;

/// Persist the full record set: the main dataset, the one-row version
/// file, and the JSON run log. All three are rewritten wholesale. Returns
/// the summary figures for the caller's final log block.
pub fn write_database(records: &[ArticleRecord], paths: &OutputPaths) -> Result<DatabaseSummary> {
    let mut df = records_to_dataframe(records)?;
    df = df
        .sort(
            ["year", "volume", "number"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .context("Failed to sort dataset")?;

    write_parquet(&mut df, &paths.dataset)?;
    info!("Main database saved: {}", paths.dataset.display());

    let summary = summarize(records);
    let now = OffsetDateTime::now_utc();

    let mut version_df = version_to_dataframe(&version_record(&summary, now)?)?;
    write_parquet(&mut version_df, &paths.version)?;
    info!("Version info saved: {}", paths.version.display());

    let run_log = build_run_log(records, &summary, now)?;
    let log_file = File::create(&paths.run_log)
        .with_context(|| format!("Failed to create run log: {}", paths.run_log.display()))?;
    serde_json::to_writer_pretty(log_file, &run_log).context("Failed to write run log")?;
    info!("Update log saved: {}", paths.run_log.display());

    Ok(summary)
}

/// Column-major conversion. Numeric fields are already non-negative i64 on
/// the record type; art_id leads the column order.
fn records_to_dataframe(records: &[ArticleRecord]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            "art_id".into(),
            records.iter().map(|r| r.art_id.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "title".into(),
            records.iter().map(|r| r.title.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "container_title".into(),
            records.iter().map(|r| r.container_title.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "publisher".into(),
            records.iter().map(|r| r.publisher.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "volume".into(),
            records.iter().map(|r| r.volume).collect::<Vec<_>>(),
        ),
        Column::new(
            "number".into(),
            records.iter().map(|r| r.number).collect::<Vec<_>>(),
        ),
        Column::new(
            "page".into(),
            records.iter().map(|r| r.page.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "article_type".into(),
            records.iter().map(|r| r.article_type.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "year".into(),
            records.iter().map(|r| r.year).collect::<Vec<_>>(),
        ),
        Column::new(
            "month".into(),
            records.iter().map(|r| r.month).collect::<Vec<_>>(),
        ),
        Column::new(
            "doi".into(),
            records.iter().map(|r| r.doi.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "authors".into(),
            records.iter().map(|r| r.authors.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "first_author_family".into(),
            records.iter().map(|r| r.first_author_family.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "first_author_given".into(),
            records.iter().map(|r| r.first_author_given.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "author_count".into(),
            records.iter().map(|r| r.author_count).collect::<Vec<_>>(),
        ),
        Column::new(
            "abstract".into(),
            records.iter().map(|r| r.abstract_text.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "reference_count".into(),
            records.iter().map(|r| r.reference_count).collect::<Vec<_>>(),
        ),
        Column::new(
            "cited_by_count".into(),
            records.iter().map(|r| r.cited_by_count).collect::<Vec<_>>(),
        ),
        Column::new(
            "issn".into(),
            records.iter().map(|r| r.issn.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "citation_apa".into(),
            records.iter().map(|r| r.citation_apa.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "url".into(),
            records.iter().map(|r| r.url.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "pdf_url".into(),
            records.iter().map(|r| r.pdf_url.clone()).collect::<Vec<_>>(),
        ),
    ];

    DataFrame::new(columns).context("Failed to build dataset frame")
}

fn version_record(summary: &DatabaseSummary, now: OffsetDateTime) -> Result<VersionRecord> {
    let date_format = format_description!("[year]-[month]-[day]");
    let time_format = format_description!("[hour]:[minute]:[second]");

    Ok(VersionRecord {
        update_date: now.format(&date_format).context("Failed to format date")?,
        update_time: now.format(&time_format).context("Failed to format time")?,
        total_articles: summary.total_articles as i64,
        articles_with_doi: summary.articles_with_doi as i64,
        articles_with_citation: summary.articles_with_citation as i64,
        year_min: summary.year_min,
        year_max: summary.year_max,
    })
}

fn version_to_dataframe(version: &VersionRecord) -> Result<DataFrame> {
    let columns = vec![
        Column::new("update_date".into(), vec![version.update_date.clone()]),
        Column::new("update_time".into(), vec![version.update_time.clone()]),
        Column::new("total_articles".into(), vec![version.total_articles]),
        Column::new("articles_with_doi".into(), vec![version.articles_with_doi]),
        Column::new(
            "articles_with_citation".into(),
            vec![version.articles_with_citation],
        ),
        Column::new("year_min".into(), vec![version.year_min]),
        Column::new("year_max".into(), vec![version.year_max]),
    ];

    DataFrame::new(columns).context("Failed to build version frame")
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .finish(df)
        .with_context(|| format!("Failed to write parquet: {}", path.display()))?;

    Ok(())
}

fn summarize(records: &[ArticleRecord]) -> DatabaseSummary {
    let total_citations: i64 = records.iter().map(|r| r.cited_by_count).sum();
    let average_citations = if records.is_empty() {
        0.0
    } else {
        total_citations as f64 / records.len() as f64
    };

    DatabaseSummary {
        total_articles: records.len(),
        articles_with_doi: records.iter().filter(|r| !r.doi.is_empty()).count(),
        articles_with_citation: records.iter().filter(|r| !r.citation_apa.is_empty()).count(),
        articles_with_authors: records.iter().filter(|r| !r.authors.is_empty()).count(),
        articles_with_abstract: records.iter().filter(|r| !r.abstract_text.is_empty()).count(),
        year_min: records.iter().map(|r| r.year).min().unwrap_or(0),
        year_max: records.iter().map(|r| r.year).max().unwrap_or(0),
        total_citations,
        average_citations,
    }
}

fn build_run_log(
    records: &[ArticleRecord],
    summary: &DatabaseSummary,
    now: OffsetDateTime,
) -> Result<RunLog> {
    let mut by_citations: Vec<&ArticleRecord> = records.iter().collect();
    by_citations.sort_by(|a, b| b.cited_by_count.cmp(&a.cited_by_count));

    let top_cited = by_citations
        .iter()
        .take(TOP_CITED_COUNT)
        .map(|r| TopCited {
            title: r.title.clone(),
            cited_by_count: r.cited_by_count,
            year: r.year,
        })
        .collect();

    Ok(RunLog {
        update_datetime: now.format(&Rfc3339).context("Failed to format timestamp")?,
        total_articles: summary.total_articles,
        articles_with_doi: summary.articles_with_doi,
        articles_with_citation: summary.articles_with_citation,
        year_range: [summary.year_min, summary.year_max],
        top_cited,
    })
}
