use anyhow::{anyhow, Context, Result};
use log::{error, info};
use std::time::Instant;

use crate::assemble::assemble_records;
use crate::citation::CrossrefClient;
use crate::cli::UpdateArgs;
use crate::common::{create_spinner, format_elapsed, setup_logging, DatabaseSummary, OutputPaths};
use crate::dataset::write_database;
use crate::site;

pub async fn run_update_async(args: UpdateArgs) -> Result<DatabaseSummary> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("============================================================");
    info!("Starting Stata Journal Database Update");
    info!("============================================================");

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", args.output_dir))?;
    let paths = OutputPaths::from_dir(&args.output_dir);

    let client = site::build_client()?;

    info!("Step 1: Fetching article list from Stata Journal website...");
    let spinner = create_spinner("Fetching search page...");
    let listing = site::fetch_article_listing(&client, site::BASE_URL).await;
    spinner.finish_and_clear();

    let mut stubs = match listing {
        Ok(stubs) if !stubs.is_empty() => stubs,
        Ok(_) => {
            error!("No articles found! Exiting.");
            return Err(anyhow!("Listing fetch returned no articles"));
        }
        Err(e) => {
            error!("Error fetching from search page: {:#}", e);
            return Err(e);
        }
    };

    if let Some(limit) = args.limit {
        stubs.truncate(limit);
        info!("Limiting run to the first {} articles", stubs.len());
    }

    info!("Step 2: Fetching citation information from CrossRef API...");
    info!("Total articles to process: {}", stubs.len());

    let crossref = CrossrefClient::new(client.clone());
    let records = assemble_records(&client, &crossref, site::BASE_URL, site::SAGE_BASE, stubs).await;

    info!("Step 3: Saving to database files...");
    let summary = write_database(&records, &paths)?;

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    info!("Total articles: {}", summary.total_articles);
    info!("Year range: {} - {}", summary.year_min, summary.year_max);
    info!("Articles with DOI: {}", summary.articles_with_doi);
    info!("Articles with authors: {}", summary.articles_with_authors);
    info!("Articles with abstract: {}", summary.articles_with_abstract);
    info!("Average citations: {:.1}", summary.average_citations);
    info!("Total citations: {}", summary.total_citations);
    info!("Output dataset: {}", paths.dataset.display());
    info!("Output version: {}", paths.version.display());
    info!("Output run log: {}", paths.run_log.display());
    info!("========================================================");

    Ok(summary)
}

pub fn run_update(args: UpdateArgs) -> Result<DatabaseSummary> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_update_async(args))
}
