use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sj-database-update")]
#[command(about = "Rebuild the Stata Journal article database with Crossref citation metadata")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape the article listing, enrich each article via Crossref, and
    /// rewrite the database, version, and run-log files
    Update(UpdateArgs),
}

#[derive(Parser, Clone)]
pub struct UpdateArgs {
    /// Directory for the dataset, version, and run-log files
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Process only the first N listed articles (debugging aid)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}
