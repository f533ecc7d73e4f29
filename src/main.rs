use anyhow::Result;
use clap::Parser;

use sj_database_update::cli::{Cli, Commands};
use sj_database_update::commands::run_update;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Update(args) => {
            run_update(args)?;
        }
    }

    Ok(())
}
