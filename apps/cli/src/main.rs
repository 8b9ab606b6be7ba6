//! seoscan CLI: on-page SEO evaluation of a website.
//!
//! Reads the site's sitemap, picks the key pages, checks each one against
//! the rule battery and prints a scored report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
