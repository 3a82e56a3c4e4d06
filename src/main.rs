//! letters-web - The lettersrb.com site for the Letters debugging library.

mod assets;
mod build;
mod cli;
mod config;
mod serve;
mod site;
mod utils;

use anyhow::Result;
use build::{build_site, export_pages};
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use serve::serve_site;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    let site = build_site(&config)?;

    if cli.is_serve() {
        serve_site(&config, site)
    } else {
        let written = export_pages(&site, &config.build.output)?;
        log!("build"; "{written} pages written to {}", config.build.output.display());
        Ok(())
    }
}
