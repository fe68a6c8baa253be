#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for court case status lookups.
//!
//! Results are printed to stdout as JSON; logs go to stderr and are
//! controlled with `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use court_status_portal::registry::{all_portals, load_portal_file};
use court_status_portal::{CourtScraper, ScraperSettings};

#[derive(Parser)]
#[command(name = "court_status", about = "Court case status lookup tool")]
struct Cli {
    /// Embedded portal id (overrides `COURT_STATUS_PORTAL`)
    #[arg(long, global = true)]
    portal: Option<String>,
    /// Portal definition TOML file, used instead of an embedded portal
    #[arg(long, global = true)]
    portal_file: Option<PathBuf>,
    /// Tesseract binary (overrides `TESSERACT_CMD`)
    #[arg(long, global = true)]
    tesseract: Option<PathBuf>,
    /// Tesseract language data directory (overrides `TESSDATA_PREFIX`)
    #[arg(long, global = true)]
    tessdata_dir: Option<PathBuf>,
    /// Directory receiving raw result pages (overrides `COURT_STATUS_DEBUG_DIR`)
    #[arg(long, global = true)]
    debug_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a case and print the result
    Search {
        /// Case type as the portal lists it (e.g., "W.P.(C)")
        case_type: String,
        /// Case number
        case_number: String,
        /// Filing year
        year: i32,
    },
    /// Check whether the portal is reachable
    Status,
    /// List the case types the portal offers
    CaseTypes,
    /// List all embedded portals
    Portals,
}

impl Cli {
    fn settings(&self) -> ScraperSettings {
        let mut settings = ScraperSettings::from_env();
        if let Some(portal) = &self.portal {
            settings.portal_id.clone_from(portal);
        }
        if let Some(binary) = &self.tesseract {
            settings.tesseract_cmd.clone_from(binary);
        }
        if let Some(dir) = &self.tessdata_dir {
            settings.tessdata_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.debug_dir {
            settings.debug_dir = Some(dir.clone());
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Portals) {
        println!("{:<24} NAME", "ID");
        println!("{}", "-".repeat(60));
        for portal in &all_portals() {
            println!("{:<24} {}", portal.id(), portal.name());
        }
        return Ok(());
    }

    let settings = cli.settings();
    let mut scraper = match &cli.portal_file {
        Some(path) => CourtScraper::for_portal(load_portal_file(path).await?, &settings)?,
        None => CourtScraper::from_settings(&settings)?,
    };
    log::info!(
        "Using portal {} ({})",
        scraper.portal().id(),
        scraper.portal().name()
    );

    match cli.command {
        Commands::Search {
            case_type,
            case_number,
            year,
        } => {
            let result = scraper.search_case(&case_type, &case_number, year).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Status => {
            let status = scraper.get_portal_status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::CaseTypes => {
            println!(
                "{}",
                serde_json::to_string_pretty(&scraper.get_case_types())?
            );
        }
        Commands::Portals => {}
    }

    Ok(())
}
