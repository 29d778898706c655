//! Operational probe for `projpool_core`.
//!
//! # Responsibility
//! - Verify core crate linkage, migrate a database file, and check that the
//!   generation provider can be constructed from config.
//! - Keep output deterministic `key=value` lines for quick local checks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use projpool_core::db::migrations::current_version;
use projpool_core::{AppConfig, Difficulty, GeminiProvider, GenerationProvider, RefineRequest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "projpool",
    version = env!("CARGO_PKG_VERSION"),
    about = "ProjPool core operational probe"
)]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[clap(long, env = "PROJPOOL_CONFIG")]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core ping and version.
    Ping,
    /// Open the configured database and apply pending migrations.
    Migrate {
        /// Database file overriding `[database] path`.
        #[clap(long)]
        db: Option<PathBuf>,
    },
    /// Build the generation provider from config.
    CheckProvider {
        /// Also send one `simple` refine request for this label text.
        #[clap(long)]
        probe_label: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Command::Ping = cli.command {
        println!("projpool_core ping={}", projpool_core::ping());
        println!("projpool_core version={}", projpool_core::core_version());
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load config")?;
    projpool_core::init_from_config(&config.logging).context("failed to init logging")?;

    match cli.command {
        Command::Ping => Ok(()),
        Command::Migrate { db } => migrate(config, db),
        Command::CheckProvider { probe_label } => check_provider(&config, probe_label),
    }
}

fn migrate(mut config: AppConfig, db: Option<PathBuf>) -> Result<()> {
    if let Some(path) = db {
        config.database.path = path;
    }
    let conn = projpool_core::open_db_with_config(&config.database).with_context(|| {
        format!(
            "failed to open database {}",
            config.database.path.display()
        )
    })?;
    let version = current_version(&conn).context("failed to read schema version")?;
    println!(
        "db={} schema_version={}",
        config.database.path.display(),
        version
    );
    log::info!(
        "event=cli_migrate module=cli status=ok schema_version={}",
        version
    );
    Ok(())
}

fn check_provider(config: &AppConfig, probe_label: Option<String>) -> Result<()> {
    let provider = GeminiProvider::from_config(&config.generation)
        .context("generation provider unavailable")?;
    println!("provider=gemini endpoint={}", provider.endpoint());

    if let Some(label_text) = probe_label {
        let text = provider
            .refine(&RefineRequest {
                label_text: &label_text,
                difficulty: Difficulty::Simple,
                project_name: "Provider probe",
                project_description: "",
            })
            .context("probe request failed")?;
        println!("probe=ok output_chars={}", text.chars().count());
    }
    Ok(())
}
