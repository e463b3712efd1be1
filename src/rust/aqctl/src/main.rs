mod verify;

use anyhow::{bail, Result};
use aqos_config::{config_path, load_config, Config, ConfigError};
use aqos_store::{SnapshotStore, SqliteStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command()]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print stored snapshots as JSON, most recent first
    History {
        /// Number of snapshots to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Check a congestion model against reference inputs
    VerifyModel {
        /// Path to the model JSON file
        path: PathBuf,
    },
    /// Print the effective configuration
    ShowConfig,
}

fn effective_config() -> Result<Arc<Config>> {
    match load_config() {
        Ok(config) => Ok(config),
        Err(ConfigError::ConfigDoesNotExist(_)) => Ok(Arc::new(Config::default())),
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<()> {
    let cli = Args::parse();
    match cli.command {
        Some(Commands::History { limit }) => {
            let config = effective_config()?;
            let store = SqliteStore::new(&config.storage.database_path);
            let history = store.query(limit)?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Some(Commands::VerifyModel { path }) => {
            let outcomes = verify::verify_model_file(&path)?;
            for outcome in &outcomes {
                println!("{outcome}");
            }
            let failures = outcomes.iter().filter(|o| !o.passed()).count();
            if failures > 0 {
                bail!("{failures} of {} reference inputs misclassified", outcomes.len());
            }
            println!("Model OK");
        }
        Some(Commands::ShowConfig) => {
            let config = effective_config()?;
            println!("# {}", config_path().display());
            println!("{}", toml::to_string_pretty(config.as_ref())?);
        }
        None => {
            println!("Run with --help to see instructions");
        }
    }

    Ok(())
}
