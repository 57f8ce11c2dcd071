pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod model;
pub mod providers;
pub mod store;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::debug;

use cli::{Cli, Command};
use config::Settings;
use store::ConfigStore;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::from_env();
    let store = ConfigStore::from_settings(&settings);
    debug!(
        config_file = %store.config_file().display(),
        api_base_url = %settings.api_base_url,
        "loaded runtime configuration"
    );

    match cli.command {
        Command::SetKey { key } => commands::key::set_key(&store, &key),
        Command::ViewKey => commands::key::view_key(&store),
        Command::ClearKey => commands::key::clear_key(&store),
        Command::Query(args) => {
            let client = Client::builder()
                .build()
                .context("Failed to initialize HTTP client")?;
            commands::query::query(&client, &settings, &store, &args).await
        }
        Command::Models => {
            commands::models::models();
            Ok(())
        }
        Command::History => commands::history::history(&store),
    }
}
