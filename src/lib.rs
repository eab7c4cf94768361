pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::categories::Detail;
use crate::core::config::AppConfig;
use crate::core::date::DateRange;
use crate::providers::{KuberaClient, LunchMoneyClient};
use anyhow::Result;
use tracing::{debug, info};

/// A command that needs the loaded configuration and a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Categorized transaction trees, transactions included.
    Transactions { range: DateRange, json: bool },
    /// Categorized totals without the transaction lists.
    Summary { range: DateRange, json: bool },
    /// Portfolio snapshot with net worth.
    NetWorth { json: bool },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("wealthtree starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(?command, "Running command");

    match command {
        AppCommand::Transactions { range, json } => {
            let client = LunchMoneyClient::from_config(config.lunch_money()?);
            cli::categories::run(&client, &range, Detail::Transactions, json).await
        }
        AppCommand::Summary { range, json } => {
            let client = LunchMoneyClient::from_config(config.lunch_money()?);
            cli::categories::run(&client, &range, Detail::Summary, json).await
        }
        AppCommand::NetWorth { json } => {
            let client = KuberaClient::from_config(config.kubera()?);
            cli::net_worth::run(&client, json).await
        }
    }
}
