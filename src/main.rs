use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use wealthtree::core::date::DateRange;
use wealthtree::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct RangeArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display categorized transactions
    Transactions(RangeArgs),
    /// Display category totals
    Summary(RangeArgs),
    /// Display assets, debts and net worth
    NetWorth {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}

impl TryFrom<Commands> for wealthtree::AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<Self> {
        Ok(match cmd {
            Commands::Transactions(args) => wealthtree::AppCommand::Transactions {
                range: DateRange::new(args.start, args.end)?,
                json: args.json,
            },
            Commands::Summary(args) => wealthtree::AppCommand::Summary {
                range: DateRange::new(args.start, args.end)?,
                json: args.json,
            },
            Commands::NetWorth { json } => wealthtree::AppCommand::NetWorth { json },
            Commands::Setup => anyhow::bail!("Setup command should be handled separately"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => wealthtree::cli::setup::setup_at_path(path),
            None => wealthtree::cli::setup::setup(),
        },
        Some(cmd) => match wealthtree::AppCommand::try_from(cmd) {
            Ok(command) => wealthtree::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
