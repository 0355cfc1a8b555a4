//! bx - BlockXpand holdings summary from the command line.

use std::path::PathBuf;

use bx_actor::Network;
use bx_widget::{init_logging, level_for_verbosity, LogFormat, WidgetConfig};
use clap::{Parser, Subcommand};

mod commands;

/// BlockXpand - holdings summary from the aggregator canister
#[derive(Parser, Debug)]
#[command(name = "bx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format (pretty, json)
    #[arg(long, default_value = "pretty", global = true)]
    log_format: String,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network (local, test, production)
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Aggregator canister id
    #[arg(long, global = true)]
    canister_id: Option<String>,

    /// Replica URL
    #[arg(long, global = true)]
    replica_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and show your total
    Connect {
        /// Identity provider URL (file:// path to a PEM key)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Fetch the summary of any principal anonymously, as JSON
    Summary {
        /// Principal to summarize
        principal: String,
    },

    /// Forget the stored login
    Logout,

    /// Show configuration and login status
    Status,

    /// Print the aggregator's Candid interface
    Interface,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<WidgetConfig> {
        let mut config = WidgetConfig::load(self.config.as_deref())?;
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(canister_id) = &self.canister_id {
            config.canister_id = Some(canister_id.clone());
        }
        if let Some(url) = &self.replica_url {
            config.replica_url = Some(url.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(
        level_for_verbosity(cli.verbose),
        LogFormat::parse(&cli.log_format),
    );

    let result = match cli.load_config() {
        Ok(config) => match cli.command {
            Commands::Connect { provider } => commands::connect(config, provider).await,
            Commands::Summary { principal } => commands::summary(&config, &principal).await,
            Commands::Logout => commands::logout(&config),
            Commands::Status => commands::status(&config),
            Commands::Interface => commands::interface(&config),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
