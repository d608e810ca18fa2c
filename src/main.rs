use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use onramp::log::init_logging;

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

impl From<Commands> for onramp::AppCommand {
    fn from(cmd: Commands) -> onramp::AppCommand {
        match cmd {
            Commands::Quote {
                amount,
                token,
                country,
                region,
            } => onramp::AppCommand::Quote {
                amount,
                token,
                country,
                region,
            },
            Commands::Providers { country } => onramp::AppCommand::Providers { country },
            Commands::Tokens { country } => onramp::AppCommand::Tokens { country },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compare onramp quotes for a fiat amount
    Quote {
        /// Fiat amount to spend, as typed
        amount: String,

        /// Target crypto asset (defaults from config)
        #[arg(short, long)]
        token: Option<String>,

        /// Two-letter country code; geolocated when omitted
        #[arg(long)]
        country: Option<String>,

        /// State or region within the country
        #[arg(long)]
        region: Option<String>,
    },
    /// List eligible service providers for a country
    Providers {
        /// Two-letter country code; geolocated when omitted
        #[arg(long)]
        country: Option<String>,
    },
    /// List purchasable crypto assets for a country
    Tokens {
        /// Two-letter country code; geolocated when omitted
        #[arg(long)]
        country: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => onramp::run_command(cmd.into(), cli.config_path.as_deref()).await,
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

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = onramp::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
aggregator:
  base_url: "https://api.onramp.dev/v1"

currency: "USD"
token: "ETH"
theme: light
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
