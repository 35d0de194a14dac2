//! indicator-console: operator console for indicator values
//!
//! Browses an indicator's value grid, validates and commits edits, and
//! lists reference data, all through the same pipeline the dashboard uses.

mod commands;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use indicator_editor::config::DEFAULT_API_BASE;
use indicator_editor::{GatewayConfig, HttpGateway, ReferenceCache, ReferenceData};

#[derive(Parser, Debug)]
#[command(name = "indicator-console")]
#[command(about = "Browse and edit indicator values from the terminal")]
struct Cli {
    /// Base URL of the indicator API
    #[arg(long, env = "API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print an indicator's value grid
    Show {
        /// Indicator id
        indicator: String,
    },

    /// Stage edits and commit them as one batch
    Edit {
        /// Indicator id
        indicator: String,
        /// Assignment FACT=VALUE, repeatable
        #[arg(short, long = "set", value_name = "FACT=VALUE", required = true)]
        assignments: Vec<String>,
        /// Column the edits are made under
        #[arg(short, long, default_value = indicator_editor::VALUE_COLUMN)]
        column: String,
        /// Validate and stage only, do not submit
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the validation rules offline
    Validate {
        /// Current value, or "-" for an empty row
        old: String,
        /// Text to validate
        text: String,
        /// Data type code
        #[arg(short, long, default_value = indicator_editor::DECIMAL_CODE)]
        data_type: String,
        /// Dimension hint (time)
        #[arg(long)]
        hint: Option<String>,
    },

    /// List data types
    DataTypes,

    /// List units by group
    Units,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "indicator_console={level},indicator_editor={level}",
                    level = cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Command::Validate { old, text, data_type, hint } = &cli.command {
        return commands::validate(old, text, data_type, hint.as_deref());
    }

    let config = GatewayConfig::new(&cli.api_base).with_timeout_secs(cli.timeout_secs);
    info!(api_base = %config.api_base, "Using indicator API");

    let gateway = Arc::new(HttpGateway::new(config)?);
    let reference = ReferenceData::new(gateway.clone(), Arc::new(ReferenceCache::new()));

    match cli.command {
        Command::Show { indicator } => commands::show(gateway.as_ref(), &reference, &indicator).await,
        Command::Edit {
            indicator,
            assignments,
            column,
            dry_run,
        } => {
            commands::edit(
                gateway.as_ref(),
                &reference,
                &indicator,
                &assignments,
                &column,
                dry_run,
            )
            .await
        }
        Command::DataTypes => commands::data_types(&reference).await,
        Command::Units => commands::units(&reference).await,
        Command::Validate { .. } => Ok(()),
    }
}
