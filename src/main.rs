mod cli;
mod config;
mod errors;
mod execution;
mod models;
mod storage;

use clap::{Parser, Subcommand};
use cli::display::format_error;
use cli::validation::RawOrderInput;
use cli::OrderCli;
use config::{Config, LoggingConfig};
use errors::{OrderError, Result};
use std::fs::OpenOptions;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "Testnet Order Placer")]
#[command(author = "Testnet Order Placer Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Place BUY/SELL orders on the Binance spot testnet", long_about = None)]
struct Args {
    /// Path to configuration file (optional; defaults apply when missing)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Prompt for an order and confirm before placing it (default)
    Interactive,

    /// Place an order directly, without confirmation
    Place {
        /// Trading pair (e.g., BTCUSDT)
        symbol: String,
        /// Order side: BUY or SELL
        side: String,
        /// Order type: MARKET or LIMIT
        order_type: String,
        /// Order quantity
        quantity: String,
        /// Price (required for LIMIT orders)
        #[arg(long)]
        price: Option<String>,
    },

    /// Show trading permission and non-zero balances
    Account,

    /// Check that the exchange API is reachable
    Ping,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Initialization error: {}", e);
            eprintln!("Please check your API credentials in the environment or .env file");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("❌ {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting testnet order placer v0.1.0");
    info!("Exchange: {}", config.exchange.endpoint());

    let cli = match OrderCli::new(&config) {
        Ok(cli) => cli,
        Err(e) => {
            error!("Failed to initialize client: {}", e);
            eprintln!("❌ Initialization error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.mode.unwrap_or(Mode::Interactive) {
        Mode::Interactive => cli.run_interactive(io::stdin().lock(), io::stdout()).await,
        Mode::Place {
            symbol,
            side,
            order_type,
            quantity,
            price,
        } => {
            let raw = RawOrderInput {
                symbol,
                side,
                order_type,
                quantity,
                price,
            };
            cli.run_from_args(&raw, &mut io::stdout()).await
        }
        Mode::Account => cli.run_account(&mut io::stdout()).await,
        Mode::Ping => cli.run_ping(&mut io::stdout()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Order placement failed: {}", e);
            eprintln!("❌ Error: {}", format_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// Console output goes to stderr at `logging.level` (or `RUST_LOG`); the
/// diagnostic file is appended at `logging.file_level`.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| OrderError::ConfigError(format!("Invalid log level: {}", e)))?;
    let file_filter = EnvFilter::try_new(&logging.file_level)
        .map_err(|e| OrderError::ConfigError(format!("Invalid file log level: {}", e)))?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file_output)
        .map_err(|e| {
            OrderError::ConfigError(format!(
                "Failed to open log file {}: {}",
                logging.file_output, e
            ))
        })?;

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| OrderError::Unknown(format!("Failed to set logger: {}", e)))?;

    Ok(())
}
