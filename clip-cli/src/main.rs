//! # netclipper
//!
//! Share a text clipboard between two machines.
//!
//! Both machines hold the same key file. One listens, the other connects;
//! from then on anything copied on one side shows up on the other.
//!
//! ## Example
//!
//! ```bash
//! # Create a key and copy ~/.netclip to the other machine
//! netclipper keygen
//!
//! # Machine A
//! netclipper --listen 0.0.0.0:7777
//!
//! # Machine B, printing every send and receive
//! netclipper --connect machine-a:7777 --debug
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod clipboard;
mod commands;
mod config;

use commands::{keygen, sync};
use config::{FileConfig, Overrides, Settings};

/// Share a text clipboard between two machines.
#[derive(Parser, Debug)]
#[command(name = "netclipper")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the shared key file [default: ~/.netclip]
    #[arg(short = 'k', long, global = true)]
    key_file: Option<PathBuf>,

    /// Print a line for every send and receive attempt
    #[arg(short = 'd', long)]
    debug: bool,

    /// Connect to a peer listening at this address
    #[arg(long, value_name = "ADDR", conflicts_with = "listen")]
    connect: Option<String>,

    /// Wait for a peer to connect on this address
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How often to read the clipboard, in milliseconds [default: 250]
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new shared key file
    Keygen {
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path).await?,
        None => FileConfig::default(),
    };
    init_tracing(cli.debug || file.debug);

    match cli.command {
        Some(Commands::Keygen { force }) => {
            let key_file = match cli.key_file.or(file.key_file) {
                Some(path) => path,
                None => config::default_key_file()?,
            };
            keygen::run(&key_file, force).await?;
        }
        None => {
            let default_key_file = match &cli.key_file {
                Some(path) => path.clone(),
                None => config::default_key_file()?,
            };
            let flags = Overrides {
                key_file: cli.key_file,
                debug: cli.debug,
                connect: cli.connect,
                listen: cli.listen,
                poll_interval_ms: cli.poll_interval_ms,
            };
            let settings = Settings::resolve(file, flags, default_key_file)?;
            sync::run(settings).await?;
        }
    }

    Ok(())
}

/// Built-in log filter. `--debug` turns on the send/receive lines only.
fn default_filter(debug: bool) -> String {
    if debug {
        format!("warn,{}=info", clip_client::DEBUG_TARGET)
    } else {
        "warn".to_string()
    }
}

/// Log to stderr. `RUST_LOG` wins over the built-in filter.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
