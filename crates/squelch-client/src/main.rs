//! Squelch command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Talk to bob through a direct relay
//! SQUELCH_KEY='correct horse' squelch --name alice --to bob
//!
//! # Join a radio-net relay with the key in a file
//! squelch --server relay.example:7878 --name alice --key-file ~/.squelch-key
//! ```
//!
//! Typed lines are sealed and sent; received messages print as `<from> text`.
//! Logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use squelch_client::{ClientConfig, SecretSource, load_secret, run};
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Squelch client
#[derive(Parser, Debug)]
#[command(name = "squelch")]
#[command(about = "Send and receive sealed messages through a Squelch relay")]
#[command(version)]
struct Args {
    /// Relay address
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,

    /// Username to claim on the relay
    #[arg(short, long)]
    name: String,

    /// Recipient (direct relays only)
    #[arg(short, long)]
    to: Option<String>,

    /// Shared secret (visible in the process list; prefer --key-file)
    #[arg(long)]
    key: Option<String>,

    /// File holding the shared secret
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let secret = load_secret(&SecretSource::from_args(args.key, args.key_file))?;
    let config = ClientConfig { server: args.server, name: args.name, to: args.to };

    tracing::info!("connecting to {} as {}", config.server, config.name);

    run(&config, secret, BufReader::new(tokio::io::stdin()), std::io::stdout()).await?;

    Ok(())
}
