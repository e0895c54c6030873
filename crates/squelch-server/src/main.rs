//! Squelch relay binary.
//!
//! # Usage
//!
//! ```bash
//! # Direct routing (messages name their recipient)
//! squelch-server --bind 0.0.0.0:7878
//!
//! # Radio-net routing (everyone hears everyone, senders are labeled)
//! squelch-server --bind 0.0.0.0:7878 --radio-net
//! ```

use clap::Parser;
use squelch_server::{
    DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_LABELS, DriverConfig, RelayConfig, RoutingPolicy, Server,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Squelch relay server
#[derive(Parser, Debug)]
#[command(name = "squelch-server")]
#[command(about = "Relay for sealed Squelch messages")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    bind: String,

    /// Broadcast every message to all other users with anonymous labels
    #[arg(long)]
    radio_net: bool,

    /// Maximum concurrent connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,

    /// Senders remembered per receiver in radio-net mode
    #[arg(long, default_value_t = DEFAULT_MAX_LABELS)]
    max_labels: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> RelayConfig {
        let policy = if self.radio_net { RoutingPolicy::RadioNet } else { RoutingPolicy::Direct };

        RelayConfig {
            bind_address: self.bind,
            driver: DriverConfig {
                policy,
                max_connections: self.max_connections,
                max_labels: self.max_labels,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Squelch relay starting");
    tracing::info!("Binding to {}", args.bind);

    let server = Server::bind(args.into_config()).await?;

    tracing::info!("Relay listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
