use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use frame_relay::{HubConfig, RelayServer, ServerConfig};

/// Real-time WebSocket relay for live frame streams
#[derive(Parser, Debug)]
#[command(name = "frame-relay", version)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = frame_relay::server::DEFAULT_PORT)]
    port: u16,

    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Health monitor period in milliseconds
    #[arg(long, default_value_t = 1000)]
    monitor_interval_ms: u64,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_connections: usize,

    /// Prefix prepended to every relayed frame, e.g. "data:image/jpeg;base64,"
    #[arg(long)]
    frame_prefix: Option<String>,
}

#[tokio::main]
async fn main() -> frame_relay::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.monitor_interval_ms == 0 {
        return Err(frame_relay::Error::Config(
            "monitor interval must be greater than zero".into(),
        ));
    }

    let config = ServerConfig::with_addr(SocketAddr::new(args.host, args.port))
        .max_connections(args.max_connections);

    let mut hub_config =
        HubConfig::default().monitor_interval(Duration::from_millis(args.monitor_interval_ms));
    if let Some(prefix) = args.frame_prefix {
        hub_config = hub_config.frame_prefix(prefix);
    }

    tracing::info!(
        addr = %config.bind_addr,
        monitor_interval_ms = args.monitor_interval_ms,
        max_connections = args.max_connections,
        "Starting frame-relay"
    );

    let server = RelayServer::with_hub_config(config, hub_config);
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
