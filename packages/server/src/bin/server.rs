//! Engawa chat relay server.
//!
//! Clients create chats over HTTP, attach a WebSocket stream to a chat and
//! receive every message sent to it while attached.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET_KEY=secret cargo run --bin engawa-relay
//! cargo run --bin engawa-relay -- --host 0.0.0.0 --port 3000 --jwt-secret secret
//! ```

use std::time::Duration;

use clap::Parser;
use engawa_relay::{
    infrastructure::{
        broadcast::{DriverSettings, MAX_GARBAGE_CYCLE},
        metrics,
    },
    ui::{Server, ServerConfig, guard::DEFAULT_GUARDED_METHODS},
};
use engawa_shared::{logger::setup_logger, time::parse_duration};
use metrics_exporter_prometheus::PrometheusBuilder;

#[derive(Parser, Debug)]
#[command(name = "engawa-relay")]
#[command(about = "Chat relay with live room streaming", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// HS256 secret used to verify access tokens
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    jwt_secret: String,

    /// Base URL of the authorization service
    #[arg(long, env = "AUTH_SERVICE_URL", default_value = "http://localhost:50501")]
    auth_service_url: String,

    /// Interval between idle-room checks
    #[arg(long, env = "CHAT_GARBAGE_CYCLE", default_value = "10s", value_parser = parse_interval)]
    garbage_cycle: Duration,

    /// How long a room may stay empty before it is evicted
    #[arg(long, env = "CHAT_EXPIRED", default_value = "1m", value_parser = parse_duration)]
    chat_expiration: Duration,

    /// Comma-separated method names that require an access token
    /// (must include Connect, SendMessage and Delete)
    #[arg(
        long,
        env = "GUARDED_METHODS",
        value_delimiter = ',',
        default_values = DEFAULT_GUARDED_METHODS
    )]
    guarded_methods: Vec<String>,

    /// Connect/SendMessage admissions per period (0 disables rate limiting)
    #[arg(long, env = "RATE_LIMIT", default_value = "0")]
    rate_limit: u64,

    /// Rate limit refill period
    #[arg(long, env = "RATE_PERIOD", default_value = "1s", value_parser = parse_interval)]
    rate_period: Duration,
}

/// Like `parse_duration`, but only accepts `(0, 24h]`: these values drive timers.
fn parse_interval(input: &str) -> Result<Duration, String> {
    match parse_duration(input) {
        Ok(duration) if duration.is_zero() => Err("interval must be greater than zero".to_string()),
        Ok(duration) if duration > MAX_GARBAGE_CYCLE => Err(format!(
            "interval must be at most {}s",
            MAX_GARBAGE_CYCLE.as_secs()
        )),
        Ok(duration) => Ok(duration),
        Err(e) => Err(e.to_string()),
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            jwt_secret: args.jwt_secret,
            auth_service_url: args.auth_service_url,
            guarded_methods: args.guarded_methods,
            driver: DriverSettings {
                garbage_cycle: args.garbage_cycle,
                chat_expiration: args.chat_expiration,
            },
            rate_limit: (args.rate_limit > 0).then_some((args.rate_limit, args.rate_period)),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let mut server = Server::new(args.into());
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::describe();
            server = server.with_metrics_handle(handle);
        }
        Err(e) => tracing::warn!(error = %e, "failed to install metrics recorder"),
    }

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
