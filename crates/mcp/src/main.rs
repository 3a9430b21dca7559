//! Bookeo MCP Server Binary
//!
//! ## Usage
//!
//! ```bash
//! # stdio transport, credentials from .env or the environment
//! BOOKEO_API_KEY=... BOOKEO_API_SECRET=... bookeo-mcp
//!
//! # streamable HTTP on 0.0.0.0:8000
//! bookeo-mcp --transport http --host 0.0.0.0 --port 8000
//! ```

use std::path::PathBuf;

use anyhow::Result;
use bookeo_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, TransportMode};
use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    Stdio,
    Http,
}

impl From<TransportArg> for TransportMode {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Stdio => TransportMode::Stdio,
            TransportArg::Http => TransportMode::Http,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bookeo-mcp", version, about = "Bookeo MCP server for booking and payment lookups")]
struct Args {
    /// Transport type (default: stdio)
    #[arg(long, value_enum)]
    transport: Option<TransportArg>,
    /// Bind address for the http transport (default: 127.0.0.1)
    #[arg(long)]
    host: Option<String>,
    /// Port for the http transport (default: 8000)
    #[arg(long)]
    port: Option<u16>,
    /// Explicit config file; must exist when given
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn load_options(self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config,
            overrides: ConfigOverrides {
                transport_mode: self.transport.map(TransportMode::from),
                bind_address: self.host,
                port: self.port,
                log_level: self.log_level,
                ..ConfigOverrides::default()
            },
        }
    }
}

/// stdout is reserved for the stdio transport, so logs always go to stderr.
fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(args.load_options())?;
    init_logging(&config);

    info!(
        event_name = "system.startup",
        transport = ?config.transport.mode,
        version = env!("CARGO_PKG_VERSION"),
        "starting bookeo-mcp"
    );

    let server = bookeo_mcp::build_server(&config)?;
    match config.transport.mode {
        TransportMode::Stdio => bookeo_mcp::transport::run_stdio(server).await,
        TransportMode::Http => {
            bookeo_mcp::transport::run_http(
                server,
                &config.transport.bind_address,
                config.transport.port,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Args, TransportMode};

    #[test]
    fn cli_flags_become_overrides() {
        let args = Args::parse_from([
            "bookeo-mcp",
            "--transport",
            "http",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--log-level",
            "debug",
        ]);
        let options = args.load_options();

        assert!(!options.require_file);
        assert_eq!(options.overrides.transport_mode, Some(TransportMode::Http));
        assert_eq!(options.overrides.bind_address.as_deref(), Some("0.0.0.0"));
        assert_eq!(options.overrides.port, Some(9000));
        assert_eq!(options.overrides.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn explicit_config_path_is_required() {
        let options = Args::parse_from(["bookeo-mcp", "--config", "ops/bookeo.toml"]).load_options();
        assert!(options.require_file);
        assert_eq!(options.overrides.transport_mode, None);
    }
}
