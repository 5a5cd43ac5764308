mod config;
mod dns_header;
mod dns_message;
mod dns_name;
mod dns_question_and_answer;
mod error;
mod forwarder;
mod local;
mod server;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{ServerConfig, DEFAULT_BIND_ADDR, DEFAULT_RESOLVER_TIMEOUT_MS};
use server::DnsServer;

#[derive(Parser, Debug)]
#[command(name = "dns-relay")]
struct Args {
    /// Upstream DNS resolver address (e.g., 8.8.8.8:53)
    #[arg(long)]
    resolver: Option<String>,

    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// How long to wait for each upstream reply, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RESOLVER_TIMEOUT_MS,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let config = ServerConfig::new(&args.bind, args.resolver.as_deref(), args.timeout_ms)
        .context("Invalid configuration")?;

    let server = DnsServer::new(&config)
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on {}", server.local_addr()?);

    server.run();

    Ok(())
}
