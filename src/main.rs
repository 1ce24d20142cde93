use anyhow::{Context, Result};
use clap::Parser;
use feed_client::{write_json, ClientConfig, ResendError, Session};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Snapshot feed client with gap repair")]
struct Args {
    /// Feed server host or IP address
    #[arg(long, env = "FEED_HOST", default_value = feed_client::config::DEFAULT_HOST)]
    host: String,

    /// Feed server port
    #[arg(long, env = "FEED_PORT", default_value_t = feed_client::config::DEFAULT_PORT)]
    port: u16,

    /// Silence (ms) after which a connection is considered drained
    #[arg(
        long,
        env = "FEED_IDLE_TIMEOUT_MS",
        default_value_t = 5000,
        value_parser = clap::builder::RangedU64ValueParser::<u64>::new().range(1..)
    )]
    idle_timeout_ms: u64,

    /// Connect timeout (ms)
    #[arg(
        long,
        env = "FEED_CONNECT_TIMEOUT_MS",
        default_value_t = 5000,
        value_parser = clap::builder::RangedU64ValueParser::<u64>::new().range(1..)
    )]
    connect_timeout_ms: u64,

    /// Maximum concurrent resend connections
    #[arg(
        long,
        env = "FEED_MAX_RESEND_WORKERS",
        default_value_t = feed_client::config::DEFAULT_MAX_RESEND_WORKERS,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    max_resend_workers: usize,

    /// Output JSON file
    #[arg(long, short, env = "FEED_OUTPUT", default_value = feed_client::config::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            port: self.port,
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            max_resend_workers: self.max_resend_workers,
            output: self.output.clone(),
        }
    }
}

fn run(config: ClientConfig) -> Result<()> {
    let connector = config.connector();
    let addr = connector.addr();
    let output = config.output.clone();

    let mut session = Session::new(connector, config);
    let outcome = session
        .run()
        .with_context(|| format!("session against {addr} failed"))?;

    // Unaddressable targets were already summarized by the coordinator
    for failure in &outcome.report.failures {
        if !matches!(failure.error, ResendError::TargetOutOfRange(_)) {
            warn!(sequence = failure.sequence, error = %failure.error, "sequence left unresolved");
        }
    }
    outcome.stats.log_summary();

    write_json(&output, &outcome.packets)
        .with_context(|| format!("write {}", output.display()))?;
    info!(path = %output.display(), packets = outcome.packets.len(), "output written");
    Ok(())
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.config();
    if let Err(e) = run(config) {
        // No output file is written on a fatal error
        error!("{e:#}");
        std::process::exit(1);
    }
}
