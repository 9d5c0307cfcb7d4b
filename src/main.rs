mod config;
mod metrics;
mod prober;
mod util;

use clap::Parser;
use config::{Cli, LogFormat, ProbeConfig};
use metrics::IntegrationData;
use prober::tcp_connect::TcpProbe;

use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config first to get log level
    let config = ProbeConfig::from_env()?.with_verbose(cli.verbose);
    let log_level = config.get_tracing_level()?;
    init_tracing(log_level, config.log_format)?;
    debug!(config = %serde_json::to_string(&config)?, "loaded config");

    if let Err(e) = config.validate_addr() {
        error!("{e}");
        return Err(e);
    }

    let probe = TcpProbe::new(config.addr.clone(), config.timeout());
    let status = probe.run().await;

    let mut data = IntegrationData::default();
    data.push(status);
    println!("{}", data.to_json()?);

    Ok(())
}

/// Logs go to stderr; stdout carries only the integration record.
fn init_tracing(level: tracing::Level, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("check_tcp={}", level.as_str().to_lowercase()).parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}
