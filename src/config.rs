use anyhow::{Result, anyhow};
use clap::Parser;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Command line flags. Target and timeout come from the environment.
#[derive(Debug, Parser)]
#[command(name = "check_tcp", version, about = "One-shot TCP reachability check")]
pub struct Cli {
    /// Print more information to logs
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProbeConfig {
    pub addr: String,
    pub timeout_ms: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl ProbeConfig {
    /// Load from `ADDR`, `TIMEOUT`, `LOG_LEVEL` and `LOG_FORMAT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let timeout_ms = match var("TIMEOUT") {
            Some(t) => parse_timeout_ms(&t)?,
            None => DEFAULT_TIMEOUT_MS,
        };
        let log_format = match var("LOG_FORMAT") {
            Some(f) => parse_log_format(&f)?,
            None => LogFormat::default(),
        };

        let config = ProbeConfig {
            addr: var("ADDR").unwrap_or_default(),
            timeout_ms,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
        };
        config.validate_log_level()?;
        Ok(config)
    }

    /// Force debug logging, as requested by `-v`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.log_level = "debug".to_string();
        }
        self
    }

    /// Target must be non-empty before any probe is attempted
    pub fn validate_addr(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(anyhow!("invalid dest: {:?}", self.addr));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(anyhow!(
                "Invalid log level: {}. Valid levels are: trace, debug, info, warn, error",
                self.log_level
            )),
        }
    }

    /// Validate the log level is one of the supported values
    pub fn validate_log_level(&self) -> Result<()> {
        self.get_tracing_level().map(|_| ())
    }
}

/// Milliseconds, positive and within a signed 16-bit range.
fn parse_timeout_ms(raw: &str) -> Result<u64> {
    let ms: i16 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid timeout: {raw}: {e}"))?;
    if ms <= 0 {
        return Err(anyhow!("invalid timeout: {raw}: must be positive"));
    }
    Ok(ms as u64)
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.to_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => Err(anyhow!("Invalid log format: {raw}. Valid formats are: text, json")),
    }
}
