use anyhow::{anyhow, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;

/// TailorFlow - resume tailoring terminal client
///
/// Interactive terminal UI for parsing a resume against a job description,
/// scoring the match, rewriting bullets and exporting a tailored DOCX.
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "tailorflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resume tailoring terminal client", long_about = None)]
pub struct CliArgs {
    /// Backend base URL
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Bearer token attached to backend requests (optional)
    #[arg(long, env = "API_TOKEN")]
    pub api_token: Option<String>,

    /// Request timeout in milliseconds (1000-120000)
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Retry attempt budget for failed requests (0-10)
    #[arg(long, env = "REQUEST_RETRIES")]
    pub retries: Option<u32>,

    /// Directory for history and settings files
    #[arg(long, env = "TAILORFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Optional deep link selecting the initial view
    /// (e.g. "tailorflow://v1/history")
    pub route: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub timeout_ms: u64,
    pub timeout_explicit: bool, // true if set via env var or CLI
    pub retries: u32,
    pub data_dir: PathBuf,
    pub route: Option<String>,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic scheme check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

fn default_data_dir() -> PathBuf {
    env::var("HOME")
        .map(|h| PathBuf::from(h).join(".tailorflow"))
        .unwrap_or_else(|_| PathBuf::from(".tailorflow"))
}

/// Load configuration from CLI args and environment variables
/// Priority: CLI args > Environment variables > Defaults
pub fn load() -> Result<Config> {
    let args = CliArgs::parse();
    load_from(args)
}

fn load_from(args: CliArgs) -> Result<Config> {
    let api_url = args
        .api_url
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    validate_url(&api_url, "API_URL")?;

    // Persisted user settings carry their own timeout; an explicit CLI/env
    // value overrides it for this run.
    let timeout_explicit = args.timeout_ms.is_some();
    let timeout_ms = args.timeout_ms.unwrap_or(30_000);
    let timeout_ms = validate_in_range(timeout_ms, 1000, 120_000, "REQUEST_TIMEOUT_MS")?;

    let retries = args.retries.unwrap_or(2);
    let retries = validate_in_range(retries, 0, 10, "REQUEST_RETRIES")?;

    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);

    Ok(Config {
        api_url,
        api_token: args.api_token,
        timeout_ms,
        timeout_explicit,
        retries,
        data_dir,
        route: args.route,
    })
}

impl Config {
    /// Print current configuration (useful for debugging)
    #[allow(dead_code)]
    pub fn print_summary(&self) {
        eprintln!("TailorFlow Configuration:");
        eprintln!("  API URL: {}", self.api_url);
        eprintln!("  Timeout: {}ms", self.timeout_ms);
        eprintln!("  Retries: {}", self.retries);
        eprintln!("  Data dir: {}", self.data_dir.display());
        if self.api_token.is_some() {
            eprintln!("  API token: configured");
        }
    }
}
