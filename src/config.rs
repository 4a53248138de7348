use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// How the cross-domain rule decides whether an alternate URL is "ours"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameDomainMode {
    /// Compare scheme, host and port of source and target
    #[default]
    Origin,
    /// Target must start with the literal source URL string
    Prefix,
}

impl std::str::FromStr for SameDomainMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "origin" => Ok(SameDomainMode::Origin),
            "prefix" => Ok(SameDomainMode::Prefix),
            other => bail!("Unknown SAME_DOMAIN_MODE: {}. Expected origin or prefix", other),
        }
    }
}

/// Export format for the analysis records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Unknown OUTPUT_FORMAT: {}. Expected csv or json", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Input
    pub sitemap_url: Option<String>,
    pub urls_file: String,

    // Crawling
    pub concurrency: usize,
    pub request_delay: Duration,
    pub page_timeout: Duration,
    pub sitemap_timeout: Duration,
    pub sitemap_max_depth: usize,
    pub user_agents_file: Option<String>,

    // Rules
    pub same_domain_mode: SameDomainMode,

    // Output
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
}

pub const MAX_CONCURRENCY: usize = 10;

impl Default for Config {
    fn default() -> Self {
        Self {
            sitemap_url: None,
            urls_file: "data/urls.txt".to_string(),
            concurrency: 3,
            request_delay: Duration::from_millis(500),
            page_timeout: Duration::from_secs(15),
            sitemap_timeout: Duration::from_secs(10),
            sitemap_max_depth: 10,
            user_agents_file: None,
            same_domain_mode: SameDomainMode::Origin,
            output_dir: PathBuf::from("output"),
            output_format: OutputFormat::Csv,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            // Input
            sitemap_url: std::env::var("SITEMAP_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            urls_file: std::env::var("URLS_FILE").unwrap_or(defaults.urls_file),

            // Crawling
            concurrency: std::env::var("CONCURRENCY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.concurrency)
                .clamp(1, MAX_CONCURRENCY),
            request_delay: std::env::var("REQUEST_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_delay),
            page_timeout: std::env::var("PAGE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.page_timeout),
            sitemap_timeout: std::env::var("SITEMAP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.sitemap_timeout),
            sitemap_max_depth: std::env::var("SITEMAP_MAX_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sitemap_max_depth),
            user_agents_file: std::env::var("USER_AGENTS_FILE").ok(),

            // Rules
            same_domain_mode: match std::env::var("SAME_DOMAIN_MODE") {
                Ok(v) => v.parse().context("Invalid SAME_DOMAIN_MODE")?,
                Err(_) => defaults.same_domain_mode,
            },

            // Output
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            output_format: match std::env::var("OUTPUT_FORMAT") {
                Ok(v) => v.parse().context("Invalid OUTPUT_FORMAT")?,
                Err(_) => defaults.output_format,
            },
        })
    }
}

/// Split a block of text into page URLs: one per line, trimmed, blanks dropped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
