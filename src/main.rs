use anyhow::{Context, Result};
use hreflang_audit::audit::{self, AbortSignal, AuditOptions};
use hreflang_audit::config::{self, Config, OutputFormat};
use hreflang_audit::fetch::{Fetcher, UserAgentPool};
use hreflang_audit::report::{self, Summary};
use hreflang_audit::{record, sitemap};
use std::fs;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hreflang_audit=info".parse()?),
        )
        .init();

    info!("Starting hreflang audit");

    let config = Config::from_env()?;

    let user_agents = match &config.user_agents_file {
        Some(path) => UserAgentPool::from_file(path)?,
        None => UserAgentPool::default(),
    };
    let fetcher = Fetcher::new(user_agents)?;

    // Step 1: Collect page URLs
    let urls = collect_urls(&config, &fetcher).await?;
    if urls.is_empty() {
        info!("No URLs to analyze, nothing to do");
        return Ok(());
    }

    // Stop between pages on Ctrl-C
    let abort = AbortSignal::new();
    let ctrl_c = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight pages");
            ctrl_c.abort();
        }
    });

    // Step 2: Analyze pages
    let outcome = audit::run_audit(&fetcher, &urls, &AuditOptions::from(&config), &abort).await;

    // Step 3: Write reports
    write_reports(&config, &outcome.records)?;

    println!("{}", report::generate_summary(&outcome.records));
    info!("Audit complete!");
    Ok(())
}

/// Page URLs from the command line, a sitemap, or the URLs file, in that order.
async fn collect_urls(config: &Config, fetcher: &Fetcher) -> Result<Vec<String>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        info!("Using {} URLs from the command line", args.len());
        return Ok(config::parse_url_list(&args.join("\n")));
    }

    if let Some(sitemap_url) = &config.sitemap_url {
        info!("Extracting URLs from sitemap {}", sitemap_url);
        let options = sitemap::SitemapOptions {
            timeout: config.sitemap_timeout,
            max_depth: config.sitemap_max_depth,
        };
        let resolution = sitemap::resolve(fetcher, sitemap_url, &options).await;
        if resolution.truncated() {
            warn!("Sitemap expansion was truncated; some sitemaps were not read");
        }
        if !resolution.failures.is_empty() {
            warn!("{} sitemap(s) could not be processed", resolution.failures.len());
        }
        return Ok(resolution.urls);
    }

    let content = fs::read_to_string(&config.urls_file)
        .with_context(|| format!("Failed to read URLs from {}", config.urls_file))?;
    let urls = config::parse_url_list(&content);
    info!("Loaded {} URLs from {}", urls.len(), config.urls_file);
    Ok(urls)
}

fn write_reports(config: &Config, records: &[record::AnalysisRecord]) -> Result<()> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let records_path = config
        .output_dir
        .join(format!("hreflang_analysis.{}", config.output_format.extension()));
    match config.output_format {
        OutputFormat::Csv => {
            let file = fs::File::create(&records_path)
                .with_context(|| format!("Failed to create {}", records_path.display()))?;
            record::write_csv(records, file)?;
        }
        OutputFormat::Json => {
            fs::write(&records_path, record::to_json_string(records)?)
                .with_context(|| format!("Failed to write {}", records_path.display()))?;

            let summary_json = serde_json::to_string_pretty(&Summary::from_records(records))
                .context("Failed to serialize summary")?;
            fs::write(config.output_dir.join("hreflang_summary.json"), summary_json)
                .context("Failed to write JSON summary")?;
        }
    }

    fs::write(
        config.output_dir.join("hreflang_summary.txt"),
        report::generate_summary(records),
    )
    .context("Failed to write summary report")?;
    fs::write(
        config.output_dir.join("hreflang_fixes.txt"),
        report::generate_fixes(records),
    )
    .context("Failed to write fixes report")?;

    info!(
        "✓ Wrote {} records and reports to {}",
        records.len(),
        config.output_dir.display()
    );
    Ok(())
}
