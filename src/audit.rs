//! Batch analysis of many pages.
//!
//! Pages run on a bounded pool; results come back in input order. Fetches to
//! the same host are spaced by a politeness delay, and a run can be aborted
//! between pages.

use crate::config::Config;
use crate::fetch::Fetcher;
use crate::page::{analyze_page, PageOptions};
use crate::record::AnalysisRecord;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Shared flag that stops a run before its next page starts.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Spaces successive fetch starts to the same host by at least `delay`.
#[derive(Debug)]
pub struct HostRateLimiter {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl HostRateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until a fetch to `url`'s host may start, reserving that slot.
    pub async fn acquire(&self, url: &str) {
        if self.delay.is_zero() {
            return;
        }

        let host = host_key(url);
        let start = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let start = slots.get(&host).copied().map_or(now, |slot| slot.max(now));
            slots.insert(host.clone(), start + self.delay);
            start
        };

        if start > Instant::now() {
            debug!("Waiting for politeness slot on {}", host);
            tokio::time::sleep_until(start).await;
        }
    }
}

fn host_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

/// Knobs for a batch run
#[derive(Debug, Clone, Copy)]
pub struct AuditOptions {
    pub concurrency: usize,
    pub request_delay: Duration,
    pub page: PageOptions,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            concurrency: 3,
            request_delay: Duration::from_millis(500),
            page: PageOptions::default(),
        }
    }
}

impl From<&Config> for AuditOptions {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency,
            request_delay: config.request_delay,
            page: PageOptions {
                timeout: config.page_timeout,
                same_domain_mode: config.same_domain_mode,
            },
        }
    }
}

/// Result of one batch run, owned by the caller
#[derive(Debug, Default)]
pub struct AuditOutcome {
    pub records: Vec<AnalysisRecord>,
    /// Pages actually fetched and analyzed
    pub pages_analyzed: usize,
    /// Pages skipped because the run was aborted
    pub pages_skipped: usize,
    pub aborted: bool,
}

/// Analyze every URL in `urls`, returning a fresh record collection.
pub async fn run_audit(
    fetcher: &Fetcher,
    urls: &[String],
    options: &AuditOptions,
    abort: &AbortSignal,
) -> AuditOutcome {
    let total = urls.len();
    let limiter = HostRateLimiter::new(options.request_delay);
    let completed = AtomicUsize::new(0);
    let concurrency = options.concurrency.max(1);

    info!(
        "Analyzing {} URLs (concurrency {}, {:?} per-host delay)",
        total, concurrency, options.request_delay
    );

    let results: Vec<Option<Vec<AnalysisRecord>>> = stream::iter(urls.iter())
        .map(|url| {
            let limiter = &limiter;
            let completed = &completed;
            async move {
                if abort.is_aborted() {
                    return None;
                }
                limiter.acquire(url).await;
                if abort.is_aborted() {
                    return None;
                }

                let records = analyze_page(fetcher, url, &options.page).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                info!(
                    "[{}/{}] {} - {} hreflang entries",
                    done,
                    total,
                    url,
                    records.iter().filter(|r| !r.hreflang_tag.is_empty()).count()
                );
                Some(records)
            }
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut outcome = AuditOutcome::default();
    for result in results {
        match result {
            Some(records) => {
                outcome.pages_analyzed += 1;
                outcome.records.extend(records);
            }
            None => outcome.pages_skipped += 1,
        }
    }
    outcome.aborted = outcome.pages_skipped > 0;

    if outcome.aborted {
        warn!(
            "Run aborted: {} of {} URLs skipped",
            outcome.pages_skipped, total
        );
    }
    info!(
        "Analyzed {} URLs, found {} hreflang entries",
        outcome.pages_analyzed,
        outcome.records.len()
    );

    outcome
}
