//! Sitemap expansion.
//!
//! A sitemap index is expanded depth-first so page URLs come out in
//! index-then-document order. Every sitemap document fails on its own: a
//! broken child is recorded as an issue and its siblings are still read.

use crate::fetch::{FetchError, Fetcher};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Limits applied while expanding a sitemap tree
#[derive(Debug, Clone, Copy)]
pub struct SitemapOptions {
    pub timeout: Duration,
    /// Maximum index nesting below the root sitemap (root is depth 0)
    pub max_depth: usize,
}

impl Default for SitemapOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_depth: 10,
        }
    }
}

/// Why one sitemap document contributed no URLs
#[derive(Debug, Error)]
pub enum SitemapIssue {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("malformed XML: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("not a sitemap (root element <{0}>)")]
    UnexpectedRoot(String),

    #[error("maximum sitemap depth {0} exceeded, not expanded")]
    DepthExceeded(usize),

    #[error("already visited, skipping to avoid a cycle")]
    AlreadyVisited,
}

#[derive(Debug)]
pub struct SitemapFailure {
    pub sitemap_url: String,
    pub issue: SitemapIssue,
}

/// Everything learned from expanding one root sitemap
#[derive(Debug, Default)]
pub struct SitemapResolution {
    pub urls: Vec<String>,
    pub failures: Vec<SitemapFailure>,
}

impl SitemapResolution {
    /// Whether expansion stopped early because of the depth or cycle guard
    pub fn truncated(&self) -> bool {
        self.failures.iter().any(|f| {
            matches!(
                f.issue,
                SitemapIssue::DepthExceeded(_) | SitemapIssue::AlreadyVisited
            )
        })
    }
}

/// Parsed content of a single sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
}

/// Expand `sitemap_url` into a flat list of page URLs.
pub async fn resolve(
    fetcher: &Fetcher,
    sitemap_url: &str,
    options: &SitemapOptions,
) -> SitemapResolution {
    let mut resolution = SitemapResolution::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending: Vec<(String, usize)> = vec![(sitemap_url.to_string(), 0)];

    while let Some((url, depth)) = pending.pop() {
        if !visited.insert(url.clone()) {
            warn!("Sitemap {} already visited, skipping", url);
            record_failure(&mut resolution, url, SitemapIssue::AlreadyVisited);
            continue;
        }

        let document = match fetch_document(fetcher, &url, options.timeout).await {
            Ok(document) => document,
            Err(issue) => {
                record_failure(&mut resolution, url, issue);
                continue;
            }
        };

        match document {
            SitemapDocument::UrlSet(urls) => {
                info!("Sitemap {}: {} URLs", url, urls.len());
                resolution.urls.extend(urls);
            }
            SitemapDocument::Index(children) => {
                if depth >= options.max_depth {
                    record_failure(
                        &mut resolution,
                        url,
                        SitemapIssue::DepthExceeded(options.max_depth),
                    );
                    continue;
                }
                info!("Sitemap index {}: {} child sitemaps", url, children.len());
                // Reverse so the first child is expanded first
                pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            }
        }
    }

    info!("Found {} URLs in sitemap", resolution.urls.len());
    resolution
}

async fn fetch_document(
    fetcher: &Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<SitemapDocument, SitemapIssue> {
    let body = fetcher.get_text(url, timeout).await?;
    parse_document(&body)
}

fn record_failure(resolution: &mut SitemapResolution, sitemap_url: String, issue: SitemapIssue) {
    error!("Error processing sitemap {}: {}", sitemap_url, issue);
    resolution.failures.push(SitemapFailure { sitemap_url, issue });
}

/// Parse one sitemap document.
///
/// Element names are matched on their local part so namespaced and
/// un-namespaced sitemaps are treated alike.
pub fn parse_document(xml: &str) -> Result<SitemapDocument, SitemapIssue> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document =
        roxmltree::Document::parse_with_options(xml.trim_start_matches('\u{feff}'), options)?;
    let root = document.root_element();
    let root_name = root.tag_name().name();

    if root_name.ends_with("sitemapindex") {
        Ok(SitemapDocument::Index(locations(&root, "sitemap")))
    } else if root_name == "urlset" {
        Ok(SitemapDocument::UrlSet(locations(&root, "url")))
    } else {
        Err(SitemapIssue::UnexpectedRoot(root_name.to_string()))
    }
}

/// Text of every `<loc>` directly under an `<entry>` element, in document order.
fn locations(root: &roxmltree::Node, entry: &str) -> Vec<String> {
    root.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "loc")
        .filter(|loc| {
            loc.parent_element()
                .map(|parent| parent.tag_name().name() == entry)
                .unwrap_or(false)
        })
        .filter_map(|loc| loc.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}
