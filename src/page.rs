use crate::config::SameDomainMode;
use crate::fetch::Fetcher;
use crate::locale;
use crate::record::{join_messages, AnalysisRecord};
use crate::rules::{self, HreflangDeclaration};
use scraper::{Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

static LINK_SELECTOR: OnceLock<Selector> = OnceLock::new();

/// Settings the page analyzer needs beyond the URL itself
#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    pub timeout: Duration,
    pub same_domain_mode: SameDomainMode,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            same_domain_mode: SameDomainMode::Origin,
        }
    }
}

/// Fetch `page_url` and produce one record per hreflang declaration.
///
/// A fetch failure never propagates: it becomes a single error record.
pub async fn analyze_page(
    fetcher: &Fetcher,
    page_url: &str,
    options: &PageOptions,
) -> Vec<AnalysisRecord> {
    match fetcher.get_text(page_url, options.timeout).await {
        Ok(body) => analyze_html(page_url, &body, options.same_domain_mode),
        Err(e) => {
            warn!("Failed to analyze {}: {}", page_url, e);
            vec![AnalysisRecord::failure(page_url, e)]
        }
    }
}

/// Run extraction and the rule engine over an already-fetched document.
pub fn analyze_html(page_url: &str, html: &str, mode: SameDomainMode) -> Vec<AnalysisRecord> {
    let declarations = extract_declarations(page_url, html);
    debug!("{}: {} hreflang declarations", page_url, declarations.len());

    let count = declarations.len();
    let self_ref = declarations.iter().any(|d| d.target == page_url);

    declarations
        .iter()
        .map(|declaration| {
            let findings = rules::evaluate(declaration, page_url, &declarations, mode);
            let (language, region) = locale::describe_tag(&declaration.tag);

            AnalysisRecord {
                url: page_url.to_string(),
                hreflang_count: count,
                self_ref,
                hreflang_tag: declaration.tag.clone(),
                language,
                region,
                alt_url: declaration.target.clone(),
                warnings: join_messages(&findings.warnings),
                errors: join_messages(&findings.errors),
            }
        })
        .collect()
}

/// Every `<link rel="alternate" hreflang="...">` in document order.
///
/// Tags are lowercased but otherwise kept as written, so padded or blank
/// values reach the format check. Relative hrefs are resolved against
/// `page_url`.
pub fn extract_declarations(page_url: &str, html: &str) -> Vec<HreflangDeclaration> {
    let selector = LINK_SELECTOR.get_or_init(|| Selector::parse("link[hreflang]").unwrap());
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    document
        .select(selector)
        .filter(|link| {
            link.value()
                .attr("rel")
                .map(has_alternate_rel)
                .unwrap_or(false)
        })
        .filter_map(|link| {
            let tag = link.value().attr("hreflang")?.to_lowercase();
            if tag.is_empty() {
                return None;
            }
            let href = link.value().attr("href").unwrap_or("").trim();
            Some(HreflangDeclaration::new(tag, resolve_href(base.as_ref(), href)))
        })
        .collect()
}

fn has_alternate_rel(rel: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case("alternate"))
}

/// Absolute hrefs are kept verbatim; anything else is joined onto the page
/// URL when possible.
fn resolve_href(base: Option<&Url>, href: &str) -> String {
    if href.is_empty() || rules::has_http_scheme(href) {
        return href.to_string();
    }

    base.and_then(|base| base.join(href).ok())
        .map(String::from)
        .unwrap_or_else(|| href.to_string())
}
