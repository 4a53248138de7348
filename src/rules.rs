//! Hreflang rule engine.
//!
//! Each declaration is checked independently, in the context of every other
//! declaration on the same page. All applicable checks run; findings are
//! split into errors (structural problems) and warnings (SEO hygiene).

use crate::config::SameDomainMode;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub const X_DEFAULT: &str = "x-default";

pub const INVALID_FORMAT: &str = "Invalid hreflang format";
pub const SELF_REFERENCE_WITHOUT_REGION: &str = "Self-reference without region";
pub const INVALID_URL: &str = "Invalid URL format";
pub const NOT_SAME_DOMAIN: &str = "Alternate URL not in same domain";

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// One `(hreflang, href)` pair found on a source page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HreflangDeclaration {
    /// Lowercased hreflang value
    pub tag: String,
    /// Absolute target URL
    pub target: String,
}

impl HreflangDeclaration {
    pub fn new(tag: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            target: target.into(),
        }
    }
}

/// Warnings and errors raised for a single declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFindings {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl RuleFindings {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

pub fn missing_fallback_message(language: &str) -> String {
    format!("Missing region-independent link for {}", language)
}

/// Run every check against `declaration`.
///
/// `page` is the full set of declarations found on `source_url`, including
/// `declaration` itself.
pub fn evaluate(
    declaration: &HreflangDeclaration,
    source_url: &str,
    page: &[HreflangDeclaration],
    mode: SameDomainMode,
) -> RuleFindings {
    let mut findings = RuleFindings::default();
    let tag = declaration.tag.as_str();
    let target = declaration.target.as_str();

    if !is_valid_tag(tag) {
        findings.errors.push(INVALID_FORMAT.to_string());
    }

    if target == source_url && !tag.contains('-') && tag != X_DEFAULT {
        findings.errors.push(SELF_REFERENCE_WITHOUT_REGION.to_string());
    }

    if let Some(language) = regional_language(tag) {
        if !page.iter().any(|d| d.tag == language) {
            findings.warnings.push(missing_fallback_message(language));
        }
    }

    if !has_http_scheme(target) {
        findings.errors.push(INVALID_URL.to_string());
    }

    if !target.contains("sitemap") && !is_same_domain(source_url, target, mode) {
        findings.warnings.push(NOT_SAME_DOMAIN.to_string());
    }

    findings
}

/// `xx`, `xx-yy` (lowercase ASCII letters) or the literal `x-default`.
pub fn is_valid_tag(tag: &str) -> bool {
    let regex = TAG_REGEX.get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]{2})?$").unwrap());
    tag == X_DEFAULT || regex.is_match(tag)
}

/// Primary subtag of a region-qualified tag (`en` for `en-gb`).
///
/// `x-default` is deliberately not region-qualified, so it never asks for a
/// bare `x` fallback.
pub fn regional_language(tag: &str) -> Option<&str> {
    if tag == X_DEFAULT {
        return None;
    }
    tag.split_once('-').map(|(language, _)| language)
}

pub fn has_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Whether `target` belongs to the same site as `source`.
///
/// In [`SameDomainMode::Origin`] both URLs must parse and share scheme, host
/// and port. [`SameDomainMode::Prefix`] is the literal string-prefix test.
pub fn is_same_domain(source: &str, target: &str, mode: SameDomainMode) -> bool {
    match mode {
        SameDomainMode::Prefix => target.starts_with(source),
        SameDomainMode::Origin => match (Url::parse(source), Url::parse(target)) {
            (Ok(source), Ok(target)) => {
                source.scheme() == target.scheme()
                    && source.host_str() == target.host_str()
                    && source.port_or_known_default() == target.port_or_known_default()
            }
            _ => false,
        },
    }
}
