//! Summary statistics and fix suggestions derived from analysis records.
//!
//! Both reports are pure functions of the record slice. The summary does not
//! depend on record order; fixes follow the first-seen order of source URLs.

use crate::record::AnalysisRecord;
use crate::rules::{self, X_DEFAULT};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write;

const RULE_WIDTH: usize = 50;
const SECTION_WIDTH: usize = 40;

/// Placeholder target suggested for a missing region-independent link
pub fn fallback_placeholder(language: &str) -> String {
    format!("https://example.com/global/{}/", language)
}

/// Aggregate counts over a set of records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_entries: usize,
    pub unique_urls: usize,
    pub languages: usize,
    pub regions: usize,
    pub records_with_warnings: usize,
    pub records_with_errors: usize,
    /// Occurrences of each individual warning message
    pub warning_counts: BTreeMap<String, usize>,
    /// Occurrences of each individual error message
    pub error_counts: BTreeMap<String, usize>,
}

impl Summary {
    pub fn from_records(records: &[AnalysisRecord]) -> Self {
        let mut urls = HashSet::new();
        let mut languages = HashSet::new();
        let mut regions = HashSet::new();
        let mut summary = Summary {
            total_entries: records.len(),
            ..Summary::default()
        };

        for record in records {
            urls.insert(record.url.as_str());
            if !record.language.is_empty() {
                languages.insert(record.language.as_str());
            }
            if !record.region.is_empty() {
                regions.insert(record.region.as_str());
            }
            if record.has_warnings() {
                summary.records_with_warnings += 1;
            }
            if record.has_errors() {
                summary.records_with_errors += 1;
            }
            for warning in record.warning_messages() {
                *summary.warning_counts.entry(warning.to_string()).or_insert(0) += 1;
            }
            for error in record.error_messages() {
                *summary.error_counts.entry(error.to_string()).or_insert(0) += 1;
            }
        }

        summary.unique_urls = urls.len();
        summary.languages = languages.len();
        summary.regions = regions.len();
        summary
    }

    /// Plain-text rendering for direct display
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("HREFLANG ANALYSIS SUMMARY\n");
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");

        let _ = writeln!(out, "Total hreflang entries: {}", self.total_entries);
        let _ = writeln!(out, "Unique URLs analyzed: {}", self.unique_urls);
        let _ = writeln!(out, "Languages detected: {}", self.languages);
        let _ = writeln!(out, "Regions detected: {}\n", self.regions);

        let _ = writeln!(out, "Warnings found: {}", self.records_with_warnings);
        let _ = writeln!(out, "Errors found: {}\n", self.records_with_errors);

        if !self.warning_counts.is_empty() {
            out.push_str("COMMON WARNINGS:\n");
            for (warning, count) in &self.warning_counts {
                let _ = writeln!(out, "  • {}: {} occurrences", warning, count);
            }
            out.push('\n');
        }

        if !self.error_counts.is_empty() {
            out.push_str("CRITICAL ERRORS:\n");
            for (error, count) in &self.error_counts {
                let _ = writeln!(out, "  • {}: {} occurrences", error, count);
            }
        }

        out
    }
}

pub fn generate_summary(records: &[AnalysisRecord]) -> String {
    Summary::from_records(records).render()
}

/// One suggested change for a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fix {
    /// No declaration on the page points back at it
    MissingSelfReference { url: String },
    /// Regional variants of `language` exist without a bare `language` tag
    MissingRegionIndependent { language: String },
    /// A declaration carrying warnings and/or errors
    FlaggedTag {
        tag: String,
        target: String,
        warnings: String,
        errors: String,
    },
}

impl Fix {
    fn render_into(&self, out: &mut String) {
        match self {
            Fix::MissingSelfReference { url } => {
                out.push_str("❌ MISSING SELF-REFERENCE:\n");
                let _ = writeln!(
                    out,
                    "   Add: <link rel=\"alternate\" hreflang=\"{}\" href=\"{}\" />\n",
                    X_DEFAULT, url
                );
            }
            Fix::MissingRegionIndependent { language } => {
                let _ = writeln!(
                    out,
                    "❌ MISSING REGION-INDEPENDENT TAG FOR {}:",
                    language.to_uppercase()
                );
                let _ = writeln!(
                    out,
                    "   Add: <link rel=\"alternate\" hreflang=\"{}\" href=\"{}\" />\n",
                    language,
                    fallback_placeholder(language)
                );
            }
            Fix::FlaggedTag {
                tag,
                target,
                warnings,
                errors,
            } => {
                let _ = writeln!(out, "Tag: {} -> {}", tag, target);
                if !warnings.is_empty() {
                    let _ = writeln!(out, "   Warnings: {}", warnings);
                }
                if !errors.is_empty() {
                    let _ = writeln!(out, "   Errors: {}", errors);
                }
                out.push('\n');
            }
        }
    }
}

/// Suggested fixes for one source URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFixes {
    pub url: String,
    pub fixes: Vec<Fix>,
}

/// Group records by source URL (first-seen order) and derive fixes for each.
pub fn suggest_fixes(records: &[AnalysisRecord]) -> Vec<PageFixes> {
    group_by_url(records)
        .into_iter()
        .map(|(url, entries)| PageFixes {
            url: url.to_string(),
            fixes: page_fixes(url, &entries),
        })
        .collect()
}

fn group_by_url(records: &[AnalysisRecord]) -> Vec<(&str, Vec<&AnalysisRecord>)> {
    let mut groups: Vec<(&str, Vec<&AnalysisRecord>)> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records {
        match index.get(record.url.as_str()) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(record.url.as_str(), groups.len());
                groups.push((record.url.as_str(), vec![record]));
            }
        }
    }

    groups
}

fn page_fixes(url: &str, entries: &[&AnalysisRecord]) -> Vec<Fix> {
    let mut fixes = Vec::new();

    if !entries.iter().any(|e| e.self_ref) {
        fixes.push(Fix::MissingSelfReference {
            url: url.to_string(),
        });
    }

    let regional: BTreeSet<&str> = entries
        .iter()
        .filter_map(|e| rules::regional_language(&e.hreflang_tag))
        .collect();
    for language in regional {
        if !entries.iter().any(|e| e.hreflang_tag == language) {
            fixes.push(Fix::MissingRegionIndependent {
                language: language.to_string(),
            });
        }
    }

    for entry in entries {
        if entry.has_warnings() || entry.has_errors() {
            fixes.push(Fix::FlaggedTag {
                tag: entry.hreflang_tag.clone(),
                target: entry.alt_url.clone(),
                warnings: entry.warnings.clone(),
                errors: entry.errors.clone(),
            });
        }
    }

    fixes
}

/// Plain-text fix list for direct display
pub fn generate_fixes(records: &[AnalysisRecord]) -> String {
    let mut out = String::new();
    out.push_str("RECOMMENDED HREFLANG FIXES\n");
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    for page in suggest_fixes(records) {
        let _ = writeln!(out, "URL: {}", page.url);
        out.push_str(&"-".repeat(SECTION_WIDTH));
        out.push('\n');

        for fix in &page.fixes {
            fix.render_into(&mut out);
        }

        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==================== Helper Functions ====================

    fn record(url: &str, tag: &str, target: &str, self_ref: bool) -> AnalysisRecord {
        let (language, region) = crate::locale::describe_tag(tag);
        AnalysisRecord {
            url: url.to_string(),
            hreflang_count: 0,
            self_ref,
            hreflang_tag: tag.to_string(),
            language,
            region,
            alt_url: target.to_string(),
            warnings: String::new(),
            errors: String::new(),
        }
    }

    fn with_issues(mut r: AnalysisRecord, warnings: &str, errors: &str) -> AnalysisRecord {
        r.warnings = warnings.to_string();
        r.errors = errors.to_string();
        r
    }

    fn sample() -> Vec<AnalysisRecord> {
        vec![
            with_issues(
                record("https://a.test/", "en-us", "https://a.test/us", false),
                "Missing region-independent link for en",
                "",
            ),
            with_issues(
                record("https://a.test/", "en-gb", "https://b.test/gb", false),
                "Missing region-independent link for en; Alternate URL not in same domain",
                "",
            ),
            with_issues(
                record("https://b.test/", "fr", "https://b.test/", true),
                "",
                "Self-reference without region",
            ),
            record("https://b.test/", "fr-ca", "https://b.test/ca", true),
            AnalysisRecord::failure("https://c.test/", "HTTP 503"),
        ]
    }

    // ==================== Summary Tests ====================

    #[test]
    fn test_summary_counts() {
        let summary = Summary::from_records(&sample());

        assert_eq!(summary.total_entries, 5);
        assert_eq!(summary.unique_urls, 3);
        assert_eq!(summary.languages, 2); // English, French
        assert_eq!(summary.regions, 3); // United States, United Kingdom, Canada
        assert_eq!(summary.records_with_warnings, 2);
        assert_eq!(summary.records_with_errors, 2);
        assert_eq!(
            summary.warning_counts.get("Missing region-independent link for en"),
            Some(&2)
        );
        assert_eq!(
            summary.warning_counts.get("Alternate URL not in same domain"),
            Some(&1)
        );
        assert_eq!(
            summary.error_counts.get("Self-reference without region"),
            Some(&1)
        );
        assert_eq!(
            summary.error_counts.get("Failed to analyze: HTTP 503"),
            Some(&1)
        );
    }

    #[test]
    fn test_summary_render() {
        let text = generate_summary(&sample());

        assert!(text.starts_with("HREFLANG ANALYSIS SUMMARY\n==================================================\n\n"));
        assert!(text.contains("Total hreflang entries: 5\n"));
        assert!(text.contains("Unique URLs analyzed: 3\n"));
        assert!(text.contains("Languages detected: 2\n"));
        assert!(text.contains("Regions detected: 3\n\n"));
        assert!(text.contains("Warnings found: 2\n"));
        assert!(text.contains("Errors found: 2\n\n"));
        assert!(text.contains("COMMON WARNINGS:\n  • Alternate URL not in same domain: 1 occurrences\n  • Missing region-independent link for en: 2 occurrences\n\n"));
        assert!(text.contains("CRITICAL ERRORS:\n"));
        assert!(text.contains("  • Self-reference without region: 1 occurrences\n"));
    }

    #[test]
    fn test_summary_of_nothing() {
        let text = generate_summary(&[]);
        assert!(text.contains("Total hreflang entries: 0"));
        assert!(!text.contains("COMMON WARNINGS"));
        assert!(!text.contains("CRITICAL ERRORS"));
    }

    proptest! {
        #[test]
        fn prop_summary_is_order_independent(seed in any::<u64>()) {
            let mut records = sample();
            records.extend(sample());
            let expected = Summary::from_records(&records);

            // Fisher-Yates driven by the seed
            let mut state = seed;
            for i in (1..records.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                records.swap(i, j);
            }

            let shuffled = Summary::from_records(&records);
            prop_assert_eq!(&shuffled, &expected);
            prop_assert_eq!(shuffled.render(), expected.render());
        }
    }

    // ==================== Fix Tests ====================

    #[test]
    fn test_fixes_grouped_in_first_seen_order() {
        let pages = suggest_fixes(&sample());
        let urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/", "https://b.test/", "https://c.test/"]);
    }

    #[test]
    fn test_fixes_for_page_without_self_reference() {
        let pages = suggest_fixes(&sample());
        let first = &pages[0];

        assert_eq!(
            first.fixes[0],
            Fix::MissingSelfReference {
                url: "https://a.test/".to_string()
            }
        );
        assert_eq!(
            first.fixes[1],
            Fix::MissingRegionIndependent {
                language: "en".to_string()
            }
        );
        assert_eq!(first.fixes.len(), 4); // + two flagged tags
    }

    #[test]
    fn test_fixes_with_fallback_present() {
        let pages = suggest_fixes(&sample());
        let second = &pages[1];

        // b.test self-references and has bare "fr"; only the flagged tag remains
        assert_eq!(
            second.fixes,
            vec![Fix::FlaggedTag {
                tag: "fr".to_string(),
                target: "https://b.test/".to_string(),
                warnings: String::new(),
                errors: "Self-reference without region".to_string(),
            }]
        );
    }

    #[test]
    fn test_fixes_for_failed_page() {
        let pages = suggest_fixes(&sample());
        let third = &pages[2];

        assert!(matches!(third.fixes[0], Fix::MissingSelfReference { .. }));
        assert!(matches!(third.fixes[1], Fix::FlaggedTag { .. }));
    }

    #[test]
    fn test_x_default_is_not_a_regional_variant() {
        let records = vec![record("https://d.test/", "x-default", "https://d.test/", true)];
        let pages = suggest_fixes(&records);
        assert!(pages[0].fixes.is_empty());
    }

    #[test]
    fn test_fixes_render() {
        let text = generate_fixes(&sample());

        assert!(text.starts_with("RECOMMENDED HREFLANG FIXES\n==================================================\n\n"));
        assert!(text.contains("URL: https://a.test/\n----------------------------------------\n"));
        assert!(text.contains(
            "❌ MISSING SELF-REFERENCE:\n   Add: <link rel=\"alternate\" hreflang=\"x-default\" href=\"https://a.test/\" />\n\n"
        ));
        assert!(text.contains(
            "❌ MISSING REGION-INDEPENDENT TAG FOR EN:\n   Add: <link rel=\"alternate\" hreflang=\"en\" href=\"https://example.com/global/en/\" />\n\n"
        ));
        assert!(text.contains(
            "Tag: en-gb -> https://b.test/gb\n   Warnings: Missing region-independent link for en; Alternate URL not in same domain\n\n"
        ));
        assert!(text.contains("Tag:  -> \n   Errors: Failed to analyze: HTTP 503\n"));
    }
}
