//! Human-readable names for hreflang subtags.
//!
//! Lookups are case-sensitive on the lowercase codes found in normalized
//! hreflang values. Unknown codes are returned unchanged.

/// ISO 639-1 language codes and their English names
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("ar", "Arabic"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ru", "Russian"),
    ("pt", "Portuguese"),
    ("it", "Italian"),
    ("nl", "Dutch"),
    ("tr", "Turkish"),
    ("sv", "Swedish"),
    ("pl", "Polish"),
    ("vi", "Vietnamese"),
    ("th", "Thai"),
    ("id", "Indonesian"),
    ("ms", "Malaysian"),
    ("hi", "Hindi"),
];

/// ISO 3166-1 alpha-2 region codes (lowercased) and their English names
const REGIONS: &[(&str, &str)] = &[
    ("us", "United States"),
    ("gb", "United Kingdom"),
    ("ae", "United Arab Emirates"),
    ("sa", "Saudi Arabia"),
    ("kw", "Kuwait"),
    ("qa", "Qatar"),
    ("om", "Oman"),
    ("bh", "Bahrain"),
    ("eg", "Egypt"),
    ("iq", "Iraq"),
    ("jo", "Jordan"),
    ("lb", "Lebanon"),
    ("ly", "Libya"),
    ("ps", "Palestinian Territory"),
    ("sd", "Sudan"),
    ("so", "Somalia"),
    ("sy", "Syria"),
    ("ye", "Yemen"),
    ("au", "Australia"),
    ("ca", "Canada"),
    ("in", "India"),
    ("pk", "Pakistan"),
    ("bd", "Bangladesh"),
    ("cn", "China"),
    ("jp", "Japan"),
    ("kr", "South Korea"),
    ("de", "Germany"),
    ("fr", "France"),
    ("it", "Italy"),
    ("es", "Spain"),
    ("ru", "Russia"),
    ("br", "Brazil"),
    ("mx", "Mexico"),
    ("ar", "Argentina"),
];

fn lookup<'a>(table: &'static [(&'static str, &'static str)], code: &'a str) -> &'a str {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// English name for a primary language subtag, or the code itself if unknown.
pub fn language_name(code: &str) -> &str {
    lookup(LANGUAGES, code)
}

/// English name for a region subtag, or the code itself if unknown.
pub fn region_name(code: &str) -> &str {
    lookup(REGIONS, code)
}

/// Split a normalized hreflang value into `(language, region)` subtags.
///
/// The region is empty when the tag has no `-`. Only the first two subtags
/// are considered.
pub fn split_tag(tag: &str) -> (&str, &str) {
    let mut parts = tag.split('-');
    let language = parts.next().unwrap_or("");
    let region = parts.next().unwrap_or("");
    (language, region)
}

/// Resolve a tag to its `(language name, region name)` pair.
pub fn describe_tag(tag: &str) -> (String, String) {
    let (language, region) = split_tag(tag);
    (
        language_name(language).to_string(),
        region_name(region).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("ms"), "Malaysian");
    }

    #[test]
    fn test_known_region() {
        assert_eq!(region_name("gb"), "United Kingdom");
        assert_eq!(region_name("ps"), "Palestinian Territory");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(language_name("xx"), "xx");
        assert_eq!(region_name("zz"), "zz");
        assert_eq!(region_name(""), "");
    }

    #[test]
    fn test_tables_have_no_duplicate_codes() {
        for table in [LANGUAGES, REGIONS] {
            let mut codes: Vec<_> = table.iter().map(|(c, _)| *c).collect();
            let before = codes.len();
            codes.sort_unstable();
            codes.dedup();
            assert_eq!(codes.len(), before);
        }
    }

    #[test]
    fn test_split_tag() {
        assert_eq!(split_tag("en"), ("en", ""));
        assert_eq!(split_tag("en-gb"), ("en", "gb"));
        assert_eq!(split_tag("x-default"), ("x", "default"));
        assert_eq!(split_tag("zh-hant-tw"), ("zh", "hant"));
        assert_eq!(split_tag(""), ("", ""));
    }

    #[test]
    fn test_describe_tag() {
        assert_eq!(
            describe_tag("ar-ae"),
            ("Arabic".to_string(), "United Arab Emirates".to_string())
        );
        assert_eq!(describe_tag("fr"), ("French".to_string(), String::new()));
        assert_eq!(
            describe_tag("x-default"),
            ("x".to_string(), "default".to_string())
        );
    }
}
