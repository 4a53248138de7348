//! Flat result rows and their delimited/JSON export.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::io::{Read, Write};

pub const FIELD_SEPARATOR: &str = "; ";

/// One output row: a single hreflang declaration found on `url`, or the
/// synthetic error row for a page that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub url: String,
    pub hreflang_count: usize,
    #[serde(serialize_with = "yes_no", deserialize_with = "from_yes_no")]
    pub self_ref: bool,
    pub hreflang_tag: String,
    pub language: String,
    pub region: String,
    pub alt_url: String,
    pub warnings: String,
    pub errors: String,
}

impl AnalysisRecord {
    /// Row emitted when `url` could not be fetched or parsed at all.
    pub fn failure(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            url: url.into(),
            hreflang_count: 0,
            self_ref: false,
            hreflang_tag: String::new(),
            language: String::new(),
            region: String::new(),
            alt_url: String::new(),
            warnings: String::new(),
            errors: format!("Failed to analyze: {}", reason),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Individual warning messages
    pub fn warning_messages(&self) -> impl Iterator<Item = &str> {
        split_messages(&self.warnings)
    }

    /// Individual error messages
    pub fn error_messages(&self) -> impl Iterator<Item = &str> {
        split_messages(&self.errors)
    }
}

pub fn join_messages(messages: &[String]) -> String {
    messages.join(FIELD_SEPARATOR)
}

fn split_messages(joined: &str) -> impl Iterator<Item = &str> {
    joined.split(FIELD_SEPARATOR).filter(|m| !m.is_empty())
}

fn yes_no<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "Yes" } else { "No" })
}

fn from_yes_no<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    match value.as_str() {
        "Yes" => Ok(true),
        "No" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected Yes or No, got {:?}",
            other
        ))),
    }
}

/// Write a header row followed by one row per record.
pub fn write_csv<W: Write>(records: &[AnalysisRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv_writer
            .write_record(HEADER)
            .context("Failed to write CSV header")?;
    }
    for record in records {
        csv_writer
            .serialize(record)
            .with_context(|| format!("Failed to write CSV row for {}", record.url))?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn to_csv_string(records: &[AnalysisRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    String::from_utf8(buffer).context("CSV output was not valid UTF-8")
}

/// Parse rows previously produced by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<AnalysisRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Failed to parse CSV row {}", i + 1)))
        .collect()
}

pub fn to_json_string(records: &[AnalysisRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")
}

pub const HEADER: [&str; 9] = [
    "url",
    "hreflang_count",
    "self_ref",
    "hreflang_tag",
    "language",
    "region",
    "alt_url",
    "warnings",
    "errors",
];
