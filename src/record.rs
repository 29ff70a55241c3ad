// 📇 Catalog Record
// One normalized catalog entry, immutable after load

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// RECORD
// ============================================================================

/// Fixed-shape catalog entry produced by the loader.
///
/// Multi-value fields are already split; `additional_info` is HTML.
/// Year fields stay strings because the source may leave them blank or put
/// free text in them. See [`Record::year_start_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub categories: Vec<String>,
    pub source: String,
    pub region: Vec<String>,
    #[serde(rename = "type")]
    pub record_type: String,
    pub year_start: String,
    pub year_end: String,
    pub tags: Vec<String>,
    pub invisible_tags: Vec<String>,
    pub additional_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<String>,
}

impl Record {
    /// Effective kind: the source attribution wins over the `type` column
    pub fn kind(&self) -> DatasetKind {
        if self.source.to_lowercase().contains("database") {
            DatasetKind::Database
        } else {
            DatasetKind::Dataset
        }
    }

    pub fn is_database(&self) -> bool {
        self.kind() == DatasetKind::Database
    }

    pub fn year_start_value(&self) -> f64 {
        numeric_year(&self.year_start)
    }

    pub fn year_end_value(&self) -> f64 {
        numeric_year(&self.year_end)
    }

    /// Lowercased text the search box matches against.
    /// Order: name, description, tags, region, invisible tags.
    pub fn search_haystack(&self) -> String {
        let mut parts = vec![self.name.as_str(), self.description.as_str()];
        parts.extend(self.tags.iter().map(String::as_str));
        parts.extend(self.region.iter().map(String::as_str));
        parts.extend(self.invisible_tags.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }
}

/// Number coercion for year cells: blank is 0, junk is NaN.
/// Accepts decimal literals with an optional exponent, `Infinity`, and
/// unsigned `0x`/`0o`/`0b` integers. Anything else is NaN.
fn numeric_year(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(value) = radix_integer(trimmed) {
        return value;
    }

    if is_decimal_literal(trimmed) {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn radix_integer(s: &str) -> Option<f64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let mut value = 0.0_f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => value = value * radix as f64 + d as f64,
            None => return Some(f64::NAN),
        }
    }
    Some(value)
}

/// `[+-]digits[.digits][e[+-]digits]`, with digits on at least one side of
/// the point
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }
    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Split a `;`-joined cell into trimmed, non-empty tokens (order kept)
pub fn split_semicolon(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// DATASET KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatasetKind {
    Dataset,
    Database,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Dataset, DatasetKind::Database];

    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Dataset => "Dataset",
            DatasetKind::Database => "Database",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dataset" => Ok(DatasetKind::Dataset),
            "database" => Ok(DatasetKind::Database),
            other => Err(format!("unknown dataset type: {other}")),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
