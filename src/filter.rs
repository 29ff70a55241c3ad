// 🔎 Filter Engine
// FilterState + the two pure predicates that decide which records are visible
//
// Nothing here touches a screen. Surfaces mutate a FilterState and call
// compute_visible() again.

use crate::record::{DatasetKind, Record};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// FILTER GROUPS
// ============================================================================

/// The three checkbox groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterGroup {
    Tags,
    Type,
    Region,
}

impl FilterGroup {
    pub const ALL: [FilterGroup; 3] = [FilterGroup::Tags, FilterGroup::Type, FilterGroup::Region];

    /// Key used in query strings
    pub fn key(&self) -> &'static str {
        match self {
            FilterGroup::Tags => "tags",
            FilterGroup::Type => "type",
            FilterGroup::Region => "region",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FilterGroup::Tags => "Tags",
            FilterGroup::Type => "Type",
            FilterGroup::Region => "Region",
        }
    }
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FilterGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tags" | "tag" => Ok(FilterGroup::Tags),
            "type" => Ok(FilterGroup::Type),
            "region" => Ok(FilterGroup::Region),
            other => Err(format!("unknown filter group: {other}")),
        }
    }
}

// ============================================================================
// FILTER STATE
// ============================================================================

/// Everything the user has selected. Empty sets and `None` bounds mean
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Trimmed, lowercased search text
    pub search: String,
    pub tags: BTreeSet<String>,
    pub types: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    /// Selected category pills
    pub categories: BTreeSet<String>,
}

impl FilterState {
    /// Fresh state with some kinds preselected in the type group
    pub fn with_default_types(kinds: &[DatasetKind]) -> Self {
        FilterState {
            types: kinds.iter().map(|k| k.label().to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn set_search(&mut self, raw: &str) {
        self.search = normalize_search(raw);
    }

    pub fn group(&self, group: FilterGroup) -> &BTreeSet<String> {
        match group {
            FilterGroup::Tags => &self.tags,
            FilterGroup::Type => &self.types,
            FilterGroup::Region => &self.regions,
        }
    }

    pub fn group_mut(&mut self, group: FilterGroup) -> &mut BTreeSet<String> {
        match group {
            FilterGroup::Tags => &mut self.tags,
            FilterGroup::Type => &mut self.types,
            FilterGroup::Region => &mut self.regions,
        }
    }

    /// Checkbox change: `checked` is the new state of the box
    pub fn set_checked(&mut self, group: FilterGroup, value: &str, checked: bool) {
        let set = self.group_mut(group);
        if checked {
            set.insert(value.to_string());
        } else {
            set.remove(value);
        }
    }

    pub fn is_checked(&self, group: FilterGroup, value: &str) -> bool {
        self.group(group).contains(value)
    }

    /// Pill click. Returns whether the pill is active afterwards.
    pub fn toggle_category(&mut self, category: &str) -> bool {
        if self.categories.remove(category) {
            false
        } else {
            self.categories.insert(category.to_string());
            true
        }
    }

    pub fn set_year_from(&mut self, raw: &str) {
        self.year_from = parse_year_bound(raw);
    }

    pub fn set_year_to(&mut self, raw: &str) {
        self.year_to = parse_year_bound(raw);
    }

    /// True when at least one constraint is set
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || !self.tags.is_empty()
            || !self.types.is_empty()
            || !self.regions.is_empty()
            || !self.categories.is_empty()
            || self.year_from.is_some()
            || self.year_to.is_some()
    }

    /// Build from `key=value` pairs. Set keys may repeat; unknown keys are
    /// ignored.
    pub fn from_query_pairs<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = FilterState::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "q" | "search" => state.set_search(value),
                "from" => state.set_year_from(value),
                "to" => state.set_year_to(value),
                "category" => {
                    if !value.is_empty() {
                        state.categories.insert(value.to_string());
                    }
                }
                other => match other.parse::<FilterGroup>() {
                    // Known kinds are stored under their canonical label
                    Ok(FilterGroup::Type) if !value.is_empty() => {
                        let label = value
                            .parse::<DatasetKind>()
                            .map(|kind| kind.label().to_string())
                            .unwrap_or_else(|_| value.to_string());
                        state.types.insert(label);
                    }
                    Ok(group) if !value.is_empty() => state.set_checked(group, value, true),
                    _ => {}
                },
            }
        }
        state
    }

    /// Inverse of [`FilterState::from_query_pairs`]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("q", self.search.clone()));
        }
        for group in FilterGroup::ALL {
            for value in self.group(group) {
                pairs.push((group.key(), value.clone()));
            }
        }
        for category in &self.categories {
            pairs.push(("category", category.clone()));
        }
        if let Some(from) = self.year_from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.year_to {
            pairs.push(("to", to.to_string()));
        }
        pairs
    }
}

/// Search box text → comparable form
pub fn normalize_search(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Year input → bound. Takes the leading integer like `parseInt`;
/// no digits or a zero value leaves the bound unset. Values too large for
/// an i64 saturate.
pub fn parse_year_bound(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<i64>().unwrap_or(i64::MAX) * sign;

    if value == 0 {
        None
    } else {
        Some(value)
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Empty search passes everything
pub fn passes_search(record: &Record, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    record.search_haystack().contains(search)
}

fn intersects(values: &[String], selected: &BTreeSet<String>) -> bool {
    values.iter().any(|v| selected.contains(v))
}

/// All selection checks; each is skipped while its selection is empty
pub fn passes_filters(record: &Record, state: &FilterState) -> bool {
    if !state.categories.is_empty() && !intersects(&record.categories, &state.categories) {
        return false;
    }

    if !state.tags.is_empty() && !intersects(&record.tags, &state.tags) {
        return false;
    }

    if !state.types.is_empty() && !state.types.contains(record.kind().label()) {
        return false;
    }

    if !state.regions.is_empty() && !intersects(&record.region, &state.regions) {
        return false;
    }

    // NaN years never satisfy `<`/`>`, so they are never rejected
    let start = record.year_start_value();
    let end = record.year_end_value();
    if let Some(from) = state.year_from {
        if end < from as f64 {
            return false;
        }
    }
    if let Some(to) = state.year_to {
        if start > to as f64 {
            return false;
        }
    }

    true
}

pub fn matches(record: &Record, state: &FilterState) -> bool {
    passes_search(record, &state.search) && passes_filters(record, state)
}

/// The visible subset, in catalog order
pub fn compute_visible<'a>(records: &'a [Record], state: &FilterState) -> Vec<&'a Record> {
    records.iter().filter(|r| matches(r, state)).collect()
}

// ============================================================================
// TESTS
// ============================================================================
