// 🏷️ Facets
// Distinct values that populate the checkbox groups and category pills

use crate::filter::FilterGroup;
use crate::record::{DatasetKind, Record};
use std::collections::BTreeSet;

/// Sorted distinct values per filter group, built once after load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facets {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub types: Vec<String>,
    pub regions: Vec<String>,
}

impl Facets {
    pub fn from_records(records: &[Record]) -> Self {
        Facets {
            categories: distinct_sorted(records.iter().flat_map(|r| r.categories.iter())),
            tags: distinct_sorted(records.iter().flat_map(|r| r.tags.iter())),
            // Both kinds are always offered, whatever the catalog holds
            types: DatasetKind::ALL.iter().map(|k| k.label().to_string()).collect(),
            regions: distinct_sorted(records.iter().flat_map(|r| r.region.iter())),
        }
    }

    pub fn values(&self, group: FilterGroup) -> &[String] {
        match group {
            FilterGroup::Tags => &self.tags,
            FilterGroup::Type => &self.types,
            FilterGroup::Region => &self.regions,
        }
    }
}

/// Case-insensitive order, ties broken by the raw value
fn distinct_sorted<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let unique: BTreeSet<&String> = values.collect();
    let mut sorted: Vec<String> = unique.into_iter().cloned().collect();
    sorted.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    sorted
}
