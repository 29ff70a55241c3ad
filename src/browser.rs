// 🧭 Catalog Browser
// Records + FilterState + the visible subset, re-rendered after every event
//
// Surfaces (terminal UI, CLI export) translate input into UiEvents and paint
// whatever this struct exposes. Nothing in here draws.

use crate::error::Result;
use crate::export;
use crate::facets::Facets;
use crate::filter::{self, FilterGroup, FilterState};
use crate::record::Record;
use crate::view::{result_count_label, CardView, DetailView};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SearchChanged(String),
    FilterToggled {
        group: FilterGroup,
        value: String,
        checked: bool,
    },
    PillClicked(String),
    YearFromChanged(String),
    YearToChanged(String),
    ClearAll,
}

pub struct Browser {
    records: Vec<Record>,
    facets: Facets,
    defaults: FilterState,
    state: FilterState,
    /// Indices into `records`, in catalog order
    visible: Vec<usize>,
    recent_days: i64,
}

impl Browser {
    pub fn new(records: Vec<Record>, defaults: FilterState, recent_days: i64) -> Self {
        let facets = Facets::from_records(&records);
        let mut browser = Browser {
            records,
            facets,
            state: defaults.clone(),
            defaults,
            visible: Vec::new(),
            recent_days,
        };
        browser.render();
        browser
    }

    /// Mutate state, then recompute the visible subset
    pub fn apply(&mut self, event: UiEvent) {
        debug!(?event, "ui event");
        match event {
            UiEvent::SearchChanged(text) => self.state.set_search(&text),
            UiEvent::FilterToggled { group, value, checked } => {
                self.state.set_checked(group, &value, checked)
            }
            UiEvent::PillClicked(category) => {
                self.state.toggle_category(&category);
            }
            UiEvent::YearFromChanged(raw) => self.state.set_year_from(&raw),
            UiEvent::YearToChanged(raw) => self.state.set_year_to(&raw),
            UiEvent::ClearAll => self.state = self.defaults.clone(),
        }
        self.render();
    }

    /// Replace the visible list wholesale; no diffing
    fn render(&mut self) {
        let state = &self.state;
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| filter::matches(r, state))
            .map(|(i, _)| i)
            .collect();
        debug!(visible = self.visible.len(), total = self.records.len(), "rendered");
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn visible(&self) -> Vec<&Record> {
        self.visible.iter().map(|&i| &self.records[i]).collect()
    }

    /// Record at a position in the visible list
    pub fn visible_at(&self, position: usize) -> Option<&Record> {
        self.visible.get(position).map(|&i| &self.records[i])
    }

    pub fn result_label(&self) -> String {
        result_count_label(self.visible_count())
    }

    pub fn is_pill_active(&self, category: &str) -> bool {
        self.state.categories.contains(category)
    }

    pub fn cards(&self, today: NaiveDate) -> Vec<CardView> {
        self.visible()
            .into_iter()
            .map(|r| CardView::from_record(r, today, self.recent_days))
            .collect()
    }

    pub fn detail(&self, position: usize) -> Option<DetailView> {
        self.visible_at(position).map(DetailView::from_record)
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// The visible subset; equals the whole catalog while no filter is set
    pub fn export_csv(&self) -> Result<String> {
        export::export_csv(&self.visible())
    }

    pub fn export_to(&self, dir: &Path, prefix: &str, today: NaiveDate) -> Result<PathBuf> {
        export::write_export(&self.visible(), dir, prefix, today)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::record::DatasetKind;

    fn create_test_record(id: &str, name: &str, source: &str, category: &str, tag: &str) -> Record {
        Record {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("About {name}"),
            url: format!("https://example.org/{id}"),
            categories: vec![category.to_string()],
            source: source.to_string(),
            region: vec!["Europe".to_string()],
            record_type: "Dataset".to_string(),
            year_start: "2000".to_string(),
            year_end: "2010".to_string(),
            tags: vec![tag.to_string()],
            additional_info: format!("<p>{name} details</p>"),
            ..Default::default()
        }
    }

    fn sample_browser(defaults: FilterState) -> Browser {
        let records = vec![
            create_test_record("1", "Ocean Temps", "NOAA", "Climate", "Temperature"),
            create_test_record("2", "Hospital Beds", "Health Database", "Health", "Capacity"),
            create_test_record("3", "Rainfall", "Met Office", "Climate", "Precipitation"),
        ];
        Browser::new(records, defaults, 30)
    }

    #[test]
    fn test_initial_render_shows_everything() {
        let browser = sample_browser(FilterState::default());
        assert_eq!(browser.visible_count(), 3);
        assert_eq!(browser.result_label(), "3 datasets found");
    }

    #[test]
    fn test_search_event_rerenders() {
        let mut browser = sample_browser(FilterState::default());
        browser.apply(UiEvent::SearchChanged("OCEAN".to_string()));

        assert_eq!(browser.state().search, "ocean");
        assert_eq!(browser.visible_count(), 1);
        assert_eq!(browser.result_label(), "1 dataset found");
        assert_eq!(browser.visible_at(0).unwrap().id, "1");
    }

    #[test]
    fn test_filter_and_pill_events() {
        let mut browser = sample_browser(FilterState::default());

        browser.apply(UiEvent::PillClicked("Climate".to_string()));
        assert!(browser.is_pill_active("Climate"));
        assert_eq!(browser.visible_count(), 2);

        browser.apply(UiEvent::FilterToggled {
            group: FilterGroup::Tags,
            value: "Precipitation".to_string(),
            checked: true,
        });
        assert_eq!(browser.visible_count(), 1);

        browser.apply(UiEvent::PillClicked("Climate".to_string()));
        assert!(!browser.is_pill_active("Climate"));
        assert_eq!(browser.visible_count(), 1);
    }

    #[test]
    fn test_year_events() {
        let mut browser = sample_browser(FilterState::default());

        browser.apply(UiEvent::YearFromChanged("2011".to_string()));
        assert_eq!(browser.visible_count(), 0);
        assert_eq!(browser.result_label(), "0 datasets found");

        browser.apply(UiEvent::YearFromChanged("".to_string()));
        assert_eq!(browser.state().year_from, None);
        assert_eq!(browser.visible_count(), 3);

        browser.apply(UiEvent::YearToChanged("1999".to_string()));
        assert_eq!(browser.visible_count(), 0);
    }

    #[test]
    fn test_clear_restores_full_count() {
        let mut browser = sample_browser(FilterState::default());
        browser.apply(UiEvent::SearchChanged("rain".to_string()));
        browser.apply(UiEvent::PillClicked("Climate".to_string()));
        browser.apply(UiEvent::YearToChanged("2005".to_string()));
        assert_eq!(browser.visible_count(), 1);

        browser.apply(UiEvent::ClearAll);
        assert_eq!(browser.visible_count(), browser.total_count());
        assert!(!browser.state().is_active());
        assert!(!browser.is_pill_active("Climate"));
    }

    #[test]
    fn test_clear_returns_to_configured_type_defaults() {
        let defaults = FilterState::with_default_types(&[DatasetKind::Database]);
        let mut browser = sample_browser(defaults.clone());
        assert_eq!(browser.visible_count(), 1);

        browser.apply(UiEvent::FilterToggled {
            group: FilterGroup::Type,
            value: "Database".to_string(),
            checked: false,
        });
        assert_eq!(browser.visible_count(), 3);

        browser.apply(UiEvent::ClearAll);
        assert_eq!(browser.state(), &defaults);
        assert_eq!(browser.visible_count(), 1);
    }

    #[test]
    fn test_export_follows_visible_set() {
        let mut browser = sample_browser(FilterState::default());
        let full = browser.export_csv().unwrap();
        assert_eq!(full.lines().count(), 4);

        browser.apply(UiEvent::SearchChanged("hospital".to_string()));
        let filtered = browser.export_csv().unwrap();
        assert_eq!(filtered.lines().count(), 2);

        browser.apply(UiEvent::SearchChanged("no such thing".to_string()));
        assert!(matches!(browser.export_csv(), Err(CatalogError::NothingToExport)));
    }

    #[test]
    fn test_cards_and_detail() {
        let browser = sample_browser(FilterState::default());
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let cards = browser.cards(today);
        assert_eq!(cards.len(), 3);
        assert!(cards[1].is_database);
        assert!(!cards[0].recently_added);

        let detail = browser.detail(2).unwrap();
        assert_eq!(detail.title, "Rainfall");
        assert_eq!(detail.download_url, "https://example.org/3");
        assert!(browser.detail(3).is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let browser = Browser::new(Vec::new(), FilterState::default(), 30);
        assert_eq!(browser.result_label(), "0 datasets found");
        assert!(browser.facets().tags.is_empty());
        assert!(browser.export_csv().is_err());
    }
}
