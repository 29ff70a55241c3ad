// Dataset Catalog - Core Library
// Used by both binaries

pub mod error;
pub mod record;
pub mod loader;
pub mod filter;
pub mod facets;
pub mod view;
pub mod export;
pub mod feedback;
pub mod browser;
pub mod config;
pub mod logging;

// Only the web server paints HTML
#[cfg(feature = "server")]
pub mod html;

// Re-export commonly used types
pub use error::{CatalogError, Result};
pub use record::{Record, DatasetKind, split_semicolon};
pub use loader::{
    RawRow, SourceFormat,
    load_catalog, load_from_reader, load_non_empty, normalize_row, markdown_to_html, write_json,
};
pub use filter::{
    FilterGroup, FilterState,
    compute_visible, matches, passes_filters, passes_search, parse_year_bound, normalize_search,
};
pub use facets::Facets;
pub use view::{CardView, DetailView, result_count_label, is_recently_added, parse_date_added};
pub use export::{EXPORT_HEADERS, export_csv, export_file_name, write_export};
pub use feedback::{FeedbackForm, submit_feedback, FEEDBACK_THANKS};
pub use browser::{Browser, UiEvent};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
