// ⚠️ Catalog Errors
// One enum for every failure a catalog operation can surface to the user

use std::path::PathBuf;
use thiserror::Error;

/// Every error is terminal for the operation that raised it; nothing retries.
/// The `Display` text doubles as the user-visible notice.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unable to read catalog source {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog row: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No data loaded")]
    EmptyCatalog,

    #[error("No datasets to export.")]
    NothingToExport,

    #[error("Please enter your feedback before submitting.")]
    EmptyFeedback,

    #[error("Invalid config file {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Unable to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
