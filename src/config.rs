// ⚙️ Configuration
// catalog.toml (optional) → Config, with CLI overrides applied by the binaries

use crate::error::{CatalogError, Result};
use crate::filter::FilterState;
use crate::record::DatasetKind;
use crate::view::DEFAULT_RECENT_DAYS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog source file (CSV or JSON)
    pub source: PathBuf,

    /// Window for the "recently added" badge, in whole days
    pub recent_days: i64,

    /// Kinds preselected in the type group at startup and after clear.
    /// Empty means every kind passes.
    pub default_types: Vec<DatasetKind>,

    /// Export file name prefix, followed by the date
    pub export_prefix: String,

    /// Where the terminal UI and `export` command write files
    pub export_dir: PathBuf,

    /// Web server listen address
    pub bind: String,

    /// Stylesheet directory served under /static
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: PathBuf::from("datasets.csv"),
            recent_days: DEFAULT_RECENT_DAYS,
            default_types: Vec::new(),
            export_prefix: "datasets".to_string(),
            export_dir: PathBuf::from("."),
            bind: "0.0.0.0:3000".to_string(),
            static_dir: PathBuf::from("web"),
        }
    }
}

impl Config {
    /// Explicit path must exist; otherwise `catalog.toml` is used when
    /// present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    debug!("no config file, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|message| CatalogError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(?path, "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.recent_days < 0 {
            return Err(format!("recent_days must be >= 0, got {}", config.recent_days));
        }
        Ok(config)
    }

    /// The state the browser starts in and returns to on clear
    pub fn default_filter_state(&self) -> FilterState {
        FilterState::with_default_types(&self.default_types)
    }
}
