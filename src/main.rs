// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use dataset_catalog::logging::{self, LogTarget};
use dataset_catalog::{
    load_catalog, view, write_export, write_json, CatalogError, Config, DatasetKind, FilterGroup,
    FilterState, compute_visible,
};

#[derive(Parser, Debug)]
#[command(name = "dataset-catalog", version, about = "Browse, filter and export a dataset catalog")]
struct Cli {
    /// Config file (defaults to ./catalog.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal browser (default)
    Browse {
        /// Catalog source (CSV or JSON); overrides the config
        source: Option<PathBuf>,
    },
    /// Write the filtered catalog as CSV
    Export(ExportArgs),
    /// Normalize a source file into a JSON array of records
    Convert { source: PathBuf, output: PathBuf },
}

#[derive(Args, Debug, Default)]
struct ExportArgs {
    source: Option<PathBuf>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Dataset or Database, any case
    #[arg(long = "type")]
    types: Vec<DatasetKind>,
    #[arg(long = "region")]
    regions: Vec<String>,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
    /// Directory for the dated export file; overrides the config
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

impl ExportArgs {
    /// Start from the configured defaults, then apply every flag
    fn filter_state(&self, defaults: FilterState) -> FilterState {
        let mut state = defaults;
        if let Some(search) = &self.search {
            state.set_search(search);
        }
        if !self.types.is_empty() {
            state.types.clear();
        }
        for kind in &self.types {
            state.set_checked(FilterGroup::Type, kind.label(), true);
        }
        for (group, values) in [(FilterGroup::Tags, &self.tags), (FilterGroup::Region, &self.regions)] {
            for value in values {
                state.set_checked(group, value, true);
            }
        }
        for category in &self.categories {
            state.categories.insert(category.clone());
        }
        if let Some(from) = &self.from {
            state.set_year_from(from);
        }
        if let Some(to) = &self.to {
            state.set_year_to(to);
        }
        state
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    // The alternate screen owns the terminal while browsing
    let target = match cli.command {
        None | Some(Command::Browse { .. }) => logging::tui_target(
            cli.verbose,
            std::env::var("RUST_LOG").ok().as_deref(),
            &config.export_dir,
        ),
        _ => LogTarget::Stderr,
    };
    logging::init_tracing(cli.verbose, "warn", &target)?;

    match cli.command {
        Some(Command::Export(args)) => run_export(&config, args),
        Some(Command::Convert { source, output }) => run_convert(&source, &output),
        Some(Command::Browse { source }) => run_ui_mode(&config, source),
        None => run_ui_mode(&config, None),
    }
}

fn run_export(config: &Config, args: ExportArgs) -> Result<()> {
    let source = args.source.clone().unwrap_or_else(|| config.source.clone());
    let records = load_catalog(&source)
        .with_context(|| format!("Failed to load catalog {}", source.display()))?;

    let state = args.filter_state(config.default_filter_state());
    let visible = compute_visible(&records, &state);
    println!("{}", view::result_count_label(visible.len()));

    let out_dir = args.out_dir.unwrap_or_else(|| config.export_dir.clone());
    let today = Local::now().date_naive();

    match write_export(&visible, &out_dir, &config.export_prefix, today) {
        Ok(path) => {
            println!("✓ Exported to {}", path.display());
            Ok(())
        }
        Err(CatalogError::NothingToExport) => {
            eprintln!("⚠ {}", CatalogError::NothingToExport);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn run_convert(source: &Path, output: &Path) -> Result<()> {
    let records = load_catalog(source)
        .with_context(|| format!("Failed to load catalog {}", source.display()))?;
    write_json(&records, output)?;
    println!("Generated {} with {} records", output.display(), records.len());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config, source: Option<PathBuf>) -> Result<()> {
    use dataset_catalog::load_non_empty;
    use tracing::error;

    let source = source.unwrap_or_else(|| config.source.clone());

    let records = match load_non_empty(&source) {
        Ok(records) => records,
        Err(CatalogError::EmptyCatalog) => {
            eprintln!("⚠ {}", CatalogError::EmptyCatalog);
            eprintln!("   {} contains no catalog rows.", source.display());
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, ?source, "catalog load failed");
            eprintln!("❌ {}", view::LOAD_ERROR_MESSAGE);
            eprintln!("   {}", view::LOAD_ERROR_DETAIL);
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    let browser = dataset_catalog::Browser::new(records, config.default_filter_state(), config.recent_days);
    let mut app = ui::App::new(browser, config, Local::now().date_naive());
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config, _source: Option<PathBuf>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin catalog-server --features server");
    std::process::exit(1);
}
