// 📤 CSV Export
// Visible records → delimited text the user can download

use crate::error::{CatalogError, Result};
use crate::record::Record;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const EXPORT_HEADERS: [&str; 11] = [
    "ID",
    "Name",
    "Description",
    "URL",
    "Categories",
    "Source",
    "Region",
    "Type",
    "Year Start",
    "Year End",
    "Tags",
];

/// Separator for list cells in the export
const LIST_SEPARATOR: &str = "; ";

/// `<prefix>-YYYY-MM-DD.csv`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", prefix, date.format("%Y-%m-%d"))
}

fn export_row(record: &Record) -> [String; 11] {
    [
        record.id.clone(),
        record.name.clone(),
        record.description.clone(),
        record.url.clone(),
        record.categories.join(LIST_SEPARATOR),
        record.source.clone(),
        record.region.join(LIST_SEPARATOR),
        record.record_type.clone(),
        record.year_start.clone(),
        record.year_end.clone(),
        record.tags.join(LIST_SEPARATOR),
    ]
}

/// Header plus one row per record. Quotes are doubled and cells with
/// separators or quotes are wrapped, per RFC 4180.
pub fn export_csv(records: &[&Record]) -> Result<String> {
    if records.is_empty() {
        debug!("export requested with nothing visible");
        return Err(CatalogError::NothingToExport);
    }

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(EXPORT_HEADERS)?;
    for record in records {
        wtr.write_record(export_row(record))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| CatalogError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Export into `dir`, named after `today`. Nothing is written when the set
/// is empty.
pub fn write_export(records: &[&Record], dir: &Path, prefix: &str, today: NaiveDate) -> Result<PathBuf> {
    let contents = export_csv(records)?;
    let path = dir.join(export_file_name(prefix, today));

    fs::write(&path, contents).map_err(|source| CatalogError::Write {
        path: path.clone(),
        source,
    })?;

    info!(count = records.len(), ?path, "exported catalog");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        Record {
            id: "12".to_string(),
            name: "The \"Big\" Survey".to_string(),
            description: "Counts, by region".to_string(),
            url: "https://example.org/survey.csv".to_string(),
            categories: vec!["Health".to_string(), "Population".to_string()],
            source: "Census Database".to_string(),
            region: vec!["Asia".to_string()],
            record_type: "Dataset".to_string(),
            year_start: "2001".to_string(),
            year_end: "2011".to_string(),
            tags: vec!["Census".to_string(), "Households".to_string()],
            invisible_tags: vec!["secret".to_string()],
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_export_csv_header_and_escaping() {
        let record = sample_record();
        let csv = export_csv(&[&record]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "ID,Name,Description,URL,Categories,Source,Region,Type,Year Start,Year End,Tags"
        );
        assert_eq!(
            lines[1],
            "12,\"The \"\"Big\"\" Survey\",\"Counts, by region\",https://example.org/survey.csv,\
             Health; Population,Census Database,Asia,Dataset,2001,2011,Census; Households"
        );
        assert!(!csv.contains("secret"));
    }

    #[test]
    fn test_export_keeps_raw_type_column() {
        let mut record = sample_record();
        record.record_type = String::new();
        let csv = export_csv(&[&record]).unwrap();
        assert!(csv.contains("Census Database,Asia,,2001"));
    }

    #[test]
    fn test_export_empty_set_fails() {
        let result = export_csv(&[]);
        assert!(matches!(result, Err(CatalogError::NothingToExport)));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("datasets", today()), "datasets-2026-10-16.csv");
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let record = sample_record();

        let path = write_export(&[&record], dir.path(), "datasets", today()).unwrap();
        assert_eq!(path, dir.path().join("datasets-2026-10-16.csv"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[test]
    fn test_write_export_empty_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let result = write_export(&[], dir.path(), "datasets", today());
        assert!(matches!(result, Err(CatalogError::NothingToExport)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
