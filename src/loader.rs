// 📂 Catalog Loader
// Tabular source (CSV or JSON rows) → normalized Records
//
// One pass, no partial loads: the first malformed row fails the whole load.

use crate::error::{CatalogError, Result};
use crate::record::{split_semicolon, Record};
use pulldown_cmark::{Options, Parser};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// SOURCE FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Header row followed by one row per entry
    Csv,
    /// Array of row objects keyed by column name
    Json,
}

impl SourceFormat {
    /// `.json` is JSON, everything else is read as CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Csv,
        }
    }
}

// ============================================================================
// RAW ROW
// ============================================================================

/// A row exactly as the source holds it. Every cell is coerced to a string;
/// absent columns come back empty. JSON rows go through serde, CSV rows
/// through [`RawRow::from_csv`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub categories: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub record_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year_start: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year_end: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tags: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invisible_tags: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub additional_info: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_added: String,
}

impl RawRow {
    /// Map a CSV record by header name. Cells are taken verbatim so ids like
    /// `007` keep their leading zeros.
    pub fn from_csv(headers: &csv::StringRecord, record: &csv::StringRecord) -> Self {
        let mut row = RawRow::default();
        for (header, value) in headers.iter().zip(record.iter()) {
            let slot = match header.trim() {
                "id" => &mut row.id,
                "name" => &mut row.name,
                "description" => &mut row.description,
                "url" => &mut row.url,
                "categories" => &mut row.categories,
                "source" => &mut row.source,
                "region" => &mut row.region,
                "type" => &mut row.record_type,
                "yearStart" => &mut row.year_start,
                "yearEnd" => &mut row.year_end,
                "tags" => &mut row.tags,
                "invisibleTags" => &mut row.invisible_tags,
                "additionalInfo" => &mut row.additional_info,
                "dateAdded" => &mut row.date_added,
                _ => continue,
            };
            *slot = value.to_string();
        }
        row
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientString)
}

struct LenientString;

/// Sequence element wrapper so list cells get the same coercion
struct Cell(String);

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        lenient_string(deserializer).map(Cell)
    }
}

impl<'de> Visitor<'de> for LenientString {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, number, boolean, list or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<String, E> {
        Ok(v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<String, E> {
        // 1990.0 prints as "1990"
        Ok(format!("{v}"))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<String, E> {
        Ok(String::new())
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientString)
    }

    // Already-split lists (normalized JSON) are re-joined and split again later
    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<String, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut parts = Vec::new();
        while let Some(Cell(part)) = seq.next_element()? {
            parts.push(part);
        }
        Ok(parts.join(";"))
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Turn one raw row into a Record
pub fn normalize_row(row: RawRow) -> Record {
    let date_added = if row.date_added.trim().is_empty() {
        None
    } else {
        Some(row.date_added)
    };

    Record {
        id: row.id,
        name: row.name,
        description: row.description,
        url: row.url,
        categories: split_semicolon(&row.categories),
        source: row.source,
        region: split_semicolon(&row.region),
        record_type: row.record_type,
        year_start: row.year_start,
        year_end: row.year_end,
        tags: split_semicolon(&row.tags),
        invisible_tags: split_semicolon(&row.invisible_tags),
        additional_info: markdown_to_html(&row.additional_info),
        date_added,
    }
}

/// Markdown → single-line HTML for the detail view
pub fn markdown_to_html(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, opts);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);

    html.replace('\n', "")
}

// ============================================================================
// LOADING
// ============================================================================

/// Load and normalize every row of the file at `path`
pub fn load_catalog(path: &Path) -> Result<Vec<Record>> {
    let format = SourceFormat::from_path(path);
    debug!(?path, ?format, "opening catalog source");

    let file = File::open(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let records = load_from_reader(BufReader::new(file), format)?;
    info!(count = records.len(), ?path, "loaded catalog");
    Ok(records)
}

/// Load from any byte source in the given format
pub fn load_from_reader<R: Read>(reader: R, format: SourceFormat) -> Result<Vec<Record>> {
    let rows: Vec<RawRow> = match format {
        SourceFormat::Csv => {
            let mut rdr = csv::ReaderBuilder::new()
                .flexible(true)
                .from_reader(reader);

            let headers = rdr.headers()?.clone();
            let mut rows = Vec::new();
            for result in rdr.records() {
                let record = result?;
                rows.push(RawRow::from_csv(&headers, &record));
            }
            rows
        }
        SourceFormat::Json => serde_json::from_reader(reader)?,
    };

    Ok(rows.into_iter().map(normalize_row).collect())
}

/// Load, treating an empty catalog as an error the surfaces can report inline
pub fn load_non_empty(path: &Path) -> Result<Vec<Record>> {
    let records = load_catalog(path)?;
    if records.is_empty() {
        return Err(CatalogError::EmptyCatalog);
    }
    Ok(records)
}

/// Write normalized records as a pretty JSON array (the `convert` command)
pub fn write_json(records: &[Record], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| CatalogError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, records)?;
    info!(count = records.len(), ?path, "wrote normalized catalog");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "id,name,description,url,categories,source,region,type,yearStart,yearEnd,tags,invisibleTags,additionalInfo,dateAdded";

    #[test]
    fn test_load_csv_normalizes_rows() {
        let csv = format!(
            "{HEADER}\n\
             1,Ocean Temps,Sea surface data,https://example.org/ocean,Climate; Oceans,NOAA Database,Atlantic;Pacific ; ,Dataset,1990,2000,Temperature;,sst;hidden,**Bold** info,2026-10-01\n\
             2,Crop Yields,Yearly yields,https://example.org/crops,Agriculture,FAO,,Dataset,,,,,,\n"
        );

        let records = load_from_reader(csv.as_bytes(), SourceFormat::Csv).unwrap();
        assert_eq!(records.len(), 2);

        let ocean = &records[0];
        assert_eq!(ocean.id, "1");
        assert_eq!(ocean.categories, vec!["Climate", "Oceans"]);
        assert_eq!(ocean.region, vec!["Atlantic", "Pacific"]);
        assert_eq!(ocean.tags, vec!["Temperature"]);
        assert_eq!(ocean.invisible_tags, vec!["sst", "hidden"]);
        assert_eq!(ocean.year_start, "1990");
        assert_eq!(ocean.additional_info, "<p><strong>Bold</strong> info</p>");
        assert_eq!(ocean.date_added.as_deref(), Some("2026-10-01"));

        let crops = &records[1];
        assert!(crops.region.is_empty());
        assert!(crops.tags.is_empty());
        assert_eq!(crops.year_start, "");
        assert_eq!(crops.additional_info, "");
        assert_eq!(crops.date_added, None);
    }

    #[test]
    fn test_load_csv_missing_columns_default_empty() {
        let csv = "id,name,extra\n007,Only Name,ignored\n";
        let records = load_from_reader(csv.as_bytes(), SourceFormat::Csv).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "007");
        assert_eq!(records[0].name, "Only Name");
        assert_eq!(records[0].url, "");
        assert!(records[0].categories.is_empty());
        assert_eq!(records[0].date_added, None);
    }

    #[test]
    fn test_load_json_coerces_scalars() {
        let json = r#"[
            {"id": 3, "name": "Air Quality", "yearStart": 1995, "yearEnd": 2010.0,
             "tags": "PM2.5; Ozone", "source": null, "dateAdded": null},
            {"id": "4", "name": "Rivers"}
        ]"#;

        let records = load_from_reader(json.as_bytes(), SourceFormat::Json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "3");
        assert_eq!(records[0].year_start, "1995");
        assert_eq!(records[0].year_end, "2010");
        assert_eq!(records[0].tags, vec!["PM2.5", "Ozone"]);
        assert_eq!(records[0].source, "");
        assert_eq!(records[0].date_added, None);
        assert_eq!(records[1].id, "4");
    }

    #[test]
    fn test_malformed_json_fails_whole_load() {
        let result = load_from_reader("[{\"id\": 1}".as_bytes(), SourceFormat::Json);
        assert!(matches!(result, Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_markdown_to_html_strips_newlines() {
        let html = markdown_to_html("# Title\n\n- one\n- two\n");
        assert!(!html.contains('\n'));
        assert!(html.starts_with("<h1>Title</h1>"));
        assert!(html.contains("<li>one</li>"));
        assert_eq!(markdown_to_html("   "), "");
    }

    #[test]
    fn test_markdown_tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_source_format_from_path() {
        assert_eq!(SourceFormat::from_path(Path::new("data.JSON")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("datasets.csv")), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_path(Path::new("datasets")), SourceFormat::Csv);
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let result = load_catalog(Path::new("/nonexistent/datasets.csv"));
        assert!(matches!(result, Err(CatalogError::Read { .. })));
    }

    #[test]
    fn test_load_non_empty_rejects_header_only_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{HEADER}").unwrap();

        let result = load_non_empty(file.path());
        assert!(matches!(result, Err(CatalogError::EmptyCatalog)));
    }

    #[test]
    fn test_write_json_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let records = vec![Record {
            id: "9".to_string(),
            name: "Glaciers".to_string(),
            tags: vec!["Ice".to_string()],
            additional_info: "<p>melting</p>".to_string(),
            ..Default::default()
        }];

        write_json(&records, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"invisibleTags\""));
        assert!(contents.contains("\"type\""));

        // list cells from normalized output load back as lists
        let reloaded = load_catalog(&path).unwrap();
        assert_eq!(reloaded[0].name, "Glaciers");
        assert_eq!(reloaded[0].tags, vec!["Ice"]);
        assert_eq!(reloaded[0].additional_info, "<p>melting</p>");
    }
}
