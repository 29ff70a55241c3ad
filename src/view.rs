// 🃏 Card View Model
// What a surface needs to paint one record, computed without touching a screen

use crate::record::Record;
use chrono::{DateTime, NaiveDate};

/// Days a record counts as recently added
pub const DEFAULT_RECENT_DAYS: i64 = 30;

pub const NO_MATCHES_MESSAGE: &str = "No datasets match your criteria.";
pub const LOAD_ERROR_MESSAGE: &str = "Error loading catalog";
pub const LOAD_ERROR_DETAIL: &str =
    "Unable to load the catalog source. Please check the path and file format.";

/// "1 dataset found" / "N datasets found"
pub fn result_count_label(count: usize) -> String {
    let noun = if count == 1 { "dataset" } else { "datasets" };
    format!("{count} {noun} found")
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `MM/DD/YYYY`
pub fn parse_date_added(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // Timestamps without an offset, e.g. spreadsheet exports
    if let Some((date, _time)) = raw.split_once(|c: char| c == 'T' || c == ' ') {
        if let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

/// Added within the last `window_days` whole days, today included.
/// Future dates never count.
pub fn is_recently_added(record: &Record, today: NaiveDate, window_days: i64) -> bool {
    let Some(added) = record.date_added.as_deref().and_then(parse_date_added) else {
        return false;
    };
    let days = (today - added).num_days();
    (0..=window_days).contains(&days)
}

// ============================================================================
// CARD
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub kind: String,
    pub is_database: bool,
    pub recently_added: bool,
}

impl CardView {
    pub fn from_record(record: &Record, today: NaiveDate, window_days: i64) -> Self {
        CardView {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            kind: record.kind().label().to_string(),
            is_database: record.is_database(),
            recently_added: is_recently_added(record, today, window_days),
        }
    }
}

/// Contents of the "more info" view
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub title: String,
    pub info_html: String,
    pub download_url: String,
}

impl DetailView {
    pub fn from_record(record: &Record) -> Self {
        DetailView {
            title: record.name.clone(),
            info_html: record.additional_info.clone(),
            download_url: record.url.clone(),
        }
    }

    /// The info blob flattened for a terminal
    pub fn info_text(&self) -> String {
        html_to_text(&self.info_html)
    }
}

/// Rough HTML → text: block ends become newlines, list items get bullets,
/// every other tag is dropped.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let tag = rest[open + 1..open + close].trim().to_lowercase();
        let name = tag.split_whitespace().next().unwrap_or("");
        match name {
            "li" => out.push_str("• "),
            "br" | "br/" => out.push('\n'),
            "/p" | "/li" | "/h1" | "/h2" | "/h3" | "/h4" | "/h5" | "/h6" | "/tr" | "/blockquote"
            | "/pre" => out.push('\n'),
            "td" | "th" => out.push(' '),
            _ => {}
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);

    unescape_html(out.trim_end())
}

fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn added_days_ago(days: i64) -> Record {
        let date = today() - chrono::Duration::days(days);
        Record {
            name: "Recent".to_string(),
            date_added: Some(date.format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_result_count_label() {
        assert_eq!(result_count_label(0), "0 datasets found");
        assert_eq!(result_count_label(1), "1 dataset found");
        assert_eq!(result_count_label(42), "42 datasets found");
    }

    #[test]
    fn test_recently_added_window_is_inclusive() {
        assert!(is_recently_added(&added_days_ago(0), today(), DEFAULT_RECENT_DAYS));
        assert!(is_recently_added(&added_days_ago(30), today(), DEFAULT_RECENT_DAYS));
        assert!(!is_recently_added(&added_days_ago(31), today(), DEFAULT_RECENT_DAYS));
        assert!(!is_recently_added(&added_days_ago(-1), today(), DEFAULT_RECENT_DAYS));
    }

    #[test]
    fn test_recently_added_needs_a_parseable_date() {
        let mut record = added_days_ago(1);
        record.date_added = None;
        assert!(!is_recently_added(&record, today(), DEFAULT_RECENT_DAYS));

        record.date_added = Some("last week".to_string());
        assert!(!is_recently_added(&record, today(), DEFAULT_RECENT_DAYS));
    }

    #[test]
    fn test_parse_date_added_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 9, 30);
        assert_eq!(parse_date_added("2026-09-30"), expected);
        assert_eq!(parse_date_added("2026-09-30T12:00:00Z"), expected);
        assert_eq!(parse_date_added("2026-09-30 08:15:00"), expected);
        assert_eq!(parse_date_added("09/30/2026"), expected);
        assert_eq!(parse_date_added("30 Sept"), None);
    }

    #[test]
    fn test_card_view() {
        let mut record = added_days_ago(3);
        record.source = "Public Database".to_string();
        record.tags = vec!["Air".to_string()];

        let card = CardView::from_record(&record, today(), DEFAULT_RECENT_DAYS);
        assert!(card.is_database);
        assert_eq!(card.kind, "Database");
        assert!(card.recently_added);
        assert_eq!(card.tags, vec!["Air"]);
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("<h2>About</h2><p>Fish &amp; chips</p><ul><li>one</li><li>two</li></ul>");
        assert_eq!(text, "About\nFish & chips\n• one\n• two");
    }

    #[test]
    fn test_detail_view() {
        let record = Record {
            name: "Glaciers".to_string(),
            url: "https://example.org/ice.zip".to_string(),
            additional_info: "<p>Melt rates</p>".to_string(),
            ..Default::default()
        };
        let detail = DetailView::from_record(&record);
        assert_eq!(detail.title, "Glaciers");
        assert_eq!(detail.download_url, "https://example.org/ice.zip");
        assert_eq!(detail.info_text(), "Melt rates");
    }
}
