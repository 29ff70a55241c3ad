// 🌐 HTML Page
// Paints the catalog page for the web server. Each request carries the full
// filter state in its query string, so every submit is a full re-render.

use crate::facets::Facets;
use crate::filter::{FilterGroup, FilterState};
use crate::record::Record;
use crate::view::{
    result_count_label, CardView, LOAD_ERROR_DETAIL, LOAD_ERROR_MESSAGE, NO_MATCHES_MESSAGE,
};
use chrono::NaiveDate;
use std::fmt::Write;

/// Everything one page render needs
pub struct PageContext<'a> {
    pub title: &'a str,
    pub total: usize,
    pub visible: &'a [&'a Record],
    pub state: &'a FilterState,
    pub facets: &'a Facets,
    pub today: NaiveDate,
    pub recent_days: i64,
    /// Set when the catalog failed to load at startup
    pub load_error: Option<&'a str>,
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `key=value&...` with values percent-encoded
pub fn query_string(state: &FilterState) -> String {
    state
        .to_query_pairs()
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// A bare path means "configured defaults" to the server, so an empty state
/// still carries `?q=`
fn href_for(path: &str, state: &FilterState) -> String {
    let qs = query_string(state);
    if qs.is_empty() {
        format!("{path}?q=")
    } else {
        format!("{path}?{qs}")
    }
}

/// Link that flips one category pill and keeps everything else
fn pill_href(state: &FilterState, category: &str) -> String {
    let mut next = state.clone();
    next.toggle_category(category);
    href_for("/", &next)
}

pub fn render_page(ctx: &PageContext) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title}</title><link rel=\"stylesheet\" href=\"/static/style.css\"></head><body>\
         <header><h1>{title}</h1></header><main>",
        title = html_escape(ctx.title),
    );

    if let Some(error) = ctx.load_error {
        let _ = write!(
            html,
            "<p id=\"resultCounter\" class=\"error\">{}</p>\
             <section id=\"datasetGrid\"><p class=\"notice\">{}</p><pre>{}</pre></section>",
            LOAD_ERROR_MESSAGE,
            LOAD_ERROR_DETAIL,
            html_escape(error),
        );
        html.push_str("</main></body></html>");
        return html;
    }

    if ctx.total == 0 {
        html.push_str(
            "<p id=\"resultCounter\" class=\"error\">No data loaded</p>\
             <section id=\"datasetGrid\"><p class=\"notice\">The catalog source contains no rows.</p></section>\
             </main></body></html>",
        );
        return html;
    }

    render_pills(&mut html, ctx);
    render_filter_form(&mut html, ctx);

    let _ = write!(
        html,
        "<section class=\"results\"><div class=\"results-bar\">\
         <p id=\"resultCounter\">{count}</p>\
         <a class=\"btn\" id=\"exportCsvBtn\" href=\"{export}\">Export CSV</a></div>",
        count = result_count_label(ctx.visible.len()),
        export = html_escape(&href_for("/export.csv", ctx.state)),
    );

    html.push_str("<div id=\"datasetGrid\">");
    if ctx.visible.is_empty() {
        let _ = write!(html, "<p>{NO_MATCHES_MESSAGE}</p>");
    } else {
        for record in ctx.visible {
            render_card(&mut html, record, ctx.today, ctx.recent_days);
        }
    }
    html.push_str("</div></section>");

    render_feedback_form(&mut html);
    html.push_str("</main></body></html>");
    html
}

fn render_pills(html: &mut String, ctx: &PageContext) {
    html.push_str("<nav id=\"categoryPills\">");
    for category in &ctx.facets.categories {
        let class = if ctx.state.categories.contains(category) {
            "pill active"
        } else {
            "pill"
        };
        let _ = write!(
            html,
            "<a class=\"{class}\" href=\"{href}\">{label}</a>",
            href = html_escape(&pill_href(ctx.state, category)),
            label = html_escape(category),
        );
    }
    html.push_str("</nav>");
}

fn render_filter_form(html: &mut String, ctx: &PageContext) {
    let state = ctx.state;
    let _ = write!(
        html,
        "<form id=\"filterPanel\" method=\"get\" action=\"/\">\
         <input type=\"search\" id=\"searchInput\" name=\"q\" placeholder=\"Search datasets\" value=\"{}\">",
        html_escape(&state.search),
    );

    // Selected pills survive a form submit
    for category in &state.categories {
        let _ = write!(
            html,
            "<input type=\"hidden\" name=\"category\" value=\"{}\">",
            html_escape(category)
        );
    }

    for group in [FilterGroup::Type, FilterGroup::Tags, FilterGroup::Region] {
        let values = ctx.facets.values(group);
        if values.is_empty() {
            continue;
        }
        let _ = write!(html, "<fieldset><legend>{}</legend>", group.title());
        for value in values {
            let checked = if state.is_checked(group, value) { " checked" } else { "" };
            let _ = write!(
                html,
                "<div><label><input type=\"checkbox\" class=\"filter-checkbox\" name=\"{key}\" value=\"{value}\"{checked}> {label}</label></div>",
                key = group.key(),
                value = html_escape(value),
                label = html_escape(value),
            );
        }
        html.push_str("</fieldset>");
    }

    let year = |bound: Option<i64>| bound.map(|y| y.to_string()).unwrap_or_default();
    let _ = write!(
        html,
        "<fieldset><legend>Years</legend>\
         <input type=\"number\" id=\"dateStart\" name=\"from\" placeholder=\"From\" value=\"{}\">\
         <input type=\"number\" id=\"dateEnd\" name=\"to\" placeholder=\"To\" value=\"{}\"></fieldset>\
         <button type=\"submit\" class=\"btn\">Apply</button>\
         <a id=\"clearFilters\" class=\"btn btn-secondary\" href=\"/\">Clear all</a></form>",
        year(state.year_from),
        year(state.year_to),
    );
}

fn render_card(html: &mut String, record: &Record, today: NaiveDate, recent_days: i64) {
    let card = CardView::from_record(record, today, recent_days);
    let class = if card.is_database { "card card-database" } else { "card" };

    let _ = write!(html, "<article class=\"{class}\">");
    if card.recently_added {
        html.push_str("<span class=\"recently-added-badge\">Recently Added</span>");
    }
    let _ = write!(
        html,
        "<h3>{}</h3><p>{}</p><div class=\"taglist\">",
        html_escape(&card.name),
        html_escape(&card.description),
    );
    for tag in &card.tags {
        let _ = write!(html, "<span class=\"tag\">{}</span>", html_escape(tag));
    }
    // additional_info is HTML rendered from the catalog's own Markdown
    let _ = write!(
        html,
        "</div><details class=\"more-info\"><summary class=\"btn\">More Info</summary>\
         <div class=\"modal-body\"><h4>{title}</h4>{info}</div>\
         <a class=\"btn\" href=\"{url}\" target=\"_blank\" rel=\"noopener\">Download</a></details></article>",
        title = html_escape(&record.name),
        info = record.additional_info,
        url = html_escape(&record.url),
    );
}

fn render_feedback_form(html: &mut String) {
    html.push_str(
        "<details id=\"suggestionModal\"><summary class=\"btn\">Suggest a dataset</summary>\
         <form id=\"suggestionForm\" method=\"post\" action=\"/feedback\">\
         <textarea id=\"suggestionText\" name=\"text\" rows=\"4\"></textarea>\
         <button type=\"submit\" class=\"btn\">Submit</button></form></details>",
    );
}

/// Result page for a feedback submit
pub fn render_feedback_page(message: &str, accepted: bool) -> String {
    let class = if accepted { "notice" } else { "notice error" };
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>Feedback</title>\
         <link rel=\"stylesheet\" href=\"/static/style.css\"></head><body><main>\
         <p class=\"{class}\">{}</p><a class=\"btn\" href=\"/\">Back to catalog</a></main></body></html>",
        html_escape(message),
    )
}
