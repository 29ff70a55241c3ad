// Dataset Catalog - Web Server
// Server-rendered catalog page, CSV export and a small JSON API

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Local;
use clap::{ArgAction, Parser};
use dataset_catalog::html::{render_feedback_page, render_page, PageContext};
use dataset_catalog::logging::LogTarget;
use dataset_catalog::{
    compute_visible, export_csv, export_file_name, load_catalog, logging, submit_feedback,
    CatalogError, Config, Facets, FilterState, Record,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "catalog-server", version, about = "Serve the dataset catalog over HTTP")]
struct ServerArgs {
    /// Catalog source (CSV or JSON); overrides the config
    source: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address; overrides the config
    #[arg(long)]
    bind: Option<String>,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

/// Loaded once at startup, read-only afterwards
struct Catalog {
    records: Vec<Record>,
    facets: Facets,
    /// Set when the source could not be read; the page shows the error state
    load_error: Option<String>,
    config: Config,
}

impl Catalog {
    fn load(config: Config) -> Self {
        match load_catalog(&config.source) {
            Ok(records) => {
                let facets = Facets::from_records(&records);
                Catalog { records, facets, load_error: None, config }
            }
            Err(e) => {
                error!(error = %e, source = ?config.source, "catalog load failed");
                Catalog {
                    records: Vec::new(),
                    facets: Facets::default(),
                    load_error: Some(e.to_string()),
                    config,
                }
            }
        }
    }

    /// Query pairs on top of the configured defaults. A request that names
    /// any filter starts from scratch.
    fn state_for(&self, pairs: &[(String, String)]) -> FilterState {
        if pairs.is_empty() {
            self.config.default_filter_state()
        } else {
            FilterState::from_query_pairs(pairs)
        }
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct DatasetListResponse<'a> {
    total: usize,
    count: usize,
    datasets: Vec<&'a Record>,
}

#[derive(Deserialize)]
struct FeedbackForm {
    #[serde(default)]
    text: String,
}

// ============================================================================
// Page Handlers
// ============================================================================

/// GET / - Catalog page for the filters in the query string
async fn index(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let catalog = &state.catalog;
    let filters = catalog.state_for(&pairs);
    let visible = compute_visible(&catalog.records, &filters);

    Html(render_page(&PageContext {
        title: "Dataset Catalog",
        total: catalog.records.len(),
        visible: &visible,
        state: &filters,
        facets: &catalog.facets,
        today: Local::now().date_naive(),
        recent_days: catalog.config.recent_days,
        load_error: catalog.load_error.as_deref(),
    }))
}

/// GET /export.csv - Visible subset as a dated attachment
async fn export(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let catalog = &state.catalog;
    let filters = catalog.state_for(&pairs);
    let visible = compute_visible(&catalog.records, &filters);

    match export_csv(&visible) {
        Ok(body) => {
            let file_name = export_file_name(&catalog.config.export_prefix, Local::now().date_naive());
            info!(rows = visible.len(), file = %file_name, "export served");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{file_name}\""),
                    ),
                ],
                body,
            )
                .into_response()
        }
        Err(CatalogError::NothingToExport) => (
            StatusCode::NOT_FOUND,
            Html(render_feedback_page(&CatalogError::NothingToExport.to_string(), false)),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// POST /feedback - Accepts the suggestion text and thanks the user
async fn feedback(Form(form): Form<FeedbackForm>) -> Response {
    match submit_feedback(&form.text) {
        Ok(thanks) => Html(render_feedback_page(thanks, true)).into_response(),
        Err(e) => {
            debug!("empty feedback rejected");
            (StatusCode::BAD_REQUEST, Html(render_feedback_page(&e.to_string(), false)))
                .into_response()
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match &state.catalog.load_error {
        None => (StatusCode::OK, Json(ApiResponse::ok("OK"))),
        Some(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::err("DEGRADED", e.clone())),
        ),
    }
}

/// GET /api/datasets - Visible subset as JSON, same query keys as the page
async fn get_datasets(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let catalog = &state.catalog;
    let filters = catalog.state_for(&pairs);
    let datasets = compute_visible(&catalog.records, &filters);

    Json(ApiResponse::ok(DatasetListResponse {
        total: catalog.records.len(),
        count: datasets.len(),
        datasets,
    }))
    .into_response()
}

/// GET /api/datasets/:id - One record by id
async fn get_dataset(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // Decode URL-encoded id
    let decoded_id = urlencoding::decode(&id)
        .unwrap_or_else(|_| id.clone().into())
        .into_owned();

    match state.catalog.records.iter().find(|r| r.id == decoded_id) {
        Some(record) => Json(ApiResponse::ok(Some(record))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Option<&Record>>::err(
                None,
                format!("No dataset with id {decoded_id}"),
            )),
        )
            .into_response(),
    }
}

// ============================================================================
// Main Server
// ============================================================================

fn app(state: AppState) -> Router {
    let static_dir = state.catalog.config.static_dir.clone();

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/datasets", get(get_datasets))
        .route("/datasets/:id", get(get_dataset))
        .with_state(state.clone());

    Router::new()
        .route("/", get(index))
        .route("/export.csv", get(export))
        .route("/feedback", post(feedback))
        .with_state(state)
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    logging::init_tracing(args.verbose, "info", &LogTarget::Stderr)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    println!("🌐 Dataset Catalog - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let catalog = Catalog::load(config);
    match &catalog.load_error {
        None => println!("✓ Catalog loaded: {} datasets", catalog.records.len()),
        Some(e) => eprintln!("❌ Error loading catalog: {e}"),
    }

    let addr = catalog.config.bind.clone();
    let state = AppState {
        catalog: Arc::new(catalog),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    println!("\n🚀 Server running on http://{addr}");
    println!("   API: http://{addr}/api/datasets");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use dataset_catalog::DatasetKind;
    use tower::ServiceExt;

    fn create_test_record(id: &str, name: &str, source: &str, category: &str) -> Record {
        Record {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("About {name}"),
            url: format!("https://example.org/{id}"),
            categories: vec![category.to_string()],
            source: source.to_string(),
            record_type: "Dataset".to_string(),
            year_start: "2000".to_string(),
            year_end: "2010".to_string(),
            ..Default::default()
        }
    }

    fn test_state(records: Vec<Record>, load_error: Option<&str>) -> AppState {
        let facets = Facets::from_records(&records);
        AppState {
            catalog: Arc::new(Catalog {
                records,
                facets,
                load_error: load_error.map(str::to_string),
                config: Config::default(),
            }),
        }
    }

    fn sample_records() -> Vec<Record> {
        vec![
            create_test_record("1", "Ocean Temps", "NOAA", "Climate"),
            create_test_record("2", "Hospital Beds", "Health Database", "Health"),
            create_test_record("a b", "Rainfall", "Met Office", "Climate"),
        ]
    }

    fn sample_state() -> AppState {
        test_state(sample_records(), None)
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, String) {
        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get_path(state: AppState, uri: &str) -> (StatusCode, String) {
        send(state, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_index_renders_filtered_page() {
        let (status, body) = get_path(sample_state(), "/?category=Climate&q=rain").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1 dataset found"));
        assert!(body.contains("Rainfall"));
        assert!(!body.contains("<h3>Ocean Temps</h3>"));
    }

    #[tokio::test]
    async fn test_default_types_apply_only_to_bare_path() {
        let facets = Facets::from_records(&sample_records());
        let state = AppState {
            catalog: Arc::new(Catalog {
                records: sample_records(),
                facets,
                load_error: None,
                config: Config {
                    default_types: vec![DatasetKind::Database],
                    ..Config::default()
                },
            }),
        };

        let (_, body) = get_path(state.clone(), "/").await;
        assert!(body.contains("1 dataset found"));

        let (_, body) = get_path(state, "/?q=").await;
        assert!(body.contains("3 datasets found"));
    }

    #[tokio::test]
    async fn test_index_shows_load_error() {
        let state = test_state(Vec::new(), Some("No such file"));
        let (status, body) = get_path(state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error loading catalog"));
    }

    #[tokio::test]
    async fn test_export_sets_attachment_headers() {
        let response = app(sample_state())
            .oneshot(Request::get("/export.csv?type=Database").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"datasets-"));
        assert!(disposition.ends_with(".csv\""));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(body.lines().count(), 2);
        assert!(body.contains("Hospital Beds"));
    }

    #[tokio::test]
    async fn test_export_of_nothing_is_not_found() {
        let (status, body) = get_path(sample_state(), "/export.csv?q=zzz").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("No datasets to export."));
    }

    #[tokio::test]
    async fn test_api_datasets_and_lookup() {
        let (status, body) = get_path(sample_state(), "/api/datasets?category=Climate").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["total"], 3);
        assert_eq!(json["data"]["count"], 2);

        let (status, body) = get_path(sample_state(), "/api/datasets/a%20b").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["name"], "Rainfall");

        let (status, _) = get_path(sample_state(), "/api/datasets/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_load_state() {
        let (status, _) = get_path(sample_state(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_path(test_state(Vec::new(), Some("bad csv")), "/api/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("bad csv"));
    }

    #[tokio::test]
    async fn test_feedback_form() {
        let post = |text: &str| {
            Request::post("/feedback")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("text={text}")))
                .unwrap()
        };

        let (status, body) = send(sample_state(), post("More+ocean+data")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Thank you for your feedback!"));

        let (status, body) = send(sample_state(), post("")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Please enter your feedback before submitting."));
    }
}
