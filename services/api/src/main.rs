//! API Service - HTTP boundary for the process dashboard
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /filter-options - Distinct values per filterable column
//! - POST /dashboard-query - FilterSpec body -> KPIs, distributions, table
//!
//! This service is thin glue: it owns the record source (the spreadsheet
//! snapshot, fetched as a published CSV export or read from a local .xlsx
//! file) and hands everything else to the dashboard core. The core is
//! synchronous and fetches on every query, so handlers run it on the
//! blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use dashboard::{DashboardConfig, DashboardService, FilterSpec, Record, RecordSource};

// ============================================================================
// Record sources
// ============================================================================

/// The spreadsheet snapshot behind the dashboard. Opaque to the core; a
/// fetch failure surfaces there as an empty dataset.
enum SheetSource {
    /// Published-sheet CSV export, fetched per query.
    CsvUrl(String),
    /// Local .xlsx snapshot, first worksheet.
    XlsxFile(PathBuf),
}

impl RecordSource for SheetSource {
    fn fetch_all(&self) -> Result<Vec<Record>> {
        match self {
            SheetSource::CsvUrl(url) => fetch_csv_records(url),
            SheetSource::XlsxFile(path) => read_xlsx_records(path),
        }
    }
}

fn fetch_csv_records(url: &str) -> Result<Vec<Record>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let body = client
        .get(url)
        .send()
        .context("Failed to fetch sheet CSV export")?
        .error_for_status()
        .context("Sheet CSV export returned an error status")?
        .text()
        .context("Failed to read sheet CSV body")?;
    parse_csv_records(&body)
}

/// Parse CSV text into raw records: header row gives the column names, each
/// data row becomes one Record. Unreadable rows are skipped, not fatal.
fn parse_csv_records(content: &str) -> Result<Vec<Record>> {
    // Remove UTF-8 BOM if present
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (line_idx, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(error) => {
                warn!(line = line_idx + 2, %error, "skipping unreadable CSV row");
                continue;
            }
        };
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.trim().is_empty())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn read_xlsx_records(path: &Path) -> Result<Vec<Record>> {
    let mut workbook = open_workbook_auto(path).context("Failed to open spreadsheet file")?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .context("Spreadsheet file has no sheets")?;

    let range = workbook
        .worksheet_range(sheet_name)
        .context("Failed to read worksheet")?;

    sheet_to_records(range.rows())
}

/// Assemble worksheet rows into raw records: the first row gives the column
/// names (blank headers dropped), every later row becomes one Record. A row
/// shorter than the header row yields empty values, which the normalizer
/// treats as missing.
fn sheet_to_records<'a>(mut rows: impl Iterator<Item = &'a [Data]>) -> Result<Vec<Record>> {
    let headers: Vec<String> = rows
        .next()
        .context("Worksheet has no header row")?
        .iter()
        .map(cell_to_string)
        .collect();

    let records = rows
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.trim().is_empty())
                .map(|(idx, header)| {
                    let value = row.get(idx).map(cell_to_string).unwrap_or_default();
                    (header.clone(), value)
                })
                .collect()
        })
        .collect();
    Ok(records)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.to_string(),
        Data::Empty => String::new(),
        // Spreadsheets store codes and counts as floats; keep "42", not "42.0"
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => format!("{}", other),
    }
}

// ============================================================================
// State and response types
// ============================================================================

struct AppState {
    service: DashboardService<SheetSource>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn filter_options_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match tokio::task::spawn_blocking(move || state.service.filter_options()).await {
        Ok(options) => Json(options).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn dashboard_query_handler(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<FilterSpec>,
) -> impl IntoResponse {
    match tokio::task::spawn_blocking(move || state.service.dashboard(&spec)).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

// ============================================================================
// Main
// ============================================================================

fn load_config() -> Result<DashboardConfig> {
    match std::env::var("DASHBOARD_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            serde_json::from_str(&text).context("Invalid dashboard config JSON")
        }
        Err(_) => Ok(DashboardConfig::default()),
    }
}

fn load_source() -> Result<SheetSource> {
    if let Ok(url) = std::env::var("SHEET_CSV_URL") {
        return Ok(SheetSource::CsvUrl(url));
    }
    if let Ok(path) = std::env::var("SHEET_XLSX_PATH") {
        return Ok(SheetSource::XlsxFile(PathBuf::from(path)));
    }
    anyhow::bail!("SHEET_CSV_URL or SHEET_XLSX_PATH env var missing")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind = std::env::var("API_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let source = load_source()?;
    let config = load_config()?;

    let state = Arc::new(AppState {
        service: DashboardService::new(source, config),
    });

    // CORS for the web frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/filter-options", get(filter_options_handler))
        .route("/dashboard-query", post(dashboard_query_handler))
        .layer(cors)
        .with_state(state);

    info!(%bind, "dashboard API listening");

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
