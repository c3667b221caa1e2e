// PC Build Planner - Web Server
// REST API over the build list, plus the static web front end

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

use pc_build_planner::{
    document_for, export_to_string, format_summary, format_total, logging, BuildController,
    BuildError, BuildRow, CategoryEntry, CategoryRegistry, Config, RowField, SqliteStore,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    controller: Arc<Mutex<BuildController<SqliteStore>>>,
    export_filename: String,
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
}

impl ApiResponse<()> {
    fn fail(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

/// Error half of every handler
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(position: usize) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("No row at position {}", position))
    }
}

impl From<BuildError> for ApiError {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::MalformedImportFile(format) => {
                Self::new(StatusCode::BAD_REQUEST, format.to_string())
            }
            other => {
                error!(error = %other, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::fail(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn lock(state: &AppState) -> Result<MutexGuard<'_, BuildController<SqliteStore>>, ApiError> {
    state.controller.lock().map_err(|_| {
        error!("build state lock poisoned");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Build state unavailable")
    })
}

// ============================================================================
// Response bodies
// ============================================================================

/// One row as the front end renders it
#[derive(Serialize)]
struct RowView {
    position: usize,
    category: String,
    icon_id: &'static str,
    known_category: bool,
    product: String,
    price: String,
    price_valid: bool,
    source: String,
}

/// The whole build with its derived totals
#[derive(Serialize)]
struct BuildView {
    rows: Vec<RowView>,
    parts: usize,
    total: f64,
    total_display: String,
}

impl BuildView {
    fn from_controller(controller: &BuildController<SqliteStore>) -> Self {
        let registry = CategoryRegistry::standard();

        let rows = controller
            .list()
            .iter_positioned()
            .map(|(position, row)| RowView {
                position,
                category: row.category.clone(),
                icon_id: registry.icon_for(&row.category),
                known_category: registry.contains(&row.category),
                product: row.product.clone(),
                price: row.price.clone(),
                price_valid: row.price_is_valid(),
                source: row.source.clone(),
            })
            .collect();

        Self {
            rows,
            parts: controller.list().len(),
            total: controller.total(),
            total_display: format_total(controller.total()),
        }
    }
}

#[derive(Serialize)]
struct IconResponse {
    category: String,
    icon_id: &'static str,
    known: bool,
}

#[derive(Serialize)]
struct ImportResponse {
    imported: usize,
    build: BuildView,
}

#[derive(Serialize)]
struct SummaryResponse {
    markdown: String,
    total: f64,
    total_display: String,
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Deserialize)]
struct EditRequest {
    field: RowField,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct ReorderRequest {
    from: usize,
    to: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/categories - Standard categories with their icons
async fn get_categories() -> Json<ApiResponse<&'static [CategoryEntry]>> {
    Json(ApiResponse::ok(CategoryRegistry::standard().entries()))
}

/// GET /api/categories/:name/icon - Icon for any category name
async fn get_category_icon(Path(category): Path<String>) -> Json<ApiResponse<IconResponse>> {
    let registry = CategoryRegistry::standard();
    Json(ApiResponse::ok(IconResponse {
        icon_id: registry.icon_for(&category),
        known: registry.contains(&category),
        category,
    }))
}

/// GET /api/build - Current rows and total
async fn get_build(State(state): State<AppState>) -> ApiResult<BuildView> {
    let controller = lock(&state)?;
    Ok(Json(ApiResponse::ok(BuildView::from_controller(&controller))))
}

/// POST /api/build/rows - Append a row (missing fields default)
async fn add_row(State(state): State<AppState>, Json(row): Json<BuildRow>) -> ApiResult<BuildView> {
    let mut controller = lock(&state)?;
    controller.add_row(row)?;
    Ok(Json(ApiResponse::ok(BuildView::from_controller(&controller))))
}

/// PATCH /api/build/rows/:position - Set one field of a row
async fn edit_row(
    State(state): State<AppState>,
    Path(position): Path<usize>,
    Json(request): Json<EditRequest>,
) -> ApiResult<BuildView> {
    let mut controller = lock(&state)?;
    if !controller.edit_row(position, request.field, &request.value)? {
        return Err(ApiError::not_found(position));
    }
    Ok(Json(ApiResponse::ok(BuildView::from_controller(&controller))))
}

/// DELETE /api/build/rows/:position - Remove a row
async fn delete_row(
    State(state): State<AppState>,
    Path(position): Path<usize>,
) -> ApiResult<BuildView> {
    let mut controller = lock(&state)?;
    if !controller.delete_row(position)? {
        return Err(ApiError::not_found(position));
    }
    Ok(Json(ApiResponse::ok(BuildView::from_controller(&controller))))
}

/// POST /api/build/reorder - Move a row; the same index is a no-op
async fn reorder(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<BuildView> {
    let mut controller = lock(&state)?;
    let len = controller.list().len();
    if request.from >= len || request.to >= len {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Positions must be below {}", len),
        ));
    }
    controller.reorder(request.from, request.to)?;
    Ok(Json(ApiResponse::ok(BuildView::from_controller(&controller))))
}

/// DELETE /api/build - Clear every row and the saved build
async fn clear_build(State(state): State<AppState>) -> ApiResult<BuildView> {
    let mut controller = lock(&state)?;
    controller.clear()?;
    Ok(Json(ApiResponse::ok(BuildView::from_controller(&controller))))
}

/// Attachment header; non-ASCII or quoted names also get an RFC 5987 `filename*`
fn content_disposition(filename: &str) -> String {
    let plain = filename.is_ascii() && !filename.contains(['"', '\\', '%']);
    if plain {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !matches!(c, '"' | '\\' | '%') { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// GET /api/build/export - Download the build as a JSON file
async fn export_build(State(state): State<AppState>) -> Result<Response, ApiError> {
    let controller = lock(&state)?;
    let body = export_to_string(controller.list())?;
    let disposition = content_disposition(&state.export_filename);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/build/import - Replace the build with an uploaded file
async fn import_build(State(state): State<AppState>, body: String) -> ApiResult<ImportResponse> {
    let mut controller = lock(&state)?;
    let imported = controller.import(&body)?;
    info!(imported, "build imported over HTTP");
    Ok(Json(ApiResponse::ok(ImportResponse {
        imported,
        build: BuildView::from_controller(&controller),
    })))
}

/// GET /api/build/summary - Shareable markdown summary
async fn get_summary(State(state): State<AppState>) -> ApiResult<SummaryResponse> {
    let controller = lock(&state)?;
    Ok(Json(ApiResponse::ok(SummaryResponse {
        markdown: format_summary(controller.list()),
        total: controller.total(),
        total_display: format_total(controller.total()),
    })))
}

// ============================================================================
// Router
// ============================================================================

fn app(state: AppState, static_dir: &FsPath) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .route("/categories/:name/icon", get(get_category_icon))
        .route("/build", get(get_build).delete(clear_build))
        .route("/build/rows", post(add_row))
        .route("/build/rows/:position", patch(edit_row).delete(delete_row))
        .route("/build/reorder", post(reorder))
        .route("/build/export", get(export_build))
        .route("/build/import", post(import_build))
        .route("/build/summary", get(get_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_stderr();

    println!("🌐 PC Build Planner - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::load().context("Failed to load configuration")?;
    let store_path = config.store_path()?;
    let default_document = config.default_document.clone();

    // Hydration may read a file or fetch a URL
    let (controller, source) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let store = SqliteStore::open(&store_path)
            .with_context(|| format!("Failed to open build store at {}", store_path.display()))?;
        let document = document_for(&default_document);
        Ok(BuildController::hydrate(store, document.as_ref()))
    })
    .await
    .context("Hydration task failed")??;

    println!(
        "✓ Build loaded: {} rows from {}",
        controller.list().len(),
        source.as_str()
    );

    let state = AppState {
        controller: Arc::new(Mutex::new(controller)),
        export_filename: config.export_filename.clone(),
    };
    let app = app(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/build", config.bind_addr);
    println!("   Static files: {}", config.static_dir.display());
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
