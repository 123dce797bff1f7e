use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::cell::FlatMap;
use crate::config::{GridConfig, ServerConfig};
use crate::grid::{GridError, GridModel};
use crate::renderer::to_static_markup;
use crate::saving::{GridStore, StoreError};

pub struct AppState {
    store: GridStore,
    config: GridConfig,
    // Serializes read-modify-write cycles so each grid has a single writer.
    // Only taken inside `spawn_blocking`.
    edit_lock: Mutex<()>,
}

impl AppState {
    pub fn new(store: GridStore, config: GridConfig) -> Self {
        AppState {
            store,
            config,
            edit_lock: Mutex::new(()),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
enum EditOp {
    InsertRow,
    DeleteRow,
    InsertColumn,
    DeleteColumn,
    SetCell,
}

#[derive(Deserialize, Debug)]
struct EditRequest {
    op: EditOp,
    index: Option<usize>,
    row: Option<usize>,
    col: Option<usize>,
    content: Option<String>,
}

#[derive(Serialize)]
struct EditResponse {
    status: String,
    changed: bool,
    rows: usize,
    cols: usize,
    cells: FlatMap,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: String,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        status: "error".to_string(),
        message: message.into(),
    };
    (code, Json(body)).into_response()
}

fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::InvalidId(_) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        StoreError::NotFound(_) => error_response(StatusCode::NOT_FOUND, err.to_string()),
        _ => {
            warn!("store failure: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/grid/:id", get(get_grid).put(put_grid))
        .route("/api/grid/:id/edit", post(edit_grid))
        .route("/api/grid/:id/report", get(grid_report))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = GridStore::open(&config.data_dir)?;
    let state = Arc::new(AppState::new(store, config.grid.clone()));
    let app = router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run store I/O off the async workers; the edit lock is a std mutex held
/// only inside the blocking closure.
async fn blocking<F>(work: F) -> Response
where
    F: FnOnce() -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("blocking task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

async fn get_grid(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    blocking(move || match state.store.load(&id) {
        Ok(flat) => {
            // Re-normalise in case the file predates the current limits.
            let grid = GridModel::load_from(&flat, &state.config);
            Json(grid.to_flat_map()).into_response()
        }
        Err(e) => store_error_response(e),
    })
    .await
}

async fn put_grid(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let grid = match GridModel::from_json(&payload, &state.config) {
        Ok(grid) => grid,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let flat = grid.to_flat_map();

    blocking(move || {
        let _guard = state.edit_lock.lock().unwrap_or_else(|p| p.into_inner());
        match state.store.save(&id, &flat) {
            Ok(()) => Json(flat).into_response(),
            Err(e) => store_error_response(e),
        }
    })
    .await
}

fn apply_edit(grid: &mut GridModel, req: EditRequest) -> Result<bool, Response> {
    let missing = |field: &str| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("missing field `{}`", field),
        )
    };

    let result = match req.op {
        EditOp::InsertRow => grid.insert_row(req.index.ok_or_else(|| missing("index"))?),
        EditOp::DeleteRow => grid.delete_row(req.index.ok_or_else(|| missing("index"))?),
        EditOp::InsertColumn => grid.insert_column(req.index.ok_or_else(|| missing("index"))?),
        EditOp::DeleteColumn => grid.delete_column(req.index.ok_or_else(|| missing("index"))?),
        EditOp::SetCell => {
            let row = req.row.ok_or_else(|| missing("row"))?;
            let col = req.col.ok_or_else(|| missing("col"))?;
            grid.set_cell(row, col, req.content.unwrap_or_default())
        }
    };

    result.map_err(|e: GridError| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

async fn edit_grid(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<EditRequest>,
) -> Response {
    blocking(move || {
        let _guard = state.edit_lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut grid = match state.store.load(&id) {
            Ok(flat) => GridModel::load_from(&flat, &state.config),
            Err(StoreError::NotFound(_)) => {
                GridModel::with_config(state.config.fallback(), &state.config)
            }
            Err(e) => return store_error_response(e),
        };

        let changed = match apply_edit(&mut grid, req) {
            Ok(changed) => changed,
            Err(resp) => return resp,
        };

        let cells = grid.to_flat_map();
        if let Err(e) = state.store.save(&id, &cells) {
            return store_error_response(e);
        }

        Json(EditResponse {
            status: "ok".to_string(),
            changed,
            rows: grid.row_count(),
            cols: grid.column_count(),
            cells,
        })
        .into_response()
    })
    .await
}

async fn grid_report(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    blocking(move || match state.store.load(&id) {
        Ok(flat) => {
            let grid = GridModel::load_from(&flat, &state.config);
            Html(to_static_markup(&grid, &state.config.print)).into_response()
        }
        Err(e) => store_error_response(e),
    })
    .await
}
