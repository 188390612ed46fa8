// Catering HTTP API - axum routes over the domain operations
//
// Successful responses carry the bare value (record, list, or number).
// Failures carry {"success": false, "error": "..."} with 404, 400 or 500.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db::{setup_database, SharedDb};
use crate::entities::{Client, Cook, Dish, NewClient, NewCook, NewDish};
use crate::error::CateringError;
use crate::{association, billing, classification, lookup, registry, reporting};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
}

impl AppState {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError(CateringError::Internal("database lock poisoned".to_string())))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Debug)]
pub struct ApiError(pub CateringError);

impl From<CateringError> for ApiError {
    fn from(err: CateringError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CateringError::NotFound { .. } | CateringError::ClientNameNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            CateringError::Validation(_) => StatusCode::BAD_REQUEST,
            CateringError::Database(_)
            | CateringError::Serialization(_)
            | CateringError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorResponse {
            success: false,
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json("OK")
}

/// POST /api/clients
async fn create_client(
    State(state): State<AppState>,
    Json(client): Json<NewClient>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let mut conn = state.conn()?;
    let client = registry::register_client(&mut conn, &client)?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /api/clients/:id
async fn get_client(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Client>> {
    let conn = state.conn()?;
    Ok(Json(registry::get_client(&conn, id)?))
}

/// GET /api/clients/:id/total - bare number
async fn total_payable(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<f64>> {
    let mut conn = state.conn()?;
    Ok(Json(billing::total_payable(&mut conn, id)?))
}

/// PUT /api/clients/:id/classification
async fn recompute_classification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let mut conn = state.conn()?;
    classification::recompute_classification(&mut conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/cooks
async fn create_cook(
    State(state): State<AppState>,
    Json(cook): Json<NewCook>,
) -> ApiResult<(StatusCode, Json<Cook>)> {
    let mut conn = state.conn()?;
    let cook = registry::register_cook(&mut conn, &cook)?;
    Ok((StatusCode::CREATED, Json(cook)))
}

/// GET /api/cooks/:id
async fn get_cook(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Cook>> {
    let conn = state.conn()?;
    Ok(Json(registry::get_cook(&conn, id)?))
}

/// POST /api/dishes/:client_id/:cook_id
async fn assign_dish(
    State(state): State<AppState>,
    Path((client_id, cook_id)): Path<(i64, i64)>,
    Json(dish): Json<NewDish>,
) -> ApiResult<(StatusCode, Json<Dish>)> {
    let mut conn = state.conn()?;
    let dish = association::assign_dish(&mut conn, &dish, client_id, cook_id)?;
    Ok((StatusCode::CREATED, Json(dish)))
}

/// POST /api/dish-cooks/:dish_id/:cook_id
async fn attach_cook(
    State(state): State<AppState>,
    Path((dish_id, cook_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Dish>> {
    let mut conn = state.conn()?;
    Ok(Json(association::attach_cook(&mut conn, dish_id, cook_id)?))
}

/// GET /api/client-dishes/:first_name/:last_name
async fn dishes_by_client_name(
    State(state): State<AppState>,
    Path((first_name, last_name)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Dish>>> {
    let conn = state.conn()?;
    Ok(Json(lookup::dishes_by_client_name(&conn, &first_name, &last_name)?))
}

// ============================================================================
// Router & Server
// ============================================================================

pub fn router(db: SharedDb) -> Router {
    let state = AppState { db };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/clients", post(create_client))
        .route("/clients/:id", get(get_client))
        .route("/clients/:id/total", get(total_payable))
        .route("/clients/:id/classification", put(recompute_classification))
        .route("/cooks", post(create_cook))
        .route("/cooks/:id", get(get_cook))
        .route("/dishes/:client_id/:cook_id", post(assign_dish))
        .route("/dish-cooks/:dish_id/:cook_id", post(attach_cook))
        .route("/client-dishes/:first_name/:last_name", get(dishes_by_client_name))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

/// Open the database, start the cook report task and serve until a
/// shutdown signal arrives.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    setup_database(&conn).context("Failed to set up database schema")?;
    info!(path = %config.db_path.display(), "Database opened");

    let db: SharedDb = Arc::new(Mutex::new(conn));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let reporter = reporting::spawn_reporting_task(Arc::clone(&db), config.scan_interval, shutdown_rx);
    info!(interval_secs = config.scan_interval.as_secs(), "Cook report scheduled");

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, router(db))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(());
    reporter.await.context("Cook report task failed")?;
    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
