//! HTTP/JSON interface for the time tracker.
//!
//! Every `/time/*` route is scoped to the owner named by the `x-owner-id`
//! header, which the session layer in front of this server is expected to
//! set. Responses use the `{success, data?, message?}` envelope, failures
//! `{success: false, error}`.
//!
//! One SQLite connection is shared behind a mutex. Each request locks it for a
//! single tracker operation, run on tokio's blocking pool.

pub mod auth;
mod error;
mod request;
mod routes;

use std::sync::{Arc, Mutex, PoisonError};

use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use zt_core::{BoundsPolicy, Calendar};
use zt_db::Database;

pub use error::{ApiError, Envelope};

use crate::error::failure;

/// Per-deployment settings shared by all handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerSettings {
    pub calendar: Calendar,
    pub bounds_policy: BoundsPolicy,
}

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(db: Database, settings: ServerSettings) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            settings: Arc::new(settings),
        }
    }

    /// Runs `op` against the locked connection on the blocking pool, mapping
    /// tracker errors with `context` as the 500 message.
    async fn with_db<T, F>(&self, context: &'static str, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Database) -> zt_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = db.lock().unwrap_or_else(PoisonError::into_inner);
            op(&mut *guard)
        })
        .await;
        match joined {
            Ok(result) => result.map_err(failure(context)),
            Err(err) => {
                tracing::error!(error = %err, context, "database task failed");
                Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, context))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/time/start", post(routes::start))
        .route("/time/stop", post(routes::stop))
        .route("/time/create", post(routes::create))
        .route("/time/update", put(routes::update))
        .route("/time/delete", delete(routes::delete))
        .route("/time/list", get(routes::list))
        .route("/time/get", get(routes::get))
        .route("/time/stats", get(routes::stats))
        .route("/time/reports", get(routes::reports))
        .route("/time/export", get(routes::export))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let address = listener.local_addr()?;
    tracing::info!(%address, "time tracker listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
