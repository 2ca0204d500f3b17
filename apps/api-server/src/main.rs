//! api-server — HTTP front end for the URL Shortener workspace.
//!
//! Routes:
//! - `POST /url` saves a mapping (alias optional; generated when absent).
//! - `GET /:alias` redirects (302) to the stored URL.
//! - `DELETE /url/:alias` removes a mapping.
//! - `GET /healthz` liveness.
//!
//! Storage: SQLite (default, `sqlite` feature) or in-memory.
//!
//! Run:
//! ```bash
//! # pretty logs (default); data in ./storage/storage.db
//! cargo run -p api-server
//!
//! # JSON logs at info level, custom address
//! APP_ENV=prod HTTP_ADDRESS=127.0.0.1:9000 cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use domain::adapters::memory_store::InMemoryStore;
use domain::generate::RandomAliasGenerator;
use domain::service::ShortenerService;
use domain::validate::validate_alias;
use domain::{Alias, AliasStore, CoreError, NewMapping};
use serde::{Deserialize, Serialize};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type Shortener = ShortenerService<Arc<dyn AliasStore>, RandomAliasGenerator>;

/// Aliases that would be shadowed by fixed routes.
const RESERVED_ALIASES: &[&str] = &["url", "healthz"];

#[derive(Clone)]
struct AppState {
    shortener: Arc<Shortener>,
    shortlink_domain: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    info!(env = ?cfg.env, storage = ?cfg.storage_provider, "starting {}", domain::about());

    // Store initialisation failure is fatal; there is no degraded mode.
    let store = match build_store(&cfg) {
        Ok(s) => s,
        Err(e) => {
            error!(err = %e, path = %cfg.storage_path.display(), "failed to initialize storage");
            std::process::exit(1);
        }
    };

    let shortener = ShortenerService::new(store, RandomAliasGenerator::new(cfg.alias_length))
        .with_generated_retries(cfg.alias_retries);
    let state = AppState {
        shortener: Arc::new(shortener),
        shortlink_domain: cfg.shortlink_domain.clone(),
    };

    let app = app(state, cfg.request_timeout);

    let listener = match tokio::net::TcpListener::bind(cfg.address).await {
        Ok(l) => l,
        Err(e) => {
            error!(addr = %cfg.address, err = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %cfg.address, "api-server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
    info!("api-server stopped");
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.env.default_log_filter()));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct the store selected by config and feature flags.
fn build_store(cfg: &config::Config) -> Result<Arc<dyn AliasStore>, CoreError> {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => Ok(Arc::new(sqlite_adapter::SqliteStore::open(
            &cfg.storage_path,
        )?)),
        #[cfg(not(feature = "sqlite"))]
        config::StorageProvider::Sqlite => Err(CoreError::StoreUnavailable(
            "built without the sqlite feature".into(),
        )),
        config::StorageProvider::Memory => {
            warn!("STORAGE_PROVIDER=memory: mappings are lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(err = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn app(state: AppState, request_timeout: Duration) -> Router {
    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    Router::new()
        .route("/healthz", get(healthz))
        .route("/url", post(save_url))
        .route("/url/:alias", delete(delete_url))
        .route("/:alias", get(redirect))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .with_state(state)
}

#[derive(Deserialize)]
struct SaveReq {
    url: String,
    #[serde(default)]
    alias: Option<String>,
}

#[derive(Serialize)]
struct SaveOut {
    id: i64,
    alias: String,
    url: String,
    short_url: String,
}

/// Run a store-touching closure on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, CoreError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::StoreUnavailable(format!("blocking task failed: {e}")))?
}

/// Log at the severity the error kind calls for and render the public body.
fn error_response(err: &CoreError, op: &'static str) -> Response {
    match err {
        CoreError::StoreUnavailable(_) => error!(op, err = %err, "store failure"),
        _ => info!(op, err = %err, "request rejected"),
    }
    let (status, body) = http_common::error_reply(err);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn save_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SaveReq>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(e) => {
            warn!(err = %e, "failed to decode request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_error_with_message(
                    "bad_request",
                    "failed to decode request",
                )),
            )
                .into_response();
        }
    };

    // An empty alias means "generate one", same as omitting it.
    let alias = match body.alias.filter(|a| !a.is_empty()) {
        Some(raw) => {
            if RESERVED_ALIASES.contains(&raw.as_str()) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(http_common::json_error_with_message(
                        "invalid_request",
                        "alias is reserved",
                    )),
                )
                    .into_response();
            }
            match validate_alias(&raw) {
                Ok(a) => Some(a),
                Err(e) => return error_response(&e, "save"),
            }
        }
        None => None,
    };

    let shortener = Arc::clone(&state.shortener);
    let input = NewMapping {
        target_url: body.url,
        alias,
    };
    match run_blocking(move || shortener.shorten(input)).await {
        Ok(mapping) => {
            info!(id = mapping.id, alias = %mapping.alias, "url added");
            let host = headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            let short_url = http_common::build_short_url(
                state.shortlink_domain.as_deref(),
                host,
                mapping.alias.as_str(),
            );
            (
                StatusCode::CREATED,
                Json(SaveOut {
                    id: mapping.id,
                    alias: mapping.alias.as_str().to_string(),
                    url: mapping.target_url,
                    short_url,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(&e, "save"),
    }
}

async fn redirect(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let alias = match Alias::new(raw) {
        Ok(a) => a,
        Err(_) => {
            info!("bad alias in path");
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_err("invalid_alias")),
            )
                .into_response();
        }
    };

    let shortener = Arc::clone(&state.shortener);
    let lookup = alias.clone();
    match run_blocking(move || shortener.resolve(&lookup)).await {
        Ok(url) => match HeaderValue::try_from(url.as_str()) {
            Ok(location) => {
                info!(alias = %alias, redirect_to = %url, "resolve ok");
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            Err(e) => {
                let err = CoreError::StoreUnavailable(format!(
                    "stored url for {alias} is not a valid header: {e}"
                ));
                error_response(&err, "redirect")
            }
        },
        Err(e) => error_response(&e, "redirect"),
    }
}

async fn delete_url(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let alias = match Alias::new(raw) {
        Ok(a) => a,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_err("invalid_alias")),
            )
                .into_response();
        }
    };

    let shortener = Arc::clone(&state.shortener);
    let target = alias.clone();
    match run_blocking(move || shortener.remove(&target)).await {
        Ok(()) => {
            info!(alias = %alias, "delete ok");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e, "delete"),
    }
}
