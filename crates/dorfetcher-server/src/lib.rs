pub mod config;
pub mod metrics;

use axum::http::StatusCode;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dorfetcher_core::{ControllerType, FedoraType, FetchError, FetchResponse, RequestParams};
use dorfetcher_index::{Fetcher, InMemoryIndex, SearchIndex, SolrIndex};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    fetcher: Fetcher,
}

impl AppState {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            fetcher: Fetcher::new(index),
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Solr when a url is configured, otherwise the in-memory index.
pub fn build_index(config: &ServerConfig) -> anyhow::Result<Arc<dyn SearchIndex>> {
    if let Some(url) = &config.solr_url {
        let solr = SolrIndex::new(url.clone(), Duration::from_millis(config.solr_timeout_ms))?;
        return Ok(Arc::new(solr));
    }
    warn!("no solr url configured, serving from an in-memory index");
    let mem = match &config.fixtures_path {
        Some(path) => match InMemoryIndex::from_json_file(path) {
            Ok(idx) => idx,
            Err(e) => {
                warn!("loading fixtures from {:?} failed: {}, starting empty", path, e);
                InMemoryIndex::new()
            }
        },
        None => InMemoryIndex::new(),
    };
    Ok(Arc::new(mem))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/collections", get(all_collections))
        .route("/collections/:id", get(under_collection))
        .route("/apos", get(all_apos))
        .route("/apos/:id", get(under_apo))
        .route("/tags/:tag", get(tagged))
        .route("/metrics", get(metrics_text))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let index = build_index(&config)?;
    info!("fetching from {}", index.describe());
    let app = router(AppState::new(index));
    let addr = config.http_addr;
    match &config.tls {
        Some(tls) => {
            let rustls =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                    .await?;
            info!("https listening on {}", addr);
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("http listening on {}", addr);
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}

/// A failed fetch, rendered as `{"error": kind, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub FetchError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            FetchError::InvalidIdentifier(_) | FetchError::InvalidTimeRange(_) => {
                StatusCode::BAD_REQUEST
            }
            FetchError::EmptySearchResponse | FetchError::Backend(_) => StatusCode::BAD_GATEWAY,
            FetchError::InternalConsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("fetch failed: {}", self.0);
        } else {
            warn!("rejected request: {}", self.0);
        }
        (
            status,
            Json(json!({"error": self.0.kind(), "message": self.0.to_string()})),
        )
            .into_response()
    }
}

type FetchResult = Result<Json<FetchResponse>, ApiError>;

fn respond(route: &str, res: dorfetcher_core::Result<FetchResponse>) -> FetchResult {
    match res {
        Ok(body) => {
            metrics::record(route, "ok");
            Ok(Json(body))
        }
        Err(e) => {
            metrics::record(route, e.kind());
            Err(e.into())
        }
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_text() -> impl IntoResponse {
    (StatusCode::OK, metrics::render())
}

async fn all_collections(
    State(app): State<AppState>,
    Query(params): Query<RequestParams>,
) -> FetchResult {
    let res = app
        .fetcher
        .find_all_fedora_type(&params, FedoraType::Collection)
        .await;
    respond("collections", res)
}

async fn under_collection(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(mut params): Query<RequestParams>,
) -> FetchResult {
    params.id = Some(id);
    let res = app
        .fetcher
        .find_all_under(&params, ControllerType::Collection)
        .await;
    respond("collection", res)
}

async fn all_apos(
    State(app): State<AppState>,
    Query(params): Query<RequestParams>,
) -> FetchResult {
    let res = app
        .fetcher
        .find_all_fedora_type(&params, FedoraType::AdminPolicy)
        .await;
    respond("apos", res)
}

async fn under_apo(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(mut params): Query<RequestParams>,
) -> FetchResult {
    params.id = Some(id);
    let res = app.fetcher.find_all_under(&params, ControllerType::Apo).await;
    respond("apo", res)
}

async fn tagged(
    State(app): State<AppState>,
    Path(tag): Path<String>,
    Query(mut params): Query<RequestParams>,
) -> FetchResult {
    params.id = Some(tag);
    let res = app.fetcher.find_tagged(&params).await;
    respond("tag", res)
}
