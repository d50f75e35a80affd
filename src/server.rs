use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::api::MarketDataProvider;
use crate::config::BasicCredentials;
use crate::models::RenderedImage;
use crate::services::request_service::GraphQuery;
use crate::services::{auth_service, graph_service, request_service};
use crate::utils::clock::Clock;
use crate::utils::errors::ServiceError;

/// Read-only state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<BasicCredentials>,
    pub provider: Arc<dyn MarketDataProvider>,
    pub clock: Arc<dyn Clock>,
    pub request_timeout: Duration,
    pub cache_max_age_secs: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(spark_graph))
        .fallback(not_found)
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn not_found() -> ServiceError {
    ServiceError::NotFound
}

async fn spark_graph(
    method: Method,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    query: Result<Query<GraphQuery>, QueryRejection>,
) -> Response {
    let span = info_span!("graph_request", request_id = %Uuid::new_v4());
    let cache_max_age_secs = state.cache_max_age_secs;

    match handle_graph_request(method, headers, state, query)
        .instrument(span)
        .await
    {
        Ok(image) => png_response(image, cache_max_age_secs),
        Err(err) => err.into_response(),
    }
}

/// Received → AuthChecked → Validated → DataFetched → Rendered
async fn handle_graph_request(
    method: Method,
    headers: HeaderMap,
    state: Arc<AppState>,
    query: Result<Query<GraphQuery>, QueryRejection>,
) -> Result<RenderedImage, ServiceError> {
    if method != Method::GET {
        return Err(ServiceError::MethodNotAllowed);
    }

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    auth_service::verify_basic_auth(authorization, &state.credentials)?;

    let Query(query) = query.map_err(|e| ServiceError::invalid("query", e.body_text()))?;
    let request = request_service::validate_request(&query)?;
    info!(
        "Spark graph requested: {} {} {}x{}",
        request.ticker,
        request.duration.as_str(),
        request.size.width,
        request.size.height
    );

    let image = graph_service::generate_graph(
        state.provider.as_ref(),
        state.clock.as_ref(),
        &request,
        state.request_timeout,
    )
    .await?;
    info!(
        "Spark graph generated: {}x{} ({} bytes)",
        image.width,
        image.height,
        image.bytes.len()
    );

    Ok(image)
}

fn png_response(image: RenderedImage, cache_max_age_secs: u64) -> Response {
    let cache_control = HeaderValue::from_str(&format!("public, max-age={}", cache_max_age_secs))
        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CACHE_CONTROL, cache_control),
        ],
        image.bytes,
    )
        .into_response()
}
