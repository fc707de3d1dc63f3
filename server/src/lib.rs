pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use tts_core::{ModelCache, ModelLoader};

use crate::config::ServerConfig;
use crate::handlers::{
    health_check, list_speakers, metrics_endpoint, status_endpoint, tts_endpoint,
    AUDIO_DURATION_HEADER, SAMPLE_RATE_HEADER,
};
use crate::metrics::AppMetrics;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelCache>,
    pub metrics: AppMetrics,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(loader: Arc<dyn ModelLoader>, config: ServerConfig) -> Self {
        Self {
            models: Arc::new(ModelCache::new(loader, config.model_id.clone())),
            metrics: AppMetrics::new(),
            config,
        }
    }
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    // a hyphenated uuid is always a valid header value
    let Ok(value) = HeaderValue::from_str(&request_id) else {
        return next.run(request).await;
    };
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, value.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, value);
    response
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([AUDIO_DURATION_HEADER, SAMPLE_RATE_HEADER, REQUEST_ID_HEADER])
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .flatten()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins");
        base.allow_origin(Any)
    } else {
        info!("CORS configured for {} origin(s)", origins.len());
        base.allow_origin(AllowOrigin::list(origins))
    }
}

/// Build the HTTP application. Every route is served both at the root and
/// under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(cors_layer(&state.config))
        .into_inner();

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status_endpoint))
        .route("/speakers", get(list_speakers))
        .route("/tts", post(tts_endpoint))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(api.clone())
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state)
}
