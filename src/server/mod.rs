//! HTTP surface: a single streaming chat endpoint plus a liveness probe.


use anyhow::Context;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::RagError;
use crate::chat::parse_messages;
use crate::config::Config;
use crate::pipeline::{ConfiguredProviders, ProviderFactory};

const MAX_BODY_SIZE_1MB: usize = 1024 * 1024;
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    providers: Arc<dyn ProviderFactory>,
}

/// Pipeline failure converted into a response exactly once, at the top
#[derive(Debug)]
pub struct ApiError(RagError);

impl From<RagError> for ApiError {
    #[inline]
    fn from(error: RagError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!("Rejected request: {}", self.0);
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            self.0.to_string(),
        )
            .into_response()
    }
}

#[inline]
pub fn router(providers: Arc<dyn ProviderFactory>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(AppState { providers })
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE_1MB))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

/// Answer the conversation in the body, streaming the model's text as it arrives
async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    async move {
        let messages = parse_messages(&body)?;
        info!("Answering conversation of {} messages", messages.len());

        let pipeline = state.providers.pipeline()?;
        let relay = pipeline.answer(&messages).await?;

        Ok::<_, ApiError>(
            (
                [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
                Body::from_stream(relay),
            )
                .into_response(),
        )
    }
    .instrument(span)
    .await
}

/// Bind the configured address and serve until interrupted
#[inline]
pub async fn serve(config: Arc<Config>) -> anyhow::Result<()> {
    let addr = config
        .server
        .listen_addr()
        .context("Invalid listen address")?;

    let app = router(Arc::new(ConfiguredProviders::new(config)));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
