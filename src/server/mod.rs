//! Edge TTS proxy.
//!
//! Network-facing mediator between recitation clients and the upstream
//! voice backend: validates requests, serves the shared audio cache,
//! runs upstream sessions on misses, and always answers with either
//! binary audio or a JSON instruction to use local silent pacing.
//! Upstream failure detail is logged server-side, never surfaced.

pub mod routes;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::tts::cache::AudioCache;
use crate::tts::Synthesizer;

/// Shared state behind the proxy handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<Mutex<AudioCache>>,
    pub synthesizer: Arc<dyn Synthesizer>,
    /// Whether upstream credentials are present.  Their absence is a
    /// normal, handled condition: synthesis degrades to fallback.
    pub api_key_configured: bool,
    /// HTTPS URL probed by the status endpoint, when known.
    pub probe_url: Option<String>,
}

impl AppState {
    pub fn new(
        cache: AudioCache,
        synthesizer: Arc<dyn Synthesizer>,
        api_key_configured: bool,
        probe_url: Option<String>,
    ) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            synthesizer,
            api_key_configured,
            probe_url,
        }
    }
}

/// Build the proxy router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/tts",
            post(routes::synthesize).options(routes::preflight),
        )
        .route("/api/tts-status", get(routes::status))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve the proxy until the task is cancelled.
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(addr = %listener.local_addr()?, "edge TTS proxy listening");
    axum::serve(listener, router(state))
        .await
        .context("proxy server failed")?;
    Ok(())
}
