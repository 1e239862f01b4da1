//! Proxy request handlers.

use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::tts::fingerprint;
use crate::tts::upstream::MIN_AUDIO_BYTES;
use crate::tts::{TtsRequest, WordTiming};

use super::AppState;

/// Maximum accepted text length in characters.
pub const MAX_TEXT_CHARS: usize = 8000;

/// Timeout for the status endpoint's connectivity probe.
const PROBE_TIMEOUT_SECS: u64 = 5;

/// JSON body returned on every non-audio outcome.  The `fallback`
/// field tells the client to switch to silent local pacing.
#[derive(Debug, Serialize)]
struct TtsErrorBody {
    error: String,
    fallback: &'static str,
    language: String,
    text_length: usize,
}

fn error_response(status: StatusCode, error: &str, language: &str, text_length: usize) -> Response {
    (
        status,
        Json(TtsErrorBody {
            error: error.to_string(),
            fallback: "use-local-pacing",
            language: language.to_string(),
            text_length,
        }),
    )
        .into_response()
}

fn audio_response(
    wav: Vec<u8>,
    timings: Option<&[WordTiming]>,
    provider: &'static str,
    language: &str,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert("x-tts-provider", HeaderValue::from_static(provider));
    if let Ok(value) = HeaderValue::from_str(language) {
        headers.insert("x-tts-language", value);
    }
    if let Some(timings) = timings {
        // Timings ride in a header so the body stays a plain container.
        // Non-ASCII words cannot be a header value; omit rather than fail.
        if let Ok(json) = serde_json::to_string(timings) {
            if let Ok(value) = HeaderValue::from_str(&json) {
                headers.insert("x-word-timings", value);
            }
        }
    }
    (StatusCode::OK, headers, wav).into_response()
}

/// `POST /api/tts` — one call, one synthesis job.
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Response {
    let text_length = request.text.chars().count();

    // Input validation errors are client errors, never retried upstream.
    if request.text.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "text must not be empty",
            &request.language,
            text_length,
        );
    }
    if text_length > MAX_TEXT_CHARS {
        return error_response(
            StatusCode::BAD_REQUEST,
            "text exceeds maximum length",
            &request.language,
            text_length,
        );
    }

    let key = fingerprint(
        &request.text,
        &request.language_code,
        &request.voice_description,
    );

    let cached = state
        .cache
        .lock()
        .ok()
        .and_then(|cache| match cache.lookup(&key) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "proxy cache lookup failed");
                None
            }
        });
    if let Some(entry) = cached {
        return audio_response(
            entry.audio_data,
            entry.word_timings.as_deref(),
            "cache",
            &request.language,
        );
    }

    let synthesized = match state.synthesizer.synthesize(&request).await {
        Ok(audio) => audio,
        Err(e) => {
            // Log the upstream detail; the client only learns to fall back.
            error!(error = %e, text_length, "synthesis failed");
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "synthesis unavailable",
                &request.language,
                text_length,
            );
        }
    };

    if synthesized.wav.len() < MIN_AUDIO_BYTES {
        error!(
            bytes = synthesized.wav.len(),
            "synthesizer returned implausibly small audio"
        );
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "synthesis unavailable",
            &request.language,
            text_length,
        );
    }

    // Persist off the response path; a failed write only logs.
    {
        let state = state.clone();
        let request = request.clone();
        let key = key.clone();
        let wav = synthesized.wav.clone();
        let timings = synthesized.word_timings.clone();
        tokio::spawn(async move {
            let duration_ms = crate::tts::audio::wav_duration_ms(&wav).unwrap_or(0.0);
            let result = state.cache.lock().ok().map(|cache| {
                cache.insert(
                    &key,
                    &request.text,
                    &request.language_code,
                    &request.voice_description,
                    &wav,
                    duration_ms as i64,
                    timings.as_deref(),
                )
            });
            match result {
                Some(Ok(())) => {}
                Some(Err(e)) => warn!(error = %e, "proxy cache write failed"),
                None => warn!("proxy cache lock poisoned, write skipped"),
            }
        });
    }

    info!(
        text_length,
        bytes = synthesized.wav.len(),
        backend = state.synthesizer.name(),
        "synthesized audio"
    );
    audio_response(
        synthesized.wav,
        synthesized.word_timings.as_deref(),
        "synthesized",
        &request.language,
    )
}

/// `OPTIONS /api/tts` — CORS preflight.  Headers come from the CORS layer.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `GET /api/tts-status` — credential check plus a lightweight
/// connectivity probe.
pub async fn status(State(state): State<AppState>) -> Response {
    let upstream_reachable = match (&state.probe_url, state.api_key_configured) {
        (Some(url), true) => probe(url).await,
        _ => false,
    };
    let healthy = state.api_key_configured && upstream_reachable;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "api_key_configured": state.api_key_configured,
            "upstream_reachable": upstream_reachable,
        })),
    )
        .into_response()
}

/// Any HTTP response, including 4xx, proves the upstream is reachable.
async fn probe(url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };
    client.get(url).send().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{router, AppState};
    use crate::tts::cache::AudioCache;
    use crate::tts::mock::MockSynthesizer;
    use crate::tts::Synthesizer;
    use std::sync::Arc;

    async fn spawn(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn state_with(synthesizer: Arc<dyn Synthesizer>) -> AppState {
        AppState::new(AudioCache::in_memory().unwrap(), synthesizer, true, None)
    }

    fn body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "text": text,
            "language": "English",
            "language_code": "en-US",
            "voice_description": "a calm female voice",
        })
    }

    #[tokio::test]
    async fn synthesizes_then_serves_from_cache() {
        let base = spawn(state_with(Arc::new(MockSynthesizer::reliable()))).await;
        let client = reqwest::Client::new();

        let first = client
            .post(format!("{}/api/tts", base))
            .json(&body("Hail Mary full of grace"))
            .send()
            .await
            .unwrap();
        assert_eq!(first.status(), 200);
        assert_eq!(first.headers()["content-type"], "audio/wav");
        assert_eq!(first.headers()["x-tts-provider"], "synthesized");
        assert_eq!(first.headers()["x-tts-language"], "English");
        let first_bytes = first.bytes().await.unwrap();
        assert!(first_bytes.len() > 500);

        // The cache write is off the response path; poll briefly.
        let mut provider = String::new();
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            let again = client
                .post(format!("{}/api/tts", base))
                .json(&body("Hail Mary full of grace"))
                .send()
                .await
                .unwrap();
            provider = again.headers()["x-tts-provider"]
                .to_str()
                .unwrap()
                .to_string();
            if provider == "cache" {
                assert_eq!(again.bytes().await.unwrap(), first_bytes);
                break;
            }
        }
        assert_eq!(provider, "cache");
    }

    #[tokio::test]
    async fn empty_text_is_a_client_error() {
        let base = spawn(state_with(Arc::new(MockSynthesizer::reliable()))).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/tts", base))
            .json(&body("   "))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["fallback"], "use-local-pacing");
        assert_eq!(json["language"], "English");
    }

    #[tokio::test]
    async fn oversized_text_is_a_client_error() {
        let base = spawn(state_with(Arc::new(MockSynthesizer::reliable()))).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/tts", base))
            .json(&body(&"ora ".repeat(2001)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["text_length"], 8004);
    }

    #[tokio::test]
    async fn upstream_failure_instructs_fallback() {
        let base = spawn(state_with(Arc::new(MockSynthesizer::failing(usize::MAX)))).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/tts", base))
            .json(&body("Our Father"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["fallback"], "use-local-pacing");
        // Upstream detail stays server-side.
        assert_eq!(json["error"], "synthesis unavailable");
    }

    #[tokio::test]
    async fn preflight_returns_204() {
        let base = spawn(state_with(Arc::new(MockSynthesizer::reliable()))).await;
        let resp = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("{}/api/tts", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    #[tokio::test]
    async fn word_timings_ride_a_header() {
        let base = spawn(state_with(Arc::new(MockSynthesizer::with_timings()))).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/tts", base))
            .json(&body("Glory be"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let timings: Vec<WordTiming> =
            serde_json::from_str(resp.headers()["x-word-timings"].to_str().unwrap()).unwrap();
        assert_eq!(timings.len(), 2);
        assert_eq!(timings[0].word, "Glory");
    }

    #[tokio::test]
    async fn status_unconfigured_is_unhealthy() {
        let state = AppState::new(
            AudioCache::in_memory().unwrap(),
            Arc::new(MockSynthesizer::reliable()),
            false,
            None,
        );
        let base = spawn(state).await;
        let resp = reqwest::get(format!("{}/api/tts-status", base)).await.unwrap();
        assert_eq!(resp.status(), 503);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["api_key_configured"], false);
    }

    #[tokio::test]
    async fn status_with_reachable_upstream_is_healthy() {
        // Use a second instance of the proxy itself as the probe target.
        let target = spawn(state_with(Arc::new(MockSynthesizer::reliable()))).await;
        let state = AppState::new(
            AudioCache::in_memory().unwrap(),
            Arc::new(MockSynthesizer::reliable()),
            true,
            Some(format!("{}/api/tts-status", target)),
        );
        let base = spawn(state).await;

        let resp = reqwest::get(format!("{}/api/tts-status", base)).await.unwrap();
        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["upstream_reachable"], true);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let base = spawn(state_with(Arc::new(MockSynthesizer::reliable()))).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/tts", base))
            .header("content-type", "application/json")
            .body("{\"not\": \"a request\"}")
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }
}
