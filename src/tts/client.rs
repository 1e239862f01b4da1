//! Cache → proxy → retry → fallback orchestration.
//!
//! [`TtsClient::generate_audio`] is the single behavioral guarantee of
//! the pipeline: it always resolves, in bounded time, to either real
//! audio or a silent-paced fallback estimate.  Nothing on this path
//! propagates an error to the caller.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::audio::wav_duration_ms;
use super::cache::AudioCache;
use super::fingerprint::fingerprint;
use super::{word_count, TtsError, TtsRequest, WordTiming};

/// Retry and sizing policy for the client side of the pipeline.
#[derive(Debug, Clone)]
pub struct TtsClientConfig {
    /// Full URL of the edge proxy synthesis endpoint.
    pub proxy_url: String,
    /// Total attempts per request, first try included.
    pub max_attempts: u32,
    /// Backoff before retry `n` is `n * backoff_step_ms`.
    pub backoff_step_ms: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
    /// Payloads under this size are certainly not real audio.
    pub min_audio_bytes: usize,
    /// Assumed speaking rate for the silent-paced fallback estimate.
    pub fallback_words_per_sec: f64,
}

impl Default for TtsClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: "http://127.0.0.1:8787/api/tts".to_string(),
            max_attempts: 3,
            backoff_step_ms: 1500,
            request_timeout_secs: 30,
            min_audio_bytes: 500,
            fallback_words_per_sec: 2.0,
        }
    }
}

/// Outcome of [`TtsClient::generate_audio`].  Either real audio
/// (`wav: Some`, `used_fallback: false`) or a fallback estimate
/// (`wav: None`, `used_fallback: true`); `duration_ms` is valid in
/// both cases and drives word pacing.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub wav: Option<Vec<u8>>,
    pub word_timings: Option<Vec<WordTiming>>,
    pub used_fallback: bool,
    pub duration_ms: f64,
}

/// Client side of the TTS pipeline: local cache in front of the edge
/// proxy, bounded retry behind it, silent-paced fallback underneath.
pub struct TtsClient {
    http: reqwest::Client,
    cache: Mutex<AudioCache>,
    config: TtsClientConfig,
}

impl TtsClient {
    pub fn new(cache: AudioCache, config: TtsClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            cache: Mutex::new(cache),
            config,
        })
    }

    /// Resolve audio for one step.  Never fails and never hangs: all
    /// error paths converge on the fallback estimate.
    pub async fn generate_audio(&self, request: &TtsRequest) -> GeneratedAudio {
        let key = fingerprint(&request.text, &request.language_code, &request.voice_description);

        if let Some(hit) = self.cache_lookup(&key) {
            match wav_duration_ms(&hit.0) {
                Ok(duration_ms) => {
                    debug!(prayer_key = %request.prayer_key, "serving cached audio");
                    return GeneratedAudio {
                        wav: Some(hit.0),
                        word_timings: hit.1,
                        used_fallback: false,
                        duration_ms,
                    };
                }
                Err(e) => {
                    // Do not trust corrupt cache entries; refetch instead.
                    warn!(cache_key = %key, error = %e, "corrupt cache entry, treating as miss");
                }
            }
        }

        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                let backoff = Duration::from_millis(attempt as u64 * self.config.backoff_step_ms);
                debug!(attempt, ?backoff, "backing off before retry");
                sleep(backoff).await;
            }

            let (bytes, timings) = match self.fetch_once(request).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(attempt, error = %e, "proxy fetch failed");
                    continue;
                }
            };

            match wav_duration_ms(&bytes) {
                Ok(duration_ms) => {
                    self.cache_store(&key, request, &bytes, duration_ms, timings.as_deref());
                    return GeneratedAudio {
                        wav: Some(bytes),
                        word_timings: timings,
                        used_fallback: false,
                        duration_ms,
                    };
                }
                Err(e) => {
                    // A malformed container from a "successful" fetch is
                    // unrecoverable for this call; retrying will not fix it.
                    warn!(attempt, error = %e, "fetched audio failed to decode");
                    break;
                }
            }
        }

        self.fallback(request)
    }

    /// Explicit cache maintenance, surfaced on the CLI.
    pub fn cache_stats(&self) -> Result<(u64, u64)> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        Ok((cache.entry_count()?, cache.total_size_bytes()?))
    }

    pub fn clear_cache(&self) -> Result<()> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        cache.clear()
    }

    fn cache_lookup(&self, key: &str) -> Option<(Vec<u8>, Option<Vec<WordTiming>>)> {
        let cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(_) => {
                warn!("cache lock poisoned, treating as miss");
                return None;
            }
        };
        match cache.lookup(key) {
            Ok(Some(entry)) => Some((entry.audio_data, entry.word_timings)),
            Ok(None) => None,
            Err(e) => {
                // Cache I/O errors are logged, never surfaced.
                warn!(error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn cache_store(
        &self,
        key: &str,
        request: &TtsRequest,
        bytes: &[u8],
        duration_ms: f64,
        timings: Option<&[WordTiming]>,
    ) {
        let cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(_) => {
                warn!("cache lock poisoned, skipping write");
                return;
            }
        };
        if let Err(e) = cache.insert(
            key,
            &request.text,
            &request.language_code,
            &request.voice_description,
            bytes,
            duration_ms as i64,
            timings,
        ) {
            // Best effort: a failed write must not fail the request.
            warn!(error = %e, "cache write failed");
        }
    }

    /// One proxy round trip.  Classifies every suspicious response as
    /// transient so the retry loop can decide what to do with it.
    async fn fetch_once(
        &self,
        request: &TtsRequest,
    ) -> Result<(Vec<u8>, Option<Vec<WordTiming>>), TtsError> {
        let response = self
            .http
            .post(&self.config.proxy_url)
            .json(request)
            .send()
            .await
            .map_err(|e| TtsError::Transient(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtsError::Transient(format!("proxy returned {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if content_type.contains("application/json") {
            // A JSON body on a 2xx is an error payload, not audio.
            return Err(TtsError::Transient("proxy returned a JSON error payload".into()));
        }

        let timings = response
            .headers()
            .get("x-word-timings")
            .and_then(|v| v.to_str().ok())
            .and_then(|json| serde_json::from_str(json).ok());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Transient(format!("failed to read body: {}", e)))?
            .to_vec();

        if bytes.len() < self.config.min_audio_bytes {
            return Err(TtsError::Transient(format!(
                "payload of {} bytes is below the {} byte floor",
                bytes.len(),
                self.config.min_audio_bytes
            )));
        }

        Ok((bytes, timings))
    }

    fn fallback(&self, request: &TtsRequest) -> GeneratedAudio {
        let words = word_count(&request.text).max(1);
        let duration_ms = words as f64 / self.config.fallback_words_per_sec * 1000.0;
        warn!(
            prayer_key = %request.prayer_key,
            words,
            duration_ms,
            "audio unavailable, using silent-paced fallback"
        );
        GeneratedAudio {
            wav: None,
            word_timings: None,
            used_fallback: true,
            duration_ms,
        }
    }
}
