//! Mock synthesizer for testing.
//!
//! Generates silent WAV audio with deterministic duration derived from
//! word count, and can be scripted to fail a fixed number of times
//! before succeeding.  Lets the pipeline, proxy, and playback tests run
//! without an upstream voice backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::audio::pcm16_to_wav;
use super::upstream::UPSTREAM_SAMPLE_RATE;
use super::{word_count, SynthesizedAudio, Synthesizer, TtsError, TtsRequest, WordTiming};

/// Configuration for [`MockSynthesizer`].
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Simulated speaking duration per word.
    pub ms_per_word: f64,
    /// Fail this many calls with a transient error before succeeding.
    pub failures_before_success: usize,
    /// Attach per-word timings to successful results.
    pub with_timings: bool,
    /// Simulated synthesis latency.
    pub latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            ms_per_word: 400.0,
            failures_before_success: 0,
            with_timings: false,
            latency_ms: 0,
        }
    }
}

/// Deterministic silent synthesizer with a scriptable failure count.
pub struct MockSynthesizer {
    config: MockConfig,
    calls: AtomicUsize,
}

impl MockSynthesizer {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// A mock that always succeeds.
    pub fn reliable() -> Self {
        Self::new(MockConfig::default())
    }

    /// A mock that fails `n` times, then succeeds.
    pub fn failing(n: usize) -> Self {
        Self::new(MockConfig {
            failures_before_success: n,
            ..Default::default()
        })
    }

    /// A mock that succeeds and reports per-word timings.
    pub fn with_timings() -> Self {
        Self::new(MockConfig {
            with_timings: true,
            ..Default::default()
        })
    }

    /// Total number of synthesize calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, request: &TtsRequest) -> Result<SynthesizedAudio, TtsError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if self.config.latency_ms > 0 {
            sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if call < self.config.failures_before_success {
            return Err(TtsError::Transient(format!(
                "scripted failure {} of {}",
                call + 1,
                self.config.failures_before_success
            )));
        }

        let words: Vec<&str> = request.text.split_whitespace().collect();
        let duration_ms = (word_count(&request.text) as f64).max(1.0) * self.config.ms_per_word;
        let sample_count = (UPSTREAM_SAMPLE_RATE as f64 * duration_ms / 1000.0) as usize;
        let pcm = vec![0u8; sample_count * 2];
        let wav = pcm16_to_wav(&pcm, UPSTREAM_SAMPLE_RATE)?;

        let word_timings = self.config.with_timings.then(|| {
            words
                .iter()
                .enumerate()
                .map(|(i, w)| WordTiming {
                    word: (*w).to_string(),
                    start_ms: i as f64 * self.config.ms_per_word,
                    end_ms: (i + 1) as f64 * self.config.ms_per_word,
                })
                .collect()
        });

        Ok(SynthesizedAudio { wav, word_timings })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
