//! Text-to-speech pipeline: fingerprinting, audio cache, upstream
//! session client, and the cache → proxy → retry → fallback
//! orchestration used by the recitation loop.

pub mod audio;
pub mod cache;
pub mod client;
pub mod fingerprint;
pub mod mock;
pub mod persona;
pub mod upstream;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{AudioCache, AudioCacheEntry};
pub use client::{GeneratedAudio, TtsClient, TtsClientConfig};
pub use fingerprint::fingerprint;
pub use persona::Persona;

/// One synthesis request.  Constructed fresh per step; not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    /// Human-readable language name ("English", "Español").
    pub language: String,
    /// BCP-47 language code ("en-US", "es-ES").
    pub language_code: String,
    /// Free-text voice description ("a calm female voice").
    pub voice_description: String,
    /// Identifies which step this is, for logging.
    #[serde(default)]
    pub prayer_key: String,
}

/// Timing of one spoken word within a synthesized clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// Output of a successful synthesis: a WAV container plus optional
/// per-word timings when the upstream supplied them.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub wav: Vec<u8>,
    pub word_timings: Option<Vec<WordTiming>>,
}

/// Error taxonomy for the synthesis pipeline.
///
/// `Validation` is never retried; `Transient` feeds the retry loop and
/// is demoted to fallback on exhaustion; `Decode` and `CacheIo` never
/// fail a user-facing request.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("transient upstream failure: {0}")]
    Transient(String),

    #[error("audio decode failure: {0}")]
    Decode(String),

    #[error("cache I/O failure: {0}")]
    CacheIo(#[from] anyhow::Error),
}

/// The synthesis seam between the edge proxy and the upstream voice
/// backend.  Implemented by [`upstream::UpstreamSynthesizer`] for real
/// synthesis and [`mock::MockSynthesizer`] in tests.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text into a self-describing audio container.
    async fn synthesize(&self, request: &TtsRequest) -> Result<SynthesizedAudio, TtsError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Split text on whitespace the same way the playback scheduler does.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("Hail Mary,  full of\n grace"), 5);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn request_round_trips_through_json() {
        let req = TtsRequest {
            text: "Amen.".into(),
            language: "English".into(),
            language_code: "en-US".into(),
            voice_description: "a gentle voice".into(),
            prayer_key: "glory-be".into(),
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: TtsRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text, "Amen.");
        assert_eq!(back.prayer_key, "glory-be");
    }

    #[test]
    fn request_prayer_key_defaults_empty() {
        let json = r#"{"text":"t","language":"English","language_code":"en","voice_description":"v"}"#;
        let req: TtsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.prayer_key, "");
    }

    #[test]
    fn word_timing_serde() {
        let t = WordTiming {
            word: "Hail".into(),
            start_ms: 0.0,
            end_ms: 320.0,
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: WordTiming = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
