//! Upstream voice-synthesis session client.
//!
//! The backend speaks a session-oriented realtime protocol over
//! WebSocket: open session → `session.created` ack → send session
//! configuration (voice persona, output encoding, style instructions)
//! → send the text → request a response → receive base64 PCM16
//! `response.audio.delta` events → `response.done`.
//!
//! The whole session runs under one deadline.  A session that closes
//! before `response.done`, an `error` event, or a total payload under
//! [`MIN_AUDIO_BYTES`] are all failures; the caller falls back to
//! silent pacing and the upstream detail is only logged.

use async_trait::async_trait;
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

use super::audio::pcm16_to_wav;
use super::{Persona, SynthesizedAudio, Synthesizer, TtsError, TtsRequest, WordTiming};

/// Minimum plausible audio payload.  Anything smaller is certainly not
/// real speech.
pub const MIN_AUDIO_BYTES: usize = 500;

/// PCM sample rate of upstream audio deltas.
pub const UPSTREAM_SAMPLE_RATE: u32 = 24_000;

/// Default whole-session budget in seconds.
pub const DEFAULT_SESSION_BUDGET_SECS: u64 = 25;

/// Upstream connection settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// WebSocket endpoint of the realtime synthesis API.
    pub endpoint: String,
    /// Model identifier sent with the session configuration.
    pub model: String,
    /// API key.  `None` is a normal, handled condition: synthesis
    /// fails over to the caller's silent-pacing path.
    pub api_key: Option<String>,
    pub session_budget_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "wss://api.voicegate.ai/v1/realtime".to_string(),
            model: "realtime-tts-1".to_string(),
            api_key: None,
            session_budget_secs: DEFAULT_SESSION_BUDGET_SECS,
        }
    }
}

/// Events received from the upstream session.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Session is open and ready for configuration.
    #[serde(rename = "session.created")]
    SessionCreated {},

    /// One chunk of base64-encoded PCM16 audio.
    #[serde(rename = "response.audio.delta")]
    AudioDelta { delta: String },

    /// Per-word timings for the response, when the backend computes them.
    #[serde(rename = "response.word_timings")]
    WordTimings { timings: Vec<WordTiming> },

    /// Response complete.  Terminates a successful session.
    #[serde(rename = "response.done")]
    ResponseDone {},

    /// Upstream error.  Terminates the session as a failure.
    #[serde(rename = "error")]
    Error { error: SessionError },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionError {
    pub message: String,
}

/// Real synthesizer talking the upstream session protocol.
pub struct UpstreamSynthesizer {
    config: UpstreamConfig,
}

impl UpstreamSynthesizer {
    pub fn new(config: UpstreamConfig) -> Self {
        Self { config }
    }

    pub fn api_key_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// HTTPS base derived from the WebSocket endpoint, for the
    /// lightweight reachability probe on the status endpoint.
    pub fn probe_url(&self) -> String {
        match Url::parse(&self.config.endpoint) {
            Ok(mut url) => {
                let scheme = match url.scheme() {
                    "wss" => "https",
                    "ws" => "http",
                    other => other,
                }
                .to_string();
                let _ = url.set_scheme(&scheme);
                url.to_string()
            }
            Err(_) => self.config.endpoint.clone(),
        }
    }

    async fn run_session(&self, request: &TtsRequest) -> Result<SynthesizedAudio, TtsError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TtsError::Transient("upstream API key not configured".into()))?;

        let mut ws_request = self
            .config
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| TtsError::Transient(format!("invalid upstream endpoint: {}", e)))?;
        ws_request.headers_mut().insert(
            "Authorization",
            format!("Bearer {}", api_key)
                .parse()
                .map_err(|_| TtsError::Transient("malformed API key".into()))?,
        );

        let (stream, _) = connect_async(ws_request)
            .await
            .map_err(|e| TtsError::Transient(format!("upstream session open failed: {}", e)))?;
        let (mut write, mut read) = stream.split();

        // Wait for the session-ready acknowledgment before configuring.
        loop {
            match next_event(&mut read).await? {
                SessionEvent::SessionCreated {} => break,
                SessionEvent::Error { error } => {
                    return Err(TtsError::Transient(format!(
                        "upstream rejected session: {}",
                        error.message
                    )));
                }
                other => {
                    debug!(?other, "ignoring pre-session event");
                }
            }
        }

        let persona = Persona::detect(&request.voice_description);
        let configure = json!({
            "type": "session.update",
            "session": {
                "model": self.config.model,
                "voice": persona.upstream_voice(),
                "output_audio_format": "pcm16",
                "instructions": format!(
                    "Read the text aloud in {} as a slow, reverent prayer. \
                     Voice style: {}.",
                    request.language, request.voice_description
                ),
            },
        });
        let item = json!({
            "type": "conversation.item.create",
            "item": {
                "type": "message",
                "role": "user",
                "content": [{ "type": "input_text", "text": request.text }],
            },
        });
        let respond = json!({ "type": "response.create" });

        for msg in [configure, item, respond] {
            write
                .send(Message::Text(msg.to_string()))
                .await
                .map_err(|e| TtsError::Transient(format!("upstream send failed: {}", e)))?;
        }

        let mut pcm: Vec<u8> = Vec::new();
        let mut word_timings: Option<Vec<WordTiming>> = None;

        loop {
            match next_event(&mut read).await? {
                SessionEvent::AudioDelta { delta } => {
                    let bytes = base64::engine::general_purpose::STANDARD
                        .decode(&delta)
                        .map_err(|e| {
                            TtsError::Transient(format!("undecodable audio delta: {}", e))
                        })?;
                    pcm.extend_from_slice(&bytes);
                }
                SessionEvent::WordTimings { timings } => {
                    word_timings = Some(timings);
                }
                SessionEvent::ResponseDone {} => break,
                SessionEvent::Error { error } => {
                    return Err(TtsError::Transient(format!(
                        "upstream error event: {}",
                        error.message
                    )));
                }
                SessionEvent::SessionCreated {} => {}
            }
        }

        let _ = write.send(Message::Close(None)).await;

        if pcm.len() < MIN_AUDIO_BYTES {
            return Err(TtsError::Transient(format!(
                "upstream returned {} bytes of audio, below the {} byte floor",
                pcm.len(),
                MIN_AUDIO_BYTES
            )));
        }

        let wav = pcm16_to_wav(&pcm, UPSTREAM_SAMPLE_RATE)?;
        debug!(
            pcm_bytes = pcm.len(),
            wav_bytes = wav.len(),
            has_timings = word_timings.is_some(),
            "upstream session complete"
        );

        Ok(SynthesizedAudio { wav, word_timings })
    }
}

/// Read the next session event, treating stream end before
/// `response.done` and non-JSON frames as failures.
async fn next_event<S>(read: &mut S) -> Result<SessionEvent, TtsError>
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = read
            .next()
            .await
            .ok_or_else(|| TtsError::Transient("session closed before completion".into()))?
            .map_err(|e| TtsError::Transient(format!("upstream read failed: {}", e)))?;

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).map_err(|e| {
                    warn!(error = %e, "unparseable upstream event");
                    TtsError::Transient(format!("unparseable upstream event: {}", e))
                });
            }
            Message::Close(_) => {
                return Err(TtsError::Transient("session closed before completion".into()));
            }
            // Pings are handled by tungstenite; skip other frame types.
            _ => continue,
        }
    }
}

#[async_trait]
impl Synthesizer for UpstreamSynthesizer {
    async fn synthesize(&self, request: &TtsRequest) -> Result<SynthesizedAudio, TtsError> {
        let budget = Duration::from_secs(self.config.session_budget_secs);
        match timeout(budget, self.run_session(request)).await {
            Ok(result) => result,
            Err(_) => Err(TtsError::Transient(format!(
                "session budget of {}s exceeded",
                self.config.session_budget_secs
            ))),
        }
    }

    fn name(&self) -> &str {
        "upstream-realtime"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_deserialize_session_created() {
        let event: SessionEvent = serde_json::from_str(r#"{"type":"session.created"}"#).unwrap();
        assert!(matches!(event, SessionEvent::SessionCreated {}));
    }

    #[test]
    fn event_deserialize_audio_delta() {
        let json = r#"{"type":"response.audio.delta","delta":"AAAA"}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        match event {
            SessionEvent::AudioDelta { delta } => assert_eq!(delta, "AAAA"),
            _ => panic!("expected AudioDelta"),
        }
    }

    #[test]
    fn event_deserialize_word_timings() {
        let json = r#"{"type":"response.word_timings","timings":[{"word":"Amen","start_ms":0.0,"end_ms":400.0}]}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        match event {
            SessionEvent::WordTimings { timings } => {
                assert_eq!(timings.len(), 1);
                assert_eq!(timings[0].word, "Amen");
            }
            _ => panic!("expected WordTimings"),
        }
    }

    #[test]
    fn event_deserialize_error() {
        let json = r#"{"type":"error","error":{"message":"quota exceeded"}}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        match event {
            SessionEvent::Error { error } => assert_eq!(error.message, "quota exceeded"),
            _ => panic!("expected Error"),
        }
    }

    #[test]
    fn event_unknown_type_is_err() {
        assert!(serde_json::from_str::<SessionEvent>(r#"{"type":"mystery.event"}"#).is_err());
    }

    #[test]
    fn missing_key_is_transient_not_crash() {
        let synth = UpstreamSynthesizer::new(UpstreamConfig::default());
        assert!(!synth.api_key_configured());

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let request = TtsRequest {
            text: "Amen.".into(),
            language: "English".into(),
            language_code: "en-US".into(),
            voice_description: "calm".into(),
            prayer_key: String::new(),
        };
        let err = rt.block_on(synth.synthesize(&request)).unwrap_err();
        assert!(matches!(err, TtsError::Transient(_)));
    }

    #[test]
    fn empty_key_counts_as_unconfigured() {
        let synth = UpstreamSynthesizer::new(UpstreamConfig {
            api_key: Some(String::new()),
            ..Default::default()
        });
        assert!(!synth.api_key_configured());
    }

    #[test]
    fn probe_url_swaps_scheme() {
        let synth = UpstreamSynthesizer::new(UpstreamConfig::default());
        assert!(synth.probe_url().starts_with("https://"));

        let plain = UpstreamSynthesizer::new(UpstreamConfig {
            endpoint: "ws://localhost:9000/v1/realtime".into(),
            ..Default::default()
        });
        assert_eq!(plain.probe_url(), "http://localhost:9000/v1/realtime");
    }
}
