//! Word-paced playback control.
//!
//! Drives per-word callbacks for one recitation step, whether real
//! audio was synthesized or the silent fallback estimate is in effect.
//! Word offsets come from explicit upstream timings when available,
//! otherwise words are spread evenly across the step duration.
//!
//! Pause and resume preserve position; stop cancels every pending word
//! callback before returning, leaving the controller ready for a fresh
//! [`PlaybackController::play_step`].

use tokio::sync::watch;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use crate::tts::{GeneratedAudio, WordTiming};

/// Playback signal shared between the controller handle and the active
/// `play_step` future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Running,
    Paused,
    Stopped,
}

/// How a `play_step` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The step played through its full duration.
    Completed,
    /// `stop()` cancelled playback.
    Stopped,
}

enum Flow {
    Continue,
    Stop,
}

/// Compute word-start offsets (ms) for a step.
///
/// Explicit timings are used only when they cover every word; a
/// mismatched timing array degrades to even spacing rather than
/// desynchronizing the highlight. The first offset is always at or
/// near t=0, spacing `duration / word_count` in the even case.
pub fn word_schedule(
    word_count: usize,
    duration_ms: f64,
    timings: Option<&[WordTiming]>,
) -> Vec<f64> {
    if word_count == 0 {
        return Vec::new();
    }
    if let Some(timings) = timings {
        if timings.len() == word_count {
            return timings.iter().map(|t| t.start_ms.max(0.0)).collect();
        }
        debug!(
            timings = timings.len(),
            word_count, "timing array does not cover text, using even spacing"
        );
    }
    let step = duration_ms / word_count as f64;
    (0..word_count).map(|i| i as f64 * step).collect()
}

/// Handle controlling the currently playing step.  Cheap to clone;
/// clones share the same signal.
#[derive(Clone)]
pub struct PlaybackController {
    signal: watch::Sender<Signal>,
}

impl PlaybackController {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(Signal::Running);
        Self { signal }
    }

    /// Suspend word delivery without losing position.
    pub fn pause(&self) {
        self.signal.send_if_modified(|s| {
            if *s == Signal::Running {
                *s = Signal::Paused;
                true
            } else {
                false
            }
        });
    }

    /// Resume a paused step.
    pub fn resume(&self) {
        self.signal.send_if_modified(|s| {
            if *s == Signal::Paused {
                *s = Signal::Running;
                true
            } else {
                false
            }
        });
    }

    /// Cancel the active step.  Once the in-flight `play_step` future
    /// returns, no further word callbacks fire.
    pub fn stop(&self) {
        self.signal.send_replace(Signal::Stopped);
    }

    /// Play one step, invoking `on_word(i)` as each word becomes
    /// current.  Resolves when the full duration has elapsed or on
    /// `stop()`.  The fallback mode runs identically, just without
    /// audio bytes behind it.
    pub async fn play_step(
        &self,
        text: &str,
        audio: &GeneratedAudio,
        mut on_word: impl FnMut(usize) + Send,
    ) -> PlayOutcome {
        // Fresh run: clear any stop left over from the previous step.
        self.signal.send_replace(Signal::Running);
        let mut rx = self.signal.subscribe();

        let words = text.split_whitespace().count();
        let schedule = word_schedule(words, audio.duration_ms, audio.word_timings.as_deref());

        debug!(
            words,
            duration_ms = audio.duration_ms,
            fallback = audio.used_fallback,
            "playing step"
        );

        let mut elapsed_ms = 0.0;
        for (i, target) in schedule.iter().enumerate() {
            match wait_until(&mut rx, &mut elapsed_ms, *target).await {
                Flow::Continue => on_word(i),
                Flow::Stop => return PlayOutcome::Stopped,
            }
        }

        // Let the final word's duration play out before completing.
        match wait_until(&mut rx, &mut elapsed_ms, audio.duration_ms).await {
            Flow::Continue => PlayOutcome::Completed,
            Flow::Stop => PlayOutcome::Stopped,
        }
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until `target_ms` of running time has elapsed, suspending
/// while paused.  Only time spent in `Running` counts toward position.
async fn wait_until(
    rx: &mut watch::Receiver<Signal>,
    elapsed_ms: &mut f64,
    target_ms: f64,
) -> Flow {
    loop {
        let signal = *rx.borrow();
        match signal {
            Signal::Stopped => return Flow::Stop,
            Signal::Paused => {
                if rx.changed().await.is_err() {
                    return Flow::Stop;
                }
            }
            Signal::Running => {
                let remaining = target_ms - *elapsed_ms;
                if remaining <= 0.0 {
                    return Flow::Continue;
                }
                let started = Instant::now();
                tokio::select! {
                    _ = sleep(Duration::from_secs_f64(remaining / 1000.0)) => {
                        *elapsed_ms = target_ms;
                        return Flow::Continue;
                    }
                    changed = rx.changed() => {
                        *elapsed_ms += started.elapsed().as_secs_f64() * 1000.0;
                        if changed.is_err() {
                            return Flow::Stop;
                        }
                    }
                }
            }
        }
    }
}
