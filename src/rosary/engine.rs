//! Rosary recitation state machine.
//!
//! The engine's true state is the 6-tuple (sequence, step index, word
//! index, engine state, language, voice description).  [`RosaryEngine::snapshot`]
//! is a pure projection of that tuple; everything displayable is derived
//! from it on demand.  Listeners are notified synchronously after every
//! mutating operation.

use serde::Serialize;

use super::mysteries::{mystery_set, MysteryKind};
use super::prayers::PrayerKind;
use super::sequence::{build_sequence, RosaryStep};

/// Playback lifecycle of the engine.  `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// Read-only projection of the engine state for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub step_index: usize,
    pub total_steps: usize,
    pub word_index: usize,
    pub prayer: PrayerKind,
    /// Prayer title, or the mystery name for an announcement step.
    pub title: String,
    /// Prayer text, or the meditation for an announcement step.
    pub text: String,
    pub bead: Option<usize>,
    pub decade: Option<usize>,
    pub mystery_kind: MysteryKind,
    pub mystery_name: Option<&'static str>,
    pub language: String,
    pub voice_description: String,
}

type Listener = Box<dyn Fn(&EngineSnapshot) + Send>;

/// Owns the step sequence and drives the recitation lifecycle.
pub struct RosaryEngine {
    kind: MysteryKind,
    sequence: Vec<RosaryStep>,
    step_index: usize,
    word_index: usize,
    state: EngineState,
    language: String,
    voice_description: String,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

const ORDINALS: [&str; 5] = ["First", "Second", "Third", "Fourth", "Fifth"];

impl RosaryEngine {
    pub fn new(kind: MysteryKind, language: &str, voice_description: &str) -> Self {
        Self {
            kind,
            sequence: build_sequence(kind),
            step_index: 0,
            word_index: 0,
            state: EngineState::Idle,
            language: language.to_string(),
            voice_description: voice_description.to_string(),
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// Reset to the first step and begin playing.
    pub fn start(&mut self) {
        self.step_index = 0;
        self.word_index = 0;
        self.state = EngineState::Playing;
        self.notify();
    }

    /// Suspend playback.  Ignored unless currently playing.
    pub fn pause(&mut self) {
        if self.state == EngineState::Playing {
            self.state = EngineState::Paused;
            self.notify();
        }
    }

    /// Resume playback.  Ignored unless currently paused.
    pub fn resume(&mut self) {
        if self.state == EngineState::Paused {
            self.state = EngineState::Playing;
            self.notify();
        }
    }

    /// Advance to the next step.
    ///
    /// Returns `true` if a step remains; `false` after transitioning to
    /// the terminal `Finished` state.  The playback loop uses this
    /// return value to decide whether to continue.
    pub fn next_step(&mut self) -> bool {
        if self.step_index + 1 < self.sequence.len() {
            self.step_index += 1;
            self.word_index = 0;
            self.notify();
            true
        } else {
            self.state = EngineState::Finished;
            self.notify();
            false
        }
    }

    /// Step back one step, clamped at 0.  Does not change engine state.
    pub fn prev_step(&mut self) {
        if self.step_index > 0 {
            self.step_index -= 1;
        }
        self.word_index = 0;
        self.notify();
    }

    /// Record the word currently being narrated (drives UI highlight).
    pub fn set_word_index(&mut self, index: usize) {
        self.word_index = index;
        self.notify();
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn current_step(&self) -> &RosaryStep {
        &self.sequence[self.step_index]
    }

    pub fn total_steps(&self) -> usize {
        self.sequence.len()
    }

    /// Derive the display snapshot for the current step.  Pure: no side
    /// effects, recomputable at any time from the engine state alone.
    pub fn snapshot(&self) -> EngineSnapshot {
        let step = &self.sequence[self.step_index];
        let set = mystery_set(self.kind);

        let (title, text, mystery_name) = match step.prayer {
            PrayerKind::MysteryAnnouncement => {
                let decade = step.decade.unwrap_or(0);
                let mystery = &set.mysteries[decade];
                let adjective = match self.kind {
                    MysteryKind::Joyful => "Joyful",
                    MysteryKind::Sorrowful => "Sorrowful",
                    MysteryKind::Glorious => "Glorious",
                    MysteryKind::Luminous => "Luminous",
                };
                let title = format!(
                    "The {} {} Mystery: {}",
                    ORDINALS[decade], adjective, mystery.name
                );
                (title, mystery.meditation.to_string(), Some(mystery.name))
            }
            prayer => {
                let mystery_name = step.decade.map(|d| set.mysteries[d].name);
                (
                    prayer.title().to_string(),
                    prayer.text().unwrap_or_default().to_string(),
                    mystery_name,
                )
            }
        };

        EngineSnapshot {
            state: self.state,
            step_index: self.step_index,
            total_steps: self.sequence.len(),
            word_index: self.word_index,
            prayer: step.prayer,
            title,
            text,
            bead: step.bead,
            decade: step.decade,
            mystery_kind: self.kind,
            mystery_name,
            language: self.language.clone(),
            voice_description: self.voice_description.clone(),
        }
    }

    /// Register a listener.  Returns an id accepted by [`unsubscribe`].
    ///
    /// [`unsubscribe`]: RosaryEngine::unsubscribe
    pub fn subscribe(&mut self, listener: impl Fn(&EngineSnapshot) + Send + 'static) -> u64 {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener by id.  Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: u64) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        for (_, listener) in &self.listeners {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rosary::sequence::SEQUENCE_LEN;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn engine() -> RosaryEngine {
        RosaryEngine::new(MysteryKind::Joyful, "English", "a calm female voice")
    }

    #[test]
    fn initial_state_is_idle() {
        let e = engine();
        assert_eq!(e.state(), EngineState::Idle);
        assert_eq!(e.step_index(), 0);
    }

    #[test]
    fn start_resets_and_plays() {
        let mut e = engine();
        e.start();
        e.next_step();
        e.next_step();
        e.set_word_index(7);

        e.start();
        let snap = e.snapshot();
        assert_eq!(snap.state, EngineState::Playing);
        assert_eq!(snap.step_index, 0);
        assert_eq!(snap.word_index, 0);
    }

    #[test]
    fn pause_resume_toggles() {
        let mut e = engine();
        e.start();
        e.pause();
        assert_eq!(e.state(), EngineState::Paused);
        e.resume();
        assert_eq!(e.state(), EngineState::Playing);
    }

    #[test]
    fn pause_from_idle_is_ignored() {
        let mut e = engine();
        e.pause();
        assert_eq!(e.state(), EngineState::Idle);
        e.resume();
        assert_eq!(e.state(), EngineState::Idle);
    }

    #[test]
    fn next_step_returns_false_once_then_stays_finished() {
        let mut e = engine();
        e.start();

        let mut advances = 0;
        while e.next_step() {
            advances += 1;
        }
        assert_eq!(advances, SEQUENCE_LEN - 1);
        assert_eq!(e.state(), EngineState::Finished);

        // Further calls keep returning false and never leave Finished.
        assert!(!e.next_step());
        assert!(!e.next_step());
        assert_eq!(e.state(), EngineState::Finished);
    }

    #[test]
    fn prev_step_clamps_at_zero() {
        let mut e = engine();
        e.start();
        e.prev_step();
        assert_eq!(e.step_index(), 0);

        e.next_step();
        e.next_step();
        e.set_word_index(3);
        e.prev_step();
        assert_eq!(e.step_index(), 1);
        assert_eq!(e.snapshot().word_index, 0);
    }

    #[test]
    fn prev_step_does_not_interrupt_finished() {
        let mut e = engine();
        e.start();
        while e.next_step() {}
        e.prev_step();
        assert_eq!(e.state(), EngineState::Finished);
        assert_eq!(e.step_index(), SEQUENCE_LEN - 2);
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut e = engine();
        e.start();
        e.next_step();
        e.set_word_index(4);
        assert_eq!(e.snapshot(), e.snapshot());
    }

    #[test]
    fn announcement_snapshot_resolves_meditation() {
        let mut e = engine();
        e.start();
        // Step 7 is the first mystery announcement (after 7 opening steps).
        while e.current_step().prayer != PrayerKind::MysteryAnnouncement {
            assert!(e.next_step());
        }
        let snap = e.snapshot();
        assert_eq!(snap.decade, Some(0));
        assert_eq!(snap.mystery_name, Some("The Annunciation"));
        assert!(snap.title.contains("First"));
        assert!(snap.title.contains("The Annunciation"));
        assert!(snap.text.contains("Gabriel"));
    }

    #[test]
    fn ordinary_snapshot_uses_prayer_text() {
        let mut e = engine();
        e.start();
        let snap = e.snapshot();
        assert_eq!(snap.prayer, PrayerKind::SignOfCross);
        assert_eq!(snap.title, "Sign of the Cross");
        assert!(snap.text.starts_with("In the name of the Father"));
        assert_eq!(snap.bead, Some(0));
    }

    #[test]
    fn listeners_fire_on_every_mutation() {
        let mut e = engine();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        e.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        e.start(); // 1
        e.next_step(); // 2
        e.set_word_index(1); // 3
        e.pause(); // 4
        e.resume(); // 5
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut e = engine();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let id = e.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        e.start();
        e.unsubscribe(id);
        e.next_step();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_receives_fresh_snapshot() {
        let mut e = engine();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s = seen.clone();
        e.subscribe(move |snap: &EngineSnapshot| {
            s.lock().unwrap().push(snap.step_index);
        });

        e.start();
        e.next_step();
        e.next_step();
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }
}
