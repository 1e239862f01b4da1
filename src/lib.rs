//! Rosarium - a Rosary recitation engine with synchronized narration
//!
//! This crate provides the core functionality for Rosarium, including:
//! - Rosary domain model and recitation state machine
//! - TTS pipeline with audio caching, bounded retry, and silent fallback
//! - Edge proxy mediating the upstream voice-synthesis backend
//! - Word-paced playback control
//! - Persisted user preferences

pub mod config;
pub mod playback;
pub mod prefs;
pub mod rosary;
pub mod server;
pub mod tts;

pub use config::Config;
