//! Rosarium binary: edge proxy server, terminal recitation, and cache
//! maintenance.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rosarium::config::Config;
use rosarium::playback::{PlayOutcome, PlaybackController};
use rosarium::prefs::{Preferences, PrefsStore};
use rosarium::rosary::{mystery_for_date, EngineState, MysteryKind, RosaryEngine};
use rosarium::server::{self, AppState};
use rosarium::tts::cache::AudioCache;
use rosarium::tts::upstream::UpstreamSynthesizer;
use rosarium::tts::{TtsClient, TtsRequest};

#[derive(Parser)]
#[command(name = "rosarium", version, about = "Rosary recitation with synchronized narration")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the edge TTS proxy.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Recite a Rosary in the terminal, word-paced.
    Recite {
        /// Mystery set: auto, joyful, sorrowful, glorious, or luminous.
        #[arg(long, default_value = "auto")]
        mysteries: String,
        /// Override the saved narration language.
        #[arg(long)]
        language: Option<String>,
        /// Override the saved voice description.
        #[arg(long)]
        voice: Option<String>,
    },
    /// Inspect or clear the audio cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print entry count and total size.
    Stats,
    /// Remove every cached entry.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rosarium=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    std::fs::create_dir_all(config.data_dir())
        .with_context(|| format!("failed to create {}", config.data_dir().display()))?;

    match cli.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Recite {
            mysteries,
            language,
            voice,
        } => recite(config, &mysteries, language, voice).await,
        Command::Cache { action } => cache_admin(config, action),
    }
}

async fn serve(config: Config, bind: Option<String>) -> Result<()> {
    let cache = open_cache(&config)?;
    let synthesizer = UpstreamSynthesizer::new(config.upstream_config()?);
    let api_key_configured = synthesizer.api_key_configured();
    let probe_url = Some(synthesizer.probe_url());
    if !api_key_configured {
        tracing::warn!("no upstream API key configured; all synthesis will instruct fallback");
    }

    let state = AppState::new(cache, Arc::new(synthesizer), api_key_configured, probe_url);
    let bind_addr = bind.unwrap_or(config.server.bind_addr);
    server::serve(state, &bind_addr).await
}

async fn recite(
    config: Config,
    mysteries: &str,
    language: Option<String>,
    voice: Option<String>,
) -> Result<()> {
    let prefs_store = PrefsStore::open(&config.prefs_db_path(), &config.prefs_json_path());
    let mut prefs = prefs_store
        .load()
        .unwrap_or_default()
        .unwrap_or_else(Preferences::default);
    if let Some(language) = language {
        prefs.language = language;
    }
    if let Some(voice) = voice {
        prefs.voice_description = voice;
    }
    if let Err(e) = prefs_store.save(&prefs) {
        tracing::warn!(error = %e, "failed to persist preferences");
    }

    let kind: MysteryKind = if mysteries.eq_ignore_ascii_case("auto") {
        mystery_for_date(chrono::Local::now().date_naive())
    } else {
        mysteries.parse().map_err(|e: String| anyhow::anyhow!(e))?
    };

    let client = TtsClient::new(open_cache(&config)?, config.client_config()?)?;
    let controller = PlaybackController::new();
    let mut engine = RosaryEngine::new(kind, &prefs.language, &prefs.voice_description);
    engine.start();

    println!("{}\n", rosarium::rosary::mystery_set(kind).name);

    loop {
        let snap = engine.snapshot();
        println!("[{}/{}] {}", snap.step_index + 1, snap.total_steps, snap.title);

        let prayer_key = serde_json::to_string(&snap.prayer)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string();
        let request = TtsRequest {
            text: snap.text.clone(),
            language: prefs.language.clone(),
            language_code: prefs.language_code.clone(),
            voice_description: prefs.voice_description.clone(),
            prayer_key: format!("{}-{}", prayer_key, snap.step_index),
        };

        let audio = tokio::select! {
            audio = client.generate_audio(&request) => audio,
            _ = tokio::signal::ctrl_c() => break,
        };
        if audio.used_fallback {
            println!("  (silent pacing)");
        }

        let words: Vec<String> = snap.text.split_whitespace().map(String::from).collect();
        let outcome = tokio::select! {
            outcome = controller.play_step(&snap.text, &audio, move |i| {
                print!("{} ", words[i]);
                let _ = std::io::stdout().flush();
            }) => outcome,
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
                PlayOutcome::Stopped
            }
        };
        println!("\n");

        if outcome == PlayOutcome::Stopped {
            break;
        }
        if !engine.next_step() {
            break;
        }
    }

    if engine.state() == EngineState::Finished {
        println!("The Rosary is complete.");
    }
    Ok(())
}

fn cache_admin(config: Config, action: CacheAction) -> Result<()> {
    let cache = open_cache(&config)?;
    match action {
        CacheAction::Stats => {
            let entries = cache.entry_count()?;
            let bytes = cache.total_size_bytes()?;
            println!(
                "{} entries, {:.1} MiB ({})",
                entries,
                bytes as f64 / (1024.0 * 1024.0),
                config.cache_db_path().display()
            );
        }
        CacheAction::Clear => {
            cache.clear()?;
            println!("audio cache cleared");
        }
    }
    Ok(())
}

fn open_cache(config: &Config) -> Result<AudioCache> {
    let path = config.cache_db_path();
    AudioCache::open(&path.to_string_lossy())
}
