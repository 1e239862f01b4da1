//! Persisted user preferences.
//!
//! Language, voice description, and theme survive across sessions so a
//! returning user can be offered a resume path.  Primary storage is a
//! key-value table in SQLite; when the database cannot be opened the
//! store falls back to a plain JSON file rather than failing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The persisted preference set.  Overwritten whole whenever the user
/// (re)selects a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub language: String,
    pub language_code: String,
    pub voice_description: String,
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            language_code: "en-US".to_string(),
            voice_description: "a calm, reverent female voice".to_string(),
            theme: "dark".to_string(),
        }
    }
}

enum Backend {
    Sqlite(Connection),
    JsonFile(PathBuf),
}

/// Preference store with automatic backend fallback.
pub struct PrefsStore {
    backend: Backend,
}

impl PrefsStore {
    /// Open the SQLite-backed store, falling back to a JSON file
    /// alongside it when the database is unavailable.
    pub fn open(db_path: &Path, fallback_json: &Path) -> Self {
        match Self::open_sqlite(db_path) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "preferences database unavailable, using JSON fallback");
                Self {
                    backend: Backend::JsonFile(fallback_json.to_path_buf()),
                }
            }
        }
    }

    fn open_sqlite(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).context("failed to open preferences database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to initialize preferences schema")?;
        Ok(Self {
            backend: Backend::Sqlite(conn),
        })
    }

    /// In-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            backend: Backend::Sqlite(conn),
        })
    }

    /// Load saved preferences, or `None` on first run.
    pub fn load(&self) -> Result<Option<Preferences>> {
        match &self.backend {
            Backend::Sqlite(conn) => {
                let json: Option<String> = conn
                    .query_row(
                        "SELECT value FROM preferences WHERE key = 'prefs'",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                match json {
                    Some(json) => Ok(Some(
                        serde_json::from_str(&json).context("corrupt preferences row")?,
                    )),
                    None => Ok(None),
                }
            }
            Backend::JsonFile(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                let json = std::fs::read_to_string(path).context("failed to read preferences")?;
                Ok(Some(
                    serde_json::from_str(&json).context("corrupt preferences file")?,
                ))
            }
        }
    }

    /// Persist preferences, replacing any previous set.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        let json = serde_json::to_string(prefs).context("failed to serialize preferences")?;
        match &self.backend {
            Backend::Sqlite(conn) => {
                conn.execute(
                    "INSERT OR REPLACE INTO preferences (key, value) VALUES ('prefs', ?1)",
                    params![json],
                )?;
                Ok(())
            }
            Backend::JsonFile(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).context("failed to create preferences dir")?;
                }
                std::fs::write(path, json).context("failed to write preferences")?;
                Ok(())
            }
        }
    }
}
