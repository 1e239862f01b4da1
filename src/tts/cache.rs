//! SQLite-backed audio cache.
//!
//! Stores synthesized audio as BLOBs keyed by the content fingerprint
//! ([`super::fingerprint`]).  Entries are immutable once written and are
//! never auto-evicted: the prayer texts feeding this cache are a small,
//! bounded set.  An explicit [`AudioCache::clear`] plus size inspection
//! cover manual maintenance.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::WordTiming;

/// A cached entry returned on hit.
#[derive(Debug, Clone)]
pub struct AudioCacheEntry {
    pub audio_data: Vec<u8>,
    pub duration_ms: i64,
    pub word_timings: Option<Vec<WordTiming>>,
}

/// SQLite BLOB cache for synthesized prayer audio.
pub struct AudioCache {
    conn: Connection,
}

impl AudioCache {
    /// Open (or create) a cache database at the given path.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("failed to open audio cache database")?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (for testing).
    pub fn in_memory() -> Result<Self> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS audio_cache (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cache_key TEXT NOT NULL UNIQUE,
                text TEXT NOT NULL,
                language_code TEXT NOT NULL,
                voice_description TEXT NOT NULL,
                audio_data BLOB NOT NULL,
                duration_ms INTEGER NOT NULL,
                word_timings TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_audio_cache_key ON audio_cache(cache_key);
            ",
            )
            .context("failed to initialize audio cache schema")?;
        Ok(())
    }

    /// Look up an entry by fingerprint.
    pub fn lookup(&self, cache_key: &str) -> Result<Option<AudioCacheEntry>> {
        let row = self
            .conn
            .query_row(
                "SELECT audio_data, duration_ms, word_timings FROM audio_cache WHERE cache_key = ?1",
                params![cache_key],
                |row| {
                    let audio_data: Vec<u8> = row.get(0)?;
                    let duration_ms: i64 = row.get(1)?;
                    let word_timings: Option<String> = row.get(2)?;
                    Ok((audio_data, duration_ms, word_timings))
                },
            )
            .optional()?;

        match row {
            Some((audio_data, duration_ms, timings_json)) => {
                // A timings column that fails to parse is dropped, not fatal:
                // the audio itself is still usable with even word spacing.
                let word_timings = timings_json
                    .as_deref()
                    .and_then(|json| serde_json::from_str(json).ok());
                debug!(cache_key, bytes = audio_data.len(), "audio cache hit");
                Ok(Some(AudioCacheEntry {
                    audio_data,
                    duration_ms,
                    word_timings,
                }))
            }
            None => {
                debug!(cache_key, "audio cache miss");
                Ok(None)
            }
        }
    }

    /// Insert a new entry.  Duplicate fingerprints overwrite; synthesis
    /// output for fixed inputs is treated as immutable, so overwrites
    /// are harmless.
    pub fn insert(
        &self,
        cache_key: &str,
        text: &str,
        language_code: &str,
        voice_description: &str,
        audio_data: &[u8],
        duration_ms: i64,
        word_timings: Option<&[WordTiming]>,
    ) -> Result<()> {
        let timings_json = word_timings
            .map(serde_json::to_string)
            .transpose()
            .context("failed to serialize word timings")?;

        self.conn.execute(
            "INSERT OR REPLACE INTO audio_cache
             (cache_key, text, language_code, voice_description, audio_data, duration_ms, word_timings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                cache_key,
                text,
                language_code,
                voice_description,
                audio_data,
                duration_ms,
                timings_json,
            ],
        )?;

        debug!(cache_key, bytes = audio_data.len(), "audio cache insert");
        Ok(())
    }

    /// Total size of cached audio data in bytes.
    pub fn total_size_bytes(&self) -> Result<u64> {
        let size: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(SUM(length(audio_data)), 0) FROM audio_cache",
                [],
                |row| row.get(0),
            )
            .context("failed to query total cache size")?;
        Ok(size as u64)
    }

    /// Number of cached entries.
    pub fn entry_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM audio_cache", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Remove all cached entries.
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM audio_cache", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::fingerprint;

    fn key(text: &str) -> String {
        fingerprint(text, "en-US", "a calm voice")
    }

    #[test]
    fn miss_then_hit_round_trip() {
        let cache = AudioCache::in_memory().unwrap();
        let k = key("Hail Mary");

        assert!(cache.lookup(&k).unwrap().is_none());

        let audio = vec![1u8, 2, 3, 4, 5];
        cache
            .insert(&k, "Hail Mary", "en-US", "a calm voice", &audio, 1200, None)
            .unwrap();

        let hit = cache.lookup(&k).unwrap().unwrap();
        assert_eq!(hit.audio_data, audio);
        assert_eq!(hit.duration_ms, 1200);
        assert!(hit.word_timings.is_none());
    }

    #[test]
    fn different_fingerprint_misses() {
        let cache = AudioCache::in_memory().unwrap();
        cache
            .insert(&key("a"), "a", "en-US", "v", &[0; 8], 10, None)
            .unwrap();
        assert!(cache.lookup(&key("b")).unwrap().is_none());
    }

    #[test]
    fn word_timings_round_trip() {
        let cache = AudioCache::in_memory().unwrap();
        let k = key("Glory Be");
        let timings = vec![
            WordTiming {
                word: "Glory".into(),
                start_ms: 0.0,
                end_ms: 400.0,
            },
            WordTiming {
                word: "Be".into(),
                start_ms: 400.0,
                end_ms: 700.0,
            },
        ];
        cache
            .insert(&k, "Glory Be", "en-US", "v", &[9; 16], 700, Some(&timings))
            .unwrap();

        let hit = cache.lookup(&k).unwrap().unwrap();
        assert_eq!(hit.word_timings.unwrap(), timings);
    }

    #[test]
    fn corrupt_timings_column_is_dropped_not_fatal() {
        let cache = AudioCache::in_memory().unwrap();
        let k = key("Creed");
        cache
            .insert(&k, "Creed", "en-US", "v", &[1; 8], 50, None)
            .unwrap();
        cache
            .conn
            .execute(
                "UPDATE audio_cache SET word_timings = 'not json' WHERE cache_key = ?1",
                params![k],
            )
            .unwrap();

        let hit = cache.lookup(&k).unwrap().unwrap();
        assert!(hit.word_timings.is_none());
        assert_eq!(hit.audio_data, vec![1; 8]);
    }

    #[test]
    fn size_and_count_tracking() {
        let cache = AudioCache::in_memory().unwrap();
        assert_eq!(cache.total_size_bytes().unwrap(), 0);
        assert_eq!(cache.entry_count().unwrap(), 0);

        cache
            .insert(&key("a"), "a", "en-US", "v", &[0u8; 1000], 10, None)
            .unwrap();
        cache
            .insert(&key("b"), "b", "en-US", "v", &[0u8; 500], 10, None)
            .unwrap();

        assert_eq!(cache.total_size_bytes().unwrap(), 1500);
        assert_eq!(cache.entry_count().unwrap(), 2);
    }

    #[test]
    fn overwrite_same_key_keeps_one_entry() {
        let cache = AudioCache::in_memory().unwrap();
        let k = key("replace");
        cache
            .insert(&k, "replace", "en-US", "v", &[1, 2, 3], 30, None)
            .unwrap();
        cache
            .insert(&k, "replace", "en-US", "v", &[4, 5, 6, 7], 40, None)
            .unwrap();

        assert_eq!(cache.entry_count().unwrap(), 1);
        let hit = cache.lookup(&k).unwrap().unwrap();
        assert_eq!(hit.audio_data, vec![4, 5, 6, 7]);
        assert_eq!(hit.duration_ms, 40);
    }

    #[test]
    fn clear_removes_all() {
        let cache = AudioCache::in_memory().unwrap();
        cache
            .insert(&key("a"), "a", "en-US", "v", &[0; 10], 10, None)
            .unwrap();
        cache
            .insert(&key("b"), "b", "en-US", "v", &[0; 10], 10, None)
            .unwrap();

        cache.clear().unwrap();
        assert_eq!(cache.entry_count().unwrap(), 0);
        assert_eq!(cache.total_size_bytes().unwrap(), 0);
    }

    #[test]
    fn open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_str().unwrap();

        {
            let cache = AudioCache::open(path).unwrap();
            cache
                .insert(&key("persist"), "persist", "en-US", "v", &[7; 32], 99, None)
                .unwrap();
        }

        let cache = AudioCache::open(path).unwrap();
        let hit = cache.lookup(&key("persist")).unwrap().unwrap();
        assert_eq!(hit.audio_data, vec![7; 32]);
    }
}
