//! Content-addressed cache fingerprints.
//!
//! A fingerprint is a SHA-256 over the canonical JSON form of the
//! synthesis inputs plus a format version.  Bumping the version moves
//! all new entries into a fresh key namespace, invalidating old cache
//! rows implicitly without any eviction pass.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Cache key format version.  Bump when the audio container, the
/// upstream protocol, or the timing format changes shape.
pub const CACHE_KEY_VERSION: u32 = 2;

#[derive(Serialize)]
struct FingerprintInput<'a> {
    version: u32,
    text: &'a str,
    language_code: &'a str,
    voice_description: &'a str,
}

/// Compute the fingerprint for (text, language code, voice description).
///
/// Text is normalized (trimmed, inner whitespace collapsed) so that
/// formatting differences in prayer sources do not fragment the cache.
pub fn fingerprint(text: &str, language_code: &str, voice_description: &str) -> String {
    let normalized = normalize(text);
    let input = FingerprintInput {
        version: CACHE_KEY_VERSION,
        text: &normalized,
        language_code,
        voice_description: voice_description.trim(),
    };
    let canonical =
        serde_json::to_string(&input).expect("fingerprint serialization should not fail");
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
