//! Voice persona heuristic.
//!
//! Maps a free-text voice description to one of three upstream voice
//! personas by simple keyword inspection.  This is a coarse heuristic,
//! not a classifier: descriptions with no recognized keyword get the
//! neutral persona.

use serde::Serialize;

/// Upstream voice persona derived from the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Female,
    Male,
    Neutral,
}

const FEMALE_KEYWORDS: [&str; 6] = ["female", "woman", "girl", "feminine", "lady", "soprano"];
const MALE_KEYWORDS: [&str; 6] = ["male", "man", "boy", "masculine", "gentleman", "baritone"];

impl Persona {
    /// Detect a persona from a free-text voice description.
    ///
    /// Female keywords are checked first so that "female" is never
    /// shadowed by its "male" substring.
    pub fn detect(description: &str) -> Persona {
        let lower = description.to_lowercase();
        let has = |words: &[&str]| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|w| words.contains(&w))
        };
        if has(&FEMALE_KEYWORDS) {
            Persona::Female
        } else if has(&MALE_KEYWORDS) {
            Persona::Male
        } else {
            Persona::Neutral
        }
    }

    /// Upstream voice identifier for this persona.
    pub fn upstream_voice(&self) -> &'static str {
        match self {
            Persona::Female => "coral",
            Persona::Male => "onyx",
            Persona::Neutral => "alloy",
        }
    }
}
