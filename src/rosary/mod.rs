//! Rosary domain model: prayers, mysteries, step sequence, and the
//! recitation state machine.

pub mod engine;
pub mod mysteries;
pub mod prayers;
pub mod sequence;

pub use engine::{EngineSnapshot, EngineState, RosaryEngine};
pub use mysteries::{mystery_for_date, mystery_set, Mystery, MysteryKind, MysterySet};
pub use prayers::PrayerKind;
pub use sequence::{build_sequence, RosaryStep, SEQUENCE_LEN};
