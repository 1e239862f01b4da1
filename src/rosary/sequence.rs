//! Rosary step sequence construction.
//!
//! [`build_sequence`] maps a mystery set to the ordered list of 62
//! recitation steps.  The bead index arithmetic is a contract with the
//! bead-visualization layer: Our Father of decade `d` sits on bead
//! `6 + d*11`, Hail Mary `h` of decade `d` on bead `7 + d*11 + h`.

use serde::Serialize;

use super::mysteries::MysteryKind;
use super::prayers::PrayerKind;

/// One unit of recitation.  Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RosaryStep {
    pub prayer: PrayerKind,
    /// Decade this step belongs to (0–4), if any.
    pub decade: Option<usize>,
    /// Position of the prayer within its decade, if any.
    pub prayer_in_decade: Option<usize>,
    /// Bead position (0 = crucifix, 1–5 = tail, 6–60 = loop).
    /// `None` for steps with no bead (announcements, closing prayers).
    pub bead: Option<usize>,
}

impl RosaryStep {
    fn new(prayer: PrayerKind) -> Self {
        Self {
            prayer,
            decade: None,
            prayer_in_decade: None,
            bead: None,
        }
    }

    fn on_bead(mut self, bead: usize) -> Self {
        self.bead = Some(bead);
        self
    }

    fn in_decade(mut self, decade: usize, prayer_in_decade: usize) -> Self {
        self.decade = Some(decade);
        self.prayer_in_decade = Some(prayer_in_decade);
        self
    }
}

/// Number of steps in a full sequence.
pub const SEQUENCE_LEN: usize = 62;

/// Build the full ordered step sequence for one mystery set.
///
/// Structure: opening (crucifix + tail), five decades, closing.
/// Deterministic for all four mystery kinds; the kind only selects
/// which meditations the announcement steps resolve to later.
pub fn build_sequence(_kind: MysteryKind) -> Vec<RosaryStep> {
    let mut steps = Vec::with_capacity(SEQUENCE_LEN);

    // Opening: crucifix and tail beads.
    steps.push(RosaryStep::new(PrayerKind::SignOfCross).on_bead(0));
    steps.push(RosaryStep::new(PrayerKind::Creed).on_bead(0));
    steps.push(RosaryStep::new(PrayerKind::OurFather).on_bead(1));
    for h in 0..3 {
        steps.push(RosaryStep::new(PrayerKind::HailMary).on_bead(2 + h));
    }
    steps.push(RosaryStep::new(PrayerKind::GloryBe).on_bead(5));

    // Five decades on the main loop.
    for d in 0..5 {
        let base = 6 + d * 11;
        steps.push(RosaryStep::new(PrayerKind::MysteryAnnouncement).in_decade(d, 0));
        steps.push(
            RosaryStep::new(PrayerKind::OurFather)
                .in_decade(d, 1)
                .on_bead(base),
        );
        for h in 0..10 {
            steps.push(
                RosaryStep::new(PrayerKind::HailMary)
                    .in_decade(d, 2 + h)
                    .on_bead(base + 1 + h),
            );
        }
        steps.push(
            RosaryStep::new(PrayerKind::GloryBe)
                .in_decade(d, 12)
                .on_bead(base + 10),
        );
        steps.push(
            RosaryStep::new(PrayerKind::FatimaPrayer)
                .in_decade(d, 13)
                .on_bead(base + 10),
        );
    }

    // Closing.
    steps.push(RosaryStep::new(PrayerKind::HailHolyQueen));
    steps.push(RosaryStep::new(PrayerKind::ClosingPrayer));
    steps.push(RosaryStep::new(PrayerKind::SignOfCross).on_bead(0));
    steps.push(RosaryStep::new(PrayerKind::GoInPeace));

    debug_assert_eq!(steps.len(), SEQUENCE_LEN);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_has_62_steps_for_all_kinds() {
        for kind in MysteryKind::ALL {
            assert_eq!(build_sequence(kind).len(), SEQUENCE_LEN);
        }
    }

    #[test]
    fn prayer_counts() {
        let steps = build_sequence(MysteryKind::Joyful);
        let count = |p: PrayerKind| steps.iter().filter(|s| s.prayer == p).count();

        assert_eq!(count(PrayerKind::SignOfCross), 2);
        assert_eq!(count(PrayerKind::Creed), 1);
        assert_eq!(count(PrayerKind::OurFather), 6); // 1 tail + 5 decades
        assert_eq!(count(PrayerKind::HailMary), 53); // 3 tail + 50 decade
        assert_eq!(count(PrayerKind::GloryBe), 6);
        assert_eq!(count(PrayerKind::FatimaPrayer), 5);
        assert_eq!(count(PrayerKind::MysteryAnnouncement), 5);
        assert_eq!(count(PrayerKind::HailHolyQueen), 1);
        assert_eq!(count(PrayerKind::ClosingPrayer), 1);
        assert_eq!(count(PrayerKind::GoInPeace), 1);
    }

    #[test]
    fn opening_ordering() {
        let steps = build_sequence(MysteryKind::Sorrowful);
        assert_eq!(steps[0].prayer, PrayerKind::SignOfCross);
        assert_eq!(steps[1].prayer, PrayerKind::Creed);
        assert_eq!(steps[2].prayer, PrayerKind::OurFather);
        assert_eq!(steps[2].bead, Some(1));
        assert_eq!(steps[3].prayer, PrayerKind::HailMary);
        assert_eq!(steps[3].bead, Some(2));
        assert_eq!(steps[5].bead, Some(4));
        assert_eq!(steps[6].prayer, PrayerKind::GloryBe);
        assert_eq!(steps[6].bead, Some(5));
    }

    #[test]
    fn decade_bead_arithmetic() {
        let steps = build_sequence(MysteryKind::Glorious);
        for d in 0..5 {
            let decade: Vec<&RosaryStep> = steps
                .iter()
                .filter(|s| s.decade == Some(d))
                .collect();
            assert_eq!(decade.len(), 14);

            assert_eq!(decade[0].prayer, PrayerKind::MysteryAnnouncement);
            assert_eq!(decade[0].bead, None);

            assert_eq!(decade[1].prayer, PrayerKind::OurFather);
            assert_eq!(decade[1].bead, Some(6 + d * 11));

            for h in 0..10 {
                assert_eq!(decade[2 + h].prayer, PrayerKind::HailMary);
                assert_eq!(decade[2 + h].bead, Some(7 + d * 11 + h));
            }

            // Glory Be and Fatima share the last bead of the decade.
            assert_eq!(decade[12].bead, Some(6 + d * 11 + 10));
            assert_eq!(decade[13].bead, Some(6 + d * 11 + 10));
        }
    }

    #[test]
    fn closing_ordering() {
        let steps = build_sequence(MysteryKind::Luminous);
        let tail = &steps[SEQUENCE_LEN - 4..];
        assert_eq!(tail[0].prayer, PrayerKind::HailHolyQueen);
        assert_eq!(tail[1].prayer, PrayerKind::ClosingPrayer);
        assert_eq!(tail[2].prayer, PrayerKind::SignOfCross);
        assert_eq!(tail[3].prayer, PrayerKind::GoInPeace);
    }

    #[test]
    fn loop_beads_cover_6_to_60() {
        let steps = build_sequence(MysteryKind::Joyful);
        let mut loop_beads: Vec<usize> = steps
            .iter()
            .filter(|s| s.decade.is_some())
            .filter_map(|s| s.bead)
            .collect();
        loop_beads.sort_unstable();
        loop_beads.dedup();
        let expected: Vec<usize> = (6..=60).collect();
        assert_eq!(loop_beads, expected);
    }

    #[test]
    fn sequence_identical_across_kinds() {
        // The step structure does not depend on the mystery kind.
        let a = build_sequence(MysteryKind::Joyful);
        let b = build_sequence(MysteryKind::Luminous);
        assert_eq!(a, b);
    }
}
