//! The fixed set of Rosary prayers.
//!
//! Prayer texts are static reference data shared by the engine, the
//! TTS pipeline, and the terminal recitation view.  The set is closed:
//! every step in a built sequence carries exactly one [`PrayerKind`].

use serde::{Deserialize, Serialize};

/// One of the fixed prayers (or the per-decade mystery announcement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrayerKind {
    SignOfCross,
    Creed,
    OurFather,
    HailMary,
    GloryBe,
    FatimaPrayer,
    HailHolyQueen,
    ClosingPrayer,
    GoInPeace,
    /// Announces the decade's mystery.  Text is resolved from the
    /// selected mystery set, not from this module.
    MysteryAnnouncement,
}

impl PrayerKind {
    /// Display title for the prayer.
    pub fn title(&self) -> &'static str {
        match self {
            PrayerKind::SignOfCross => "Sign of the Cross",
            PrayerKind::Creed => "Apostles' Creed",
            PrayerKind::OurFather => "Our Father",
            PrayerKind::HailMary => "Hail Mary",
            PrayerKind::GloryBe => "Glory Be",
            PrayerKind::FatimaPrayer => "Fatima Prayer",
            PrayerKind::HailHolyQueen => "Hail, Holy Queen",
            PrayerKind::ClosingPrayer => "Closing Prayer",
            PrayerKind::GoInPeace => "Go in Peace",
            PrayerKind::MysteryAnnouncement => "Mystery",
        }
    }

    /// Canonical text, or `None` for the mystery announcement
    /// (whose text depends on the active mystery set and decade).
    pub fn text(&self) -> Option<&'static str> {
        let text = match self {
            PrayerKind::SignOfCross => {
                "In the name of the Father, and of the Son, \
                 and of the Holy Spirit. Amen."
            }
            PrayerKind::Creed => {
                "I believe in God, the Father almighty, Creator of heaven and earth, \
                 and in Jesus Christ, his only Son, our Lord, who was conceived by \
                 the Holy Spirit, born of the Virgin Mary, suffered under Pontius \
                 Pilate, was crucified, died and was buried; he descended into hell; \
                 on the third day he rose again from the dead; he ascended into \
                 heaven, and is seated at the right hand of God the Father almighty; \
                 from there he will come to judge the living and the dead. I believe \
                 in the Holy Spirit, the holy catholic Church, the communion of \
                 saints, the forgiveness of sins, the resurrection of the body, \
                 and life everlasting. Amen."
            }
            PrayerKind::OurFather => {
                "Our Father, who art in heaven, hallowed be thy name; thy kingdom \
                 come; thy will be done on earth as it is in heaven. Give us this \
                 day our daily bread; and forgive us our trespasses as we forgive \
                 those who trespass against us; and lead us not into temptation, \
                 but deliver us from evil. Amen."
            }
            PrayerKind::HailMary => {
                "Hail Mary, full of grace, the Lord is with thee; blessed art thou \
                 among women, and blessed is the fruit of thy womb, Jesus. Holy \
                 Mary, Mother of God, pray for us sinners, now and at the hour of \
                 our death. Amen."
            }
            PrayerKind::GloryBe => {
                "Glory be to the Father, and to the Son, and to the Holy Spirit. \
                 As it was in the beginning, is now, and ever shall be, world \
                 without end. Amen."
            }
            PrayerKind::FatimaPrayer => {
                "O my Jesus, forgive us our sins, save us from the fires of hell, \
                 lead all souls to heaven, especially those in most need of thy \
                 mercy. Amen."
            }
            PrayerKind::HailHolyQueen => {
                "Hail, holy Queen, Mother of mercy, our life, our sweetness, and \
                 our hope. To thee do we cry, poor banished children of Eve. To \
                 thee do we send up our sighs, mourning and weeping in this valley \
                 of tears. Turn, then, most gracious advocate, thine eyes of mercy \
                 toward us, and after this, our exile, show unto us the blessed \
                 fruit of thy womb, Jesus. O clement, O loving, O sweet Virgin \
                 Mary. Pray for us, O holy Mother of God, that we may be made \
                 worthy of the promises of Christ. Amen."
            }
            PrayerKind::ClosingPrayer => {
                "O God, whose only-begotten Son, by his life, death and \
                 resurrection, has purchased for us the rewards of eternal life; \
                 grant, we beseech thee, that meditating upon these mysteries of \
                 the most holy Rosary of the Blessed Virgin Mary, we may imitate \
                 what they contain and obtain what they promise, through the same \
                 Christ our Lord. Amen."
            }
            PrayerKind::GoInPeace => "Go in peace. The Rosary is complete.",
            PrayerKind::MysteryAnnouncement => return None,
        };
        Some(text)
    }
}
