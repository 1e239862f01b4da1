//! The four mystery sets and the weekday → mystery mapping.
//!
//! Static reference data: each set names 5 mysteries (name + meditation)
//! and carries theme colors for the UI layer.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Which group of mysteries is being prayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MysteryKind {
    Joyful,
    Sorrowful,
    Glorious,
    Luminous,
}

impl MysteryKind {
    pub const ALL: [MysteryKind; 4] = [
        MysteryKind::Joyful,
        MysteryKind::Sorrowful,
        MysteryKind::Glorious,
        MysteryKind::Luminous,
    ];
}

impl std::str::FromStr for MysteryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "joyful" => Ok(MysteryKind::Joyful),
            "sorrowful" => Ok(MysteryKind::Sorrowful),
            "glorious" => Ok(MysteryKind::Glorious),
            "luminous" => Ok(MysteryKind::Luminous),
            other => Err(format!("unknown mystery set: {}", other)),
        }
    }
}

/// One meditative theme attached to a decade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mystery {
    pub name: &'static str,
    pub meditation: &'static str,
}

/// A named group of 5 mysteries plus theme colors.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MysterySet {
    pub kind: MysteryKind,
    pub name: &'static str,
    pub mysteries: [Mystery; 5],
    /// Primary theme color (hex) used by the bead visualization.
    pub color: &'static str,
    /// Accent color (hex).
    pub accent: &'static str,
}

/// Look up the static set for a mystery kind.
pub fn mystery_set(kind: MysteryKind) -> &'static MysterySet {
    match kind {
        MysteryKind::Joyful => &JOYFUL,
        MysteryKind::Sorrowful => &SORROWFUL,
        MysteryKind::Glorious => &GLORIOUS,
        MysteryKind::Luminous => &LUMINOUS,
    }
}

/// Traditional weekday assignment of mystery sets.
///
/// Sunday/Wednesday → Glorious, Monday/Saturday → Joyful,
/// Tuesday/Friday → Sorrowful, Thursday → Luminous.
pub fn mystery_for_date(date: NaiveDate) -> MysteryKind {
    match date.weekday() {
        Weekday::Sun | Weekday::Wed => MysteryKind::Glorious,
        Weekday::Mon | Weekday::Sat => MysteryKind::Joyful,
        Weekday::Tue | Weekday::Fri => MysteryKind::Sorrowful,
        Weekday::Thu => MysteryKind::Luminous,
    }
}

static JOYFUL: MysterySet = MysterySet {
    kind: MysteryKind::Joyful,
    name: "The Joyful Mysteries",
    color: "#2e6b8a",
    accent: "#7fb4d1",
    mysteries: [
        Mystery {
            name: "The Annunciation",
            meditation: "The Angel Gabriel announces to Mary that she is to be \
                         the Mother of God, and Mary answers: let it be done \
                         unto me according to thy word.",
        },
        Mystery {
            name: "The Visitation",
            meditation: "Mary visits her cousin Elizabeth, who greets her: \
                         blessed art thou among women, and blessed is the \
                         fruit of thy womb.",
        },
        Mystery {
            name: "The Nativity",
            meditation: "Jesus is born in a stable in Bethlehem, and shepherds \
                         come to adore him.",
        },
        Mystery {
            name: "The Presentation",
            meditation: "Mary and Joseph present the child Jesus in the Temple, \
                         where Simeon recognizes the salvation of Israel.",
        },
        Mystery {
            name: "The Finding in the Temple",
            meditation: "After three days of searching, Mary and Joseph find \
                         the young Jesus teaching among the doctors in the \
                         Temple.",
        },
    ],
};

static SORROWFUL: MysterySet = MysterySet {
    kind: MysteryKind::Sorrowful,
    name: "The Sorrowful Mysteries",
    color: "#6b2e3a",
    accent: "#c48794",
    mysteries: [
        Mystery {
            name: "The Agony in the Garden",
            meditation: "Jesus prays in Gethsemane: Father, if thou be willing, \
                         remove this chalice from me, but yet not my will but \
                         thine be done.",
        },
        Mystery {
            name: "The Scourging at the Pillar",
            meditation: "Jesus is bound to a pillar and cruelly scourged by \
                         order of Pilate.",
        },
        Mystery {
            name: "The Crowning with Thorns",
            meditation: "The soldiers weave a crown of thorns, place it on his \
                         head, and mock him as king.",
        },
        Mystery {
            name: "The Carrying of the Cross",
            meditation: "Jesus carries his cross to Calvary, falling beneath \
                         its weight, consoling the women of Jerusalem.",
        },
        Mystery {
            name: "The Crucifixion",
            meditation: "Jesus is nailed to the cross and dies after three \
                         hours of agony, commending his spirit to the Father.",
        },
    ],
};

static GLORIOUS: MysterySet = MysterySet {
    kind: MysteryKind::Glorious,
    name: "The Glorious Mysteries",
    color: "#7a5a1e",
    accent: "#d9b875",
    mysteries: [
        Mystery {
            name: "The Resurrection",
            meditation: "On the third day Jesus rises from the dead, glorious \
                         and immortal.",
        },
        Mystery {
            name: "The Ascension",
            meditation: "Forty days after his resurrection, Jesus ascends into \
                         heaven in the sight of his disciples.",
        },
        Mystery {
            name: "The Descent of the Holy Spirit",
            meditation: "The Holy Spirit descends upon Mary and the apostles in \
                         tongues of fire at Pentecost.",
        },
        Mystery {
            name: "The Assumption",
            meditation: "Mary is taken up, body and soul, into the glory of \
                         heaven.",
        },
        Mystery {
            name: "The Coronation of Mary",
            meditation: "Mary is crowned Queen of heaven and earth, of angels \
                         and of saints.",
        },
    ],
};

static LUMINOUS: MysterySet = MysterySet {
    kind: MysteryKind::Luminous,
    name: "The Luminous Mysteries",
    color: "#2e5a3a",
    accent: "#8cc49a",
    mysteries: [
        Mystery {
            name: "The Baptism in the Jordan",
            meditation: "Jesus is baptized by John, the heavens open, and the \
                         Father proclaims him his beloved Son.",
        },
        Mystery {
            name: "The Wedding at Cana",
            meditation: "At Mary's request, Jesus changes water into wine, the \
                         first of his signs.",
        },
        Mystery {
            name: "The Proclamation of the Kingdom",
            meditation: "Jesus proclaims the Kingdom of God and calls all to \
                         conversion.",
        },
        Mystery {
            name: "The Transfiguration",
            meditation: "On the mountain, the glory of the Godhead shines forth \
                         from the face of Christ.",
        },
        Mystery {
            name: "The Institution of the Eucharist",
            meditation: "At the Last Supper, Jesus offers his Body and Blood \
                         under the signs of bread and wine.",
        },
    ],
};
