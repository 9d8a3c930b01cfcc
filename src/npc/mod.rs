//! NPC descriptors.
//!
//! [`NpcDescriptor`] is the flat, read-only view of one entity that the
//! matcher, filter and generator consume. Loading descriptors from a record
//! database is the caller's business; this module only defines the shape and
//! a few derived properties (race aliasing, linked-unique status).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// NPC gender. Asset packs are authored for exactly one gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// Membership of an NPC in one faction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactionRank {
    /// Faction record key.
    pub faction: String,
    /// Rank within the faction.
    pub rank: i32,
}

/// Everything the engine needs to know about one NPC.
///
/// # Examples
///
/// ```
/// use u_variants::npc::{Gender, NpcDescriptor};
///
/// let npc = NpcDescriptor::new("Skyrim.esm|0A2C94", "NordRace", Gender::Female)
///     .with_name("Lydia")
///     .with_unique(true)
///     .with_weight(50.0)
///     .with_faction("PotentialFollowerFaction", 0);
///
/// assert_eq!(npc.log_id(), "Lydia (Skyrim.esm|0A2C94)");
/// assert!(npc.in_faction("PotentialFollowerFaction", -1, 100));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpcDescriptor {
    /// Record identity; matched by `Npc` attributes.
    pub key: String,
    /// Display name. Empty when the record has none.
    pub name: String,
    /// Race used for asset eligibility (after aliasing, see [`RaceAliases`]).
    pub race: String,
    pub gender: Gender,
    /// Body weight slider value, 0–100.
    pub weight: f64,
    /// Whether the record carries the unique flag.
    pub is_unique: bool,
    pub class: Option<String>,
    pub factions: Vec<FactionRank>,
    pub face_texture: Option<String>,
    pub voice_type: Option<String>,
    /// Free-form properties matched by `Custom` attributes.
    pub custom: BTreeMap<String, String>,
}

impl NpcDescriptor {
    /// Creates a descriptor with the mandatory identity fields.
    pub fn new(key: impl Into<String>, race: impl Into<String>, gender: Gender) -> Self {
        Self {
            key: key.into(),
            name: String::new(),
            race: race.into(),
            gender,
            weight: 50.0,
            is_unique: false,
            class: None,
            factions: Vec::new(),
            face_texture: None,
            voice_type: None,
            custom: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_faction(mut self, faction: impl Into<String>, rank: i32) -> Self {
        self.factions.push(FactionRank {
            faction: faction.into(),
            rank,
        });
        self
    }

    pub fn with_face_texture(mut self, texture: impl Into<String>) -> Self {
        self.face_texture = Some(texture.into());
        self
    }

    pub fn with_voice_type(mut self, voice: impl Into<String>) -> Self {
        self.voice_type = Some(voice.into());
        self
    }

    pub fn with_custom(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(field.into(), value.into());
        self
    }

    /// Identifier used in log and report lines.
    pub fn log_id(&self) -> String {
        if self.name.is_empty() {
            self.key.clone()
        } else {
            format!("{} ({})", self.name, self.key)
        }
    }

    /// Whether the NPC belongs to any of `factions` with a rank in
    /// `[rank_min, rank_max]`.
    pub fn in_any_faction(&self, factions: &BTreeSet<String>, rank_min: i32, rank_max: i32) -> bool {
        self.factions
            .iter()
            .any(|f| factions.contains(&f.faction) && f.rank >= rank_min && f.rank <= rank_max)
    }

    /// Single-faction convenience for [`in_any_faction`](Self::in_any_faction).
    pub fn in_faction(&self, faction: &str, rank_min: i32, rank_max: i32) -> bool {
        self.factions
            .iter()
            .any(|f| f.faction == faction && f.rank >= rank_min && f.rank <= rank_max)
    }

    /// Whether this NPC should share assignments with other unique NPCs of
    /// the same name and gender.
    ///
    /// Requires a name, the unique flag, and a name that is not listed in
    /// `exclusions` (compared case-insensitively).
    pub fn is_valid_linked_unique(&self, exclusions: &BTreeSet<String>) -> bool {
        if self.name.is_empty() || !self.is_unique {
            return false;
        }
        let lowered = self.name.to_lowercase();
        !exclusions.iter().any(|e| e.to_lowercase() == lowered)
    }
}

/// Maps NPC races onto the race whose assets they should receive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceAliases {
    aliases: BTreeMap<String, String>,
}

impl RaceAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes NPCs of `race` receive assets as if they were `alias`.
    pub fn with_alias(mut self, race: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.insert(race.into(), alias.into());
        self
    }

    /// The race to use for asset eligibility.
    pub fn resolve<'a>(&'a self, race: &'a str) -> &'a str {
        self.aliases.get(race).map(String::as_str).unwrap_or(race)
    }

    /// Returns a copy of `npc` with its race replaced by its alias, if any.
    pub fn apply(&self, npc: &NpcDescriptor) -> NpcDescriptor {
        let mut aliased = npc.clone();
        aliased.race = self.resolve(&npc.race).to_string();
        aliased
    }
}
