//! Prior assignment records.
//!
//! The same record shape serves explicit (user-authored) assignments and
//! consistency assignments carried over from a previous run. A record holds
//! one entry per assignment mode: the primary pack, any number of mix-in
//! packs, and replacer entries keyed by replacer name.

use crate::generator::Combination;
use crate::pack::FlattenedAssetPack;
use std::sync::Arc;

/// Which assignment pass is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignmentMode {
    /// The main asset pack of the NPC.
    #[default]
    Primary,
    /// An additional pack layered over the primary assignment.
    MixIn,
    /// A pack replacing one specific asset, identified by replacer name.
    Replacer { replacer: String },
}

impl std::fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentMode::Primary => write!(f, "primary"),
            AssignmentMode::MixIn => write!(f, "mix-in"),
            AssignmentMode::Replacer { replacer } => write!(f, "replacer {}", replacer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MixInAssignment {
    pub asset_pack: String,
    pub subgroup_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplacerAssignment {
    pub asset_pack: String,
    pub replacer: String,
    pub subgroup_ids: Vec<String>,
}

/// Assignments of one NPC across all modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpcAssignment {
    pub asset_pack: Option<String>,
    /// For explicit assignments, any ids to force. For consistency records,
    /// the leaf id chosen at each slot, in slot order.
    pub subgroup_ids: Vec<String>,
    pub mix_ins: Vec<MixInAssignment>,
    pub replacers: Vec<ReplacerAssignment>,
}

/// The pack and subgroup ids an assignment forces in one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub asset_pack: String,
    pub subgroup_ids: Vec<String>,
}

impl Pin {
    /// Whether `combination` agrees with this pin: same pack, and every
    /// pinned id is contained in one of its subgroups.
    pub fn allows(&self, combination: &Combination) -> bool {
        combination.asset_pack == self.asset_pack
            && self.subgroup_ids.iter().all(|id| combination.contains_id(id))
    }
}

impl NpcAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary<I, S>(asset_pack: impl Into<String>, subgroup_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            asset_pack: Some(asset_pack.into()),
            subgroup_ids: subgroup_ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_mix_in<I, S>(mut self, asset_pack: impl Into<String>, subgroup_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mix_ins.push(MixInAssignment {
            asset_pack: asset_pack.into(),
            subgroup_ids: subgroup_ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_replacer<I, S>(
        mut self,
        asset_pack: impl Into<String>,
        replacer: impl Into<String>,
        subgroup_ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replacers.push(ReplacerAssignment {
            asset_pack: asset_pack.into(),
            replacer: replacer.into(),
            subgroup_ids: subgroup_ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// The pin this record imposes in `mode`.
    ///
    /// Mix-in and replacer entries only apply when their pack is among
    /// `packs`, the packs offered to this pass.
    pub fn pin_for(&self, mode: &AssignmentMode, packs: &[Arc<FlattenedAssetPack>]) -> Option<Pin> {
        let offered = |name: &str| packs.iter().any(|p| p.name == name);
        match mode {
            AssignmentMode::Primary => self
                .asset_pack
                .as_ref()
                .filter(|name| !name.is_empty())
                .map(|name| Pin {
                    asset_pack: name.clone(),
                    subgroup_ids: self.subgroup_ids.clone(),
                }),
            AssignmentMode::MixIn => self
                .mix_ins
                .iter()
                .find(|m| offered(&m.asset_pack))
                .map(|m| Pin {
                    asset_pack: m.asset_pack.clone(),
                    subgroup_ids: m.subgroup_ids.clone(),
                }),
            AssignmentMode::Replacer { replacer } => self
                .replacers
                .iter()
                .find(|r| &r.replacer == replacer && offered(&r.asset_pack))
                .map(|r| Pin {
                    asset_pack: r.asset_pack.clone(),
                    subgroup_ids: r.subgroup_ids.clone(),
                }),
        }
    }

    /// Writes `combination` into the entry for `mode`, replacing any
    /// previous entry for the same pack (or replacer).
    pub fn record(&mut self, mode: &AssignmentMode, combination: &Combination) {
        let ids = combination.subgroup_ids();
        match mode {
            AssignmentMode::Primary => {
                self.asset_pack = Some(combination.asset_pack.clone());
                self.subgroup_ids = ids;
            }
            AssignmentMode::MixIn => {
                match self
                    .mix_ins
                    .iter_mut()
                    .find(|m| m.asset_pack == combination.asset_pack)
                {
                    Some(entry) => entry.subgroup_ids = ids,
                    None => self.mix_ins.push(MixInAssignment {
                        asset_pack: combination.asset_pack.clone(),
                        subgroup_ids: ids,
                    }),
                }
            }
            AssignmentMode::Replacer { replacer } => {
                match self.replacers.iter_mut().find(|r| &r.replacer == replacer) {
                    Some(entry) => {
                        entry.asset_pack = combination.asset_pack.clone();
                        entry.subgroup_ids = ids;
                    }
                    None => self.replacers.push(ReplacerAssignment {
                        asset_pack: combination.asset_pack.clone(),
                        replacer: replacer.clone(),
                        subgroup_ids: ids,
                    }),
                }
            }
        }
    }
}

/// Whether a pre-determined combination (consistency, linked group, linked
/// unique NPC) may be reused given the NPC's explicit assignment.
pub fn combination_allowed_by_assignment(
    specific: Option<&NpcAssignment>,
    mode: &AssignmentMode,
    combination: &Combination,
    packs: &[Arc<FlattenedAssetPack>],
) -> bool {
    match specific.and_then(|a| a.pin_for(mode, packs)) {
        Some(pin) => pin.allows(combination),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::Gender;
    use crate::pack::{flatten_asset_pack, AssetPack, RaceGroupings, Subgroup};

    fn pack(name: &str) -> Arc<FlattenedAssetPack> {
        let authored = AssetPack::new(name, Gender::Male)
            .with_subgroup(
                Subgroup::new("A", "A")
                    .with_subgroup(Subgroup::new("A1", "A1"))
                    .with_subgroup(Subgroup::new("A2", "A2")),
            )
            .with_subgroup(Subgroup::new("B", "B"));
        flatten_asset_pack(&authored, &RaceGroupings::new()).pack
    }

    fn combination(p: &Arc<FlattenedAssetPack>, first: &str) -> Combination {
        Combination::new(
            p.name.clone(),
            vec![p.find(0, first).unwrap().clone(), p.find(1, "B").unwrap().clone()],
        )
    }

    #[test]
    fn test_pin_for_modes() {
        let packs = vec![pack("Main"), pack("Tattoos")];
        let assignment = NpcAssignment::primary("Main", ["A1"])
            .with_mix_in("Tattoos", ["B"])
            .with_mix_in("Missing", ["X"])
            .with_replacer("Tattoos", "Hair", ["A2"]);

        let primary = assignment.pin_for(&AssignmentMode::Primary, &packs).unwrap();
        assert_eq!(primary.asset_pack, "Main");

        let mix_in = assignment.pin_for(&AssignmentMode::MixIn, &packs[1..]).unwrap();
        assert_eq!(mix_in.subgroup_ids, vec!["B".to_string()]);

        let hair = AssignmentMode::Replacer {
            replacer: "Hair".into(),
        };
        assert!(assignment.pin_for(&hair, &packs).is_some());
        assert!(assignment.pin_for(&hair, &packs[..1]).is_none());
        assert!(NpcAssignment::new().pin_for(&AssignmentMode::Primary, &packs).is_none());
    }

    #[test]
    fn test_pin_allows_by_contained_ids() {
        let p = pack("Main");
        let combo = combination(&p, "A2");

        let by_parent = Pin {
            asset_pack: "Main".into(),
            subgroup_ids: vec!["A".into()],
        };
        let by_other_leaf = Pin {
            asset_pack: "Main".into(),
            subgroup_ids: vec!["A1".into()],
        };
        let other_pack = Pin {
            asset_pack: "Other".into(),
            subgroup_ids: vec![],
        };
        assert!(by_parent.allows(&combo));
        assert!(!by_other_leaf.allows(&combo));
        assert!(!other_pack.allows(&combo));
    }

    #[test]
    fn test_record_replaces_entries() {
        let p = pack("Main");
        let mut record = NpcAssignment::new();

        record.record(&AssignmentMode::Primary, &combination(&p, "A1"));
        record.record(&AssignmentMode::MixIn, &combination(&p, "A1"));
        record.record(&AssignmentMode::MixIn, &combination(&p, "A2"));

        assert_eq!(record.asset_pack.as_deref(), Some("Main"));
        assert_eq!(record.subgroup_ids, vec!["A1".to_string(), "B".to_string()]);
        assert_eq!(record.mix_ins.len(), 1);
        assert_eq!(record.mix_ins[0].subgroup_ids[0], "A2");
    }

    #[test]
    fn test_combination_allowed_without_pin() {
        let p = pack("Main");
        let packs = vec![p.clone()];
        let combo = combination(&p, "A1");
        assert!(combination_allowed_by_assignment(None, &AssignmentMode::Primary, &combo, &packs));

        let specific = NpcAssignment::primary("Main", ["A2"]);
        assert!(!combination_allowed_by_assignment(
            Some(&specific),
            &AssignmentMode::Primary,
            &combo,
            &packs
        ));
    }
}
