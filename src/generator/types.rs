//! Combination results and per-NPC session state.

use crate::pack::{FlattenedSubgroup, DISTRIBUTION_RULES_ID};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// One subgroup per slot of one asset pack.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combination {
    pub asset_pack: String,
    /// Chosen subgroups in slot order.
    pub subgroups: Vec<Arc<FlattenedSubgroup>>,
    /// `<pack>:<id>|<id>|...`, identifying the combination.
    pub signature: String,
}

impl Combination {
    pub fn new(asset_pack: impl Into<String>, subgroups: Vec<Arc<FlattenedSubgroup>>) -> Self {
        let asset_pack = asset_pack.into();
        let signature = Self::signature_of(&asset_pack, subgroups.iter().map(|s| s.id.as_str()));
        Self {
            asset_pack,
            subgroups,
            signature,
        }
    }

    /// Signature for a pack and an ordered id list. The reserved
    /// distribution-rules id never contributes.
    pub fn signature_of<'a>(asset_pack: &str, ids: impl IntoIterator<Item = &'a str>) -> String {
        let ids: Vec<&str> = ids.into_iter().filter(|id| *id != DISTRIBUTION_RULES_ID).collect();
        format!("{}:{}", asset_pack, ids.join("|"))
    }

    /// Leaf ids in slot order.
    pub fn subgroup_ids(&self) -> Vec<String> {
        self.subgroups
            .iter()
            .filter(|s| s.id != DISTRIBUTION_RULES_ID)
            .map(|s| s.id.clone())
            .collect()
    }

    /// Whether any chosen subgroup (or one of its ancestors) has id `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.subgroups.iter().any(|s| s.contained_ids.contains(id))
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

/// State kept across the generation attempts for one NPC.
///
/// Signatures produced earlier in the session are never produced again.
#[derive(Debug, Clone, Default)]
pub struct GenerationSession {
    npc: String,
    signatures: BTreeSet<String>,
    attempts: usize,
}

impl GenerationSession {
    pub fn new(npc: impl Into<String>) -> Self {
        Self {
            npc: npc.into(),
            ..Self::default()
        }
    }

    /// The NPC this session belongs to, as used in reports.
    pub fn npc(&self) -> &str {
        &self.npc
    }

    pub fn has_generated(&self, signature: &str) -> bool {
        self.signatures.contains(signature)
    }

    pub fn signatures(&self) -> &BTreeSet<String> {
        &self.signatures
    }

    /// Number of `generate` calls made with this session.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    pub(crate) fn record(&mut self, signature: &str) {
        self.signatures.insert(signature.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::Gender;
    use crate::pack::{flatten_asset_pack, AssetPack, RaceGroupings, Subgroup};

    #[test]
    fn test_signature_format() {
        let pack = AssetPack::new("Bodies", Gender::Female)
            .with_subgroup(Subgroup::new("T", "T").with_subgroup(Subgroup::new("T1", "T1")))
            .with_subgroup(Subgroup::new("M", "M"));
        let flat = flatten_asset_pack(&pack, &RaceGroupings::new()).pack;
        let combo = Combination::new("Bodies", vec![flat.slots[0][0].clone(), flat.slots[1][0].clone()]);

        assert_eq!(combo.signature, "Bodies:T1|M");
        assert_eq!(combo.subgroup_ids(), vec!["T1".to_string(), "M".to_string()]);
        assert!(combo.contains_id("T"));
        assert!(!combo.contains_id("X"));
    }

    #[test]
    fn test_signature_skips_reserved_id() {
        let sig = Combination::signature_of("P", ["A", DISTRIBUTION_RULES_ID, "B"]);
        assert_eq!(sig, "P:A|B");
    }

    #[test]
    fn test_session_records() {
        let mut session = GenerationSession::new("Lydia");
        assert!(!session.has_generated("P:A"));
        session.record("P:A");
        assert!(session.has_generated("P:A"));
        assert_eq!(session.npc(), "Lydia");
    }
}
