//! Error taxonomy.
//!
//! Two families of errors exist:
//!
//! - [`ConfigError`]: authoring mistakes found while expanding attribute
//!   groups or flattening an asset pack. These are collected as diagnostics
//!   and logged; the offending reference is dropped and the run continues.
//! - [`AssignmentError`]: per-NPC failures. Neither is fatal to a roster run;
//!   callers report them and move on to the next NPC.

use thiserror::Error;

/// An authoring error detected while building flattened configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A group label references itself, directly or transitively.
    #[error("circular attribute group reference: {}", path.join(" -> "))]
    CircularGroupReference {
        /// Labels visited, ending with the label that closed the cycle.
        path: Vec<String>,
    },

    /// A group node references a label that no group defines.
    #[error("attribute group `{0}` is not defined")]
    UnknownGroupLabel(String),

    /// A required/excluded subgroup id does not exist in the asset pack.
    #[error("subgroup `{subgroup}` in asset pack `{asset_pack}` references unknown subgroup `{reference}`")]
    UnknownSubgroupReference {
        asset_pack: String,
        subgroup: String,
        reference: String,
    },

    /// Two enabled subgroups of one asset pack share an id. The first one
    /// (in depth-first order) keeps the id for constraint resolution.
    #[error("subgroup id `{subgroup}` appears more than once in asset pack `{asset_pack}`")]
    DuplicateSubgroupId { asset_pack: String, subgroup: String },

    /// A subgroup's own requirements can never be satisfied at its position.
    #[error("subgroup `{subgroup}` in asset pack `{asset_pack}` can never be selected: {reason}")]
    UnsatisfiableSubgroup {
        asset_pack: String,
        subgroup: String,
        reason: String,
    },
}

/// Why no combination could be produced for an NPC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// No asset pack survived eligibility filtering.
    #[error("no valid asset packs could be found for NPC {npc}")]
    NoEligibleAssetPack {
        npc: String,
        /// Report lines explaining the eliminations.
        reasons: Vec<String>,
    },

    /// Every seed subgroup was tried and none led to a full combination.
    #[error("no seed subgroups remain for NPC {npc}; a valid combination cannot be assigned across {pack_count} asset pack(s)")]
    SearchExhausted {
        npc: String,
        pack_count: usize,
        /// Report lines explaining why each seed was abandoned.
        reasons: Vec<String>,
    },
}

impl AssignmentError {
    /// The human-readable reason chain attached to this failure.
    pub fn reasons(&self) -> &[String] {
        match self {
            AssignmentError::NoEligibleAssetPack { reasons, .. }
            | AssignmentError::SearchExhausted { reasons, .. } => reasons,
        }
    }
}
