//! Eligibility filtering.
//!
//! Before any search, the flattened packs are narrowed to what one NPC may
//! receive:
//!
//! 1. an explicit assignment restricts to its pack and pins slots
//! 2. whole-pack rules drop ineligible packs
//! 3. packs with fewer matched ForceIf attributes than the best are dropped
//! 4. every candidate is checked against its merged rules
//! 5. a slot left empty eliminates its pack, unless the pack is pinned
//! 6. per slot, only the candidates with the highest ForceIf score remain
//! 7. a consistency record restricts to its pack and re-pins recorded slots
//!
//! The result is a list of [`EligiblePack`]s whose slots hold [`Candidate`]s.

pub mod assignment;
mod engine;
mod types;

pub use assignment::{
    combination_allowed_by_assignment, AssignmentMode, MixInAssignment, NpcAssignment, Pin,
    ReplacerAssignment,
};
pub use engine::{check_rules, EligibilityFilter, RuleCheck};
pub use types::{Candidate, EligiblePack, FilterOutcome, FilterRequest, SlotCoord};
