//! Attribute trees and NPC matching.
//!
//! Eligibility rules are authored as AND-lists of OR-attributes:
//!
//! - [`AttributeNode`]: one typed condition (race, class, faction, ...)
//!   with an optional ForceIf flag
//! - [`Attribute`]: nodes combined with OR
//! - `Vec<Attribute>`: attributes combined with AND
//! - [`AttributeGroup`] / [`GroupTable`]: reusable named lists referenced by
//!   `Group` nodes and expanded with cycle protection
//!
//! [`AttributeMatcher`] evaluates a list against an
//! [`NpcDescriptor`](crate::npc::NpcDescriptor) and reports the ForceIf
//! weight used later to rank already-eligible candidates.

mod expand;
mod matcher;
mod types;

pub use expand::Expansion;
pub use matcher::{AttributeMatcher, MatchOutcome};
pub use types::{
    Attribute, AttributeGroup, AttributeKind, AttributeNode, GroupTable, DEFAULT_RANK_MAX,
    DEFAULT_RANK_MIN,
};
