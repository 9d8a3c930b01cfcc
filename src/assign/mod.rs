//! Roster assignment.
//!
//! [`AssetAssigner`] drives filtering and generation for each NPC of a
//! roster, honoring consistency records, linked NPC groups and same-name
//! unique NPCs. The stores backing the linking live in [`store`] and are
//! owned by the assigner, not by the process.

mod config;
mod runner;
pub mod store;

pub use config::AssignerConfig;
pub use runner::{AssetAssigner, Assigned, CombinationSource, NpcJob, NpcOutcome};
pub use store::{LinkedGroupStore, LinkedNpcGroup, UniqueNpcStore};
