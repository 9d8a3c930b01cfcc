//! Combination generation.
//!
//! Turns the filtered packs of one NPC into a [`Combination`]: one subgroup
//! per slot, all required/excluded constraints satisfied, never repeating a
//! signature already produced in the same [`GenerationSession`].
//!
//! The search is a randomized depth-first search. Termination follows from
//! the candidate pool shrinking strictly on every rejection, backtrack and
//! abandoned seed; [`GeneratorConfig::max_steps_per_seed`] additionally
//! bounds the work spent on any one seed.

mod config;
mod runner;
mod types;

pub use config::GeneratorConfig;
pub use runner::CombinationGenerator;
pub use types::{Combination, GenerationSession};
