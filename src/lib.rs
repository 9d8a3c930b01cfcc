//! Subgroup combination engine for NPC asset packs.
//!
//! An asset pack is a forest of subgroups: each top-level subgroup is a
//! *slot*, and each leaf below it is a *candidate* for that slot. Assigning
//! an NPC means picking exactly one candidate per slot of one pack such that
//! every candidate is eligible for the NPC and all required/excluded
//! relations between the chosen candidates hold.
//!
//! - [`attribute`]: attribute trees, group expansion and NPC matching.
//! - [`pack`]: authored packs and their flattened, immutable form.
//! - [`selection`]: weighted and ForceIf-prioritized random selection.
//! - [`filter`]: per-NPC eligibility filtering of flattened packs.
//! - [`generator`]: seeded depth-first search for one valid combination.
//! - [`assign`]: per-NPC driver and roster runs with consistency and linking.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use u_variants::filter::{EligibilityFilter, FilterRequest};
//! use u_variants::generator::{CombinationGenerator, GenerationSession};
//! use u_variants::npc::{Gender, NpcDescriptor};
//! use u_variants::pack::{flatten_asset_pack, AssetPack, RaceGroupings, Subgroup};
//!
//! let pack = AssetPack::new("Skin", Gender::Male)
//!     .with_subgroup(
//!         Subgroup::new("A", "Age")
//!             .with_subgroup(Subgroup::new("A1", "Young"))
//!             .with_subgroup(Subgroup::new("A2", "Old").excludes("S1")),
//!     )
//!     .with_subgroup(
//!         Subgroup::new("S", "Scars")
//!             .with_subgroup(Subgroup::new("S1", "None"))
//!             .with_subgroup(Subgroup::new("S2", "Battle")),
//!     );
//! let packs = vec![flatten_asset_pack(&pack, &RaceGroupings::new()).pack];
//!
//! let npc = NpcDescriptor::new("00012345", "NordRace", Gender::Male);
//! let filtered = EligibilityFilter::filter(&packs, &npc, &FilterRequest::default());
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mut session = GenerationSession::new(npc.log_id());
//! let combination = CombinationGenerator::default()
//!     .generate(&mut session, &filtered.packs, &mut rng)
//!     .unwrap();
//! assert_ne!(combination.signature, "Skin:A2|S1");
//! ```

pub mod assign;
pub mod attribute;
pub mod error;
pub mod filter;
pub mod generator;
pub mod npc;
pub mod pack;
pub mod selection;
