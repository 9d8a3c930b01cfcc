//! Seed / fill / backtrack search.

use super::config::GeneratorConfig;
use super::types::{Combination, GenerationSession};
use crate::error::AssignmentError;
use crate::filter::{Candidate, EligiblePack};
use crate::pack::FlattenedSubgroup;
use crate::selection::{select_force_if, Prioritized, Weighted};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, warn};

type Slots = Vec<Vec<Candidate>>;

/// A seed candidate together with the eligible pack it belongs to.
struct SeedRef<'a> {
    pack: usize,
    candidate: &'a Candidate,
}

impl Weighted for SeedRef<'_> {
    fn probability_weighting(&self) -> u32 {
        self.candidate.probability_weighting()
    }
}

impl Prioritized for SeedRef<'_> {
    fn force_if_weight(&self) -> u32 {
        self.candidate.force_if_weight
    }
}

/// Builds one valid combination from filtered packs.
///
/// A seed is drawn from every candidate of every pack (ForceIf first, then by
/// weight) and fixed at its slot. The remaining slots are filled left to
/// right; each choice prunes the other slots by its required/excluded ids and
/// must agree with everything already placed. When a slot runs dry the search
/// returns to the most recent earlier slot that still has alternatives and
/// drops the choice made there. A seed whose search space is exhausted is
/// discarded and another seed is drawn.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use u_variants::filter::{EligibilityFilter, FilterRequest};
/// use u_variants::generator::{CombinationGenerator, GenerationSession};
/// use u_variants::npc::{Gender, NpcDescriptor};
/// use u_variants::pack::{flatten_asset_pack, AssetPack, RaceGroupings, Subgroup};
///
/// let pack = AssetPack::new("Bodies", Gender::Male)
///     .with_subgroup(
///         Subgroup::new("T", "Texture")
///             .with_subgroup(Subgroup::new("T1", "Pale").requires("M1"))
///             .with_subgroup(Subgroup::new("T2", "Tanned")),
///     )
///     .with_subgroup(
///         Subgroup::new("M", "Mesh")
///             .with_subgroup(Subgroup::new("M1", "Slim"))
///             .with_subgroup(Subgroup::new("M2", "Broad")),
///     );
/// let packs = vec![flatten_asset_pack(&pack, &RaceGroupings::new()).pack];
/// let npc = NpcDescriptor::new("0001", "NordRace", Gender::Male);
/// let filtered = EligibilityFilter::filter(&packs, &npc, &FilterRequest::default());
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let mut session = GenerationSession::new(npc.log_id());
/// let combination = CombinationGenerator::default()
///     .generate(&mut session, &filtered.packs, &mut rng)
///     .unwrap();
/// assert_ne!(combination.signature, "Bodies:T1|M2");
/// ```
#[derive(Debug, Clone)]
pub struct CombinationGenerator {
    config: GeneratorConfig,
}

impl Default for CombinationGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl CombinationGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        config.validate().expect("invalid GeneratorConfig");
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a combination not yet produced in `session`.
    pub fn generate<R: Rng>(
        &self,
        session: &mut GenerationSession,
        packs: &[EligiblePack],
        rng: &mut R,
    ) -> Result<Combination, AssignmentError> {
        session.begin_attempt();
        let npc = session.npc().to_string();

        if packs.is_empty() {
            return Err(AssignmentError::NoEligibleAssetPack {
                npc,
                reasons: vec!["no asset packs were offered to the generator".into()],
            });
        }

        let mut seeds: Vec<SeedRef<'_>> = packs
            .iter()
            .enumerate()
            .flat_map(|(pack, ep)| {
                ep.slots
                    .iter()
                    .flatten()
                    .map(move |candidate| SeedRef { pack, candidate })
            })
            .collect();

        let mut reasons = Vec::new();
        let mut tried = 0usize;
        loop {
            if self.config.max_seeds > 0 && tried >= self.config.max_seeds {
                reasons.push(format!("seed limit of {} reached", self.config.max_seeds));
                break;
            }
            let Some(i) = select_force_if(&seeds, rng) else {
                break;
            };
            tried += 1;
            let seed = seeds.remove(i);
            let pack = &packs[seed.pack];

            match self.search_seed(session, pack, seed.candidate, rng) {
                Ok(combination) => {
                    debug!(npc = %npc, combination = %combination, seeds_tried = tried, "generated combination");
                    session.record(&combination.signature);
                    return Ok(combination);
                }
                Err(reason) => {
                    let line = format!(
                        "Seed {} in asset pack {} abandoned: {}",
                        seed.candidate.subgroup.label(),
                        pack.name(),
                        reason
                    );
                    debug!(npc = %npc, "{}", line);
                    reasons.push(line);
                }
            }
        }

        Err(AssignmentError::SearchExhausted {
            npc,
            pack_count: packs.len(),
            reasons,
        })
    }

    fn search_seed<R: Rng>(
        &self,
        session: &GenerationSession,
        pack: &EligiblePack,
        seed: &Candidate,
        rng: &mut R,
    ) -> Result<Combination, String> {
        let n = pack.slots.len();
        let seed_pos = seed.position();
        assert!(
            seed_pos < n,
            "candidate position {} out of range for asset pack {} with {} slots",
            seed_pos,
            pack.name(),
            n
        );

        let mut slots: Slots = pack.slots.clone();
        slots[seed_pos] = vec![seed.clone()];
        let mut placed: Vec<Option<Candidate>> = vec![None; n];
        placed[seed_pos] = Some(seed.clone());

        if let Some(emptied) = propagate(&seed.subgroup, seed_pos, &mut slots, &placed) {
            return Err(format!(
                "its constraints leave no candidates at position {}",
                emptied + 1
            ));
        }

        let last = (0..n).rev().find(|&p| p != seed_pos);
        let mut snapshots: Vec<Option<Slots>> = vec![None; n];
        let mut steps = 0usize;
        let mut i = 0usize;

        while i < n {
            if i == seed_pos {
                i += 1;
                continue;
            }

            steps += 1;
            if steps > self.config.max_steps_per_seed {
                warn!(
                    asset_pack = %pack.name(),
                    seed = %seed.id(),
                    budget = self.config.max_steps_per_seed,
                    "search step budget exhausted"
                );
                return Err(format!(
                    "step budget of {} exhausted",
                    self.config.max_steps_per_seed
                ));
            }

            if snapshots[i].is_none() {
                snapshots[i] = Some(slots.clone());
            }

            if slots[i].is_empty() {
                let Some(j) = backtrack_target(i, seed_pos, &snapshots) else {
                    return Err(format!(
                        "no candidates remain at position {} and no earlier position has alternatives",
                        i + 1
                    ));
                };
                debug!(asset_pack = %pack.name(), from = i, to = j, "backtracking");

                if let (Some(tried), Some(snapshot)) = (placed[j].take(), snapshots[j].as_mut()) {
                    snapshot[j].retain(|c| c.coord != tried.coord);
                    slots = snapshot.clone();
                }
                for k in j + 1..n {
                    if k != seed_pos {
                        placed[k] = None;
                    }
                    snapshots[k] = None;
                }
                i = j;
                continue;
            }

            let Some(k) = select_force_if(&slots[i], rng) else {
                continue;
            };
            let chosen = slots[i][k].clone();

            let mut rejection = conflict_with_placed(&chosen, i, &placed);
            let mut next = None;
            if rejection.is_none() {
                let mut trial = slots.clone();
                trial[i] = vec![chosen.clone()];
                propagate(&chosen.subgroup, i, &mut trial, &placed);

                if Some(i) == last {
                    let ids = (0..n).filter_map(|p| {
                        if p == i {
                            Some(chosen.id())
                        } else {
                            placed[p].as_ref().map(Candidate::id)
                        }
                    });
                    let signature = Combination::signature_of(pack.name(), ids);
                    if session.has_generated(&signature) {
                        rejection = Some(format!("{} was already generated", signature));
                    }
                }
                next = Some(trial);
            }

            match rejection {
                Some(why) => {
                    debug!(asset_pack = %pack.name(), subgroup = %chosen.id(), position = i, "rejected: {}", why);
                    slots[i].remove(k);
                    if let Some(snapshot) = snapshots[i].as_mut() {
                        snapshot[i].retain(|c| c.coord != chosen.coord);
                    }
                }
                None => {
                    placed[i] = Some(chosen);
                    if let Some(trial) = next {
                        slots = trial;
                    }
                    i += 1;
                }
            }
        }

        let subgroups = placed.into_iter().flatten().map(|c| c.subgroup).collect();
        let combination = Combination::new(pack.name(), subgroups);
        if session.has_generated(&combination.signature) {
            return Err(format!("{} was already generated", combination.signature));
        }
        Ok(combination)
    }
}

/// Narrows every unplaced slot other than `own` by the required and
/// excluded ids of `source`. Returns the first slot left empty, if any.
fn propagate(
    source: &FlattenedSubgroup,
    own: usize,
    slots: &mut Slots,
    placed: &[Option<Candidate>],
) -> Option<usize> {
    let open = |pos: usize| pos != own && placed.get(pos).is_some_and(Option::is_none);
    let mut emptied = None;

    for (&pos, required) in &source.required_at_position {
        if let Some(slot) = slots.get_mut(pos).filter(|_| open(pos)) {
            slot.retain(|c| c.subgroup.contains_any(required));
            if slot.is_empty() {
                emptied = emptied.or(Some(pos));
            }
        }
    }
    for (&pos, excluded) in &source.excluded_at_position {
        if let Some(slot) = slots.get_mut(pos).filter(|_| open(pos)) {
            slot.retain(|c| !c.subgroup.contains_any(excluded));
            if slot.is_empty() {
                emptied = emptied.or(Some(pos));
            }
        }
    }
    emptied
}

/// Checks `chosen` at `position` against every placed candidate, in both
/// directions.
fn conflict_with_placed(chosen: &Candidate, position: usize, placed: &[Option<Candidate>]) -> Option<String> {
    for (q, other) in placed.iter().enumerate() {
        let Some(other) = other else { continue };
        if q == position {
            continue;
        }
        if let Some(ids) = other.subgroup.required_at_position.get(&position) {
            if !chosen.subgroup.contains_any(ids) {
                return Some(format!("{} requires one of ({})", other.id(), join(ids)));
            }
        }
        if let Some(ids) = other.subgroup.excluded_at_position.get(&position) {
            if chosen.subgroup.contains_any(ids) {
                return Some(format!("{} excludes ({})", other.id(), join(ids)));
            }
        }
        if let Some(ids) = chosen.subgroup.required_at_position.get(&q) {
            if !other.subgroup.contains_any(ids) {
                return Some(format!("it requires one of ({}) but {} is placed", join(ids), other.id()));
            }
        }
        if let Some(ids) = chosen.subgroup.excluded_at_position.get(&q) {
            if other.subgroup.contains_any(ids) {
                return Some(format!("it excludes ({}) but {} is placed", join(ids), other.id()));
            }
        }
    }
    None
}

/// Most recent position before `i`, other than the seed's, whose arrival
/// snapshot still offered more than one candidate.
fn backtrack_target(i: usize, seed_pos: usize, snapshots: &[Option<Slots>]) -> Option<usize> {
    (0..i)
        .rev()
        .find(|&j| j != seed_pos && snapshots[j].as_ref().is_some_and(|s| s[j].len() > 1))
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().cloned().collect::<Vec<_>>().join(", ")
}
