//! Per-NPC assignment and roster runs.

use super::config::AssignerConfig;
use super::store::{LinkedGroupStore, UniqueNpcStore};
use crate::error::AssignmentError;
use crate::filter::{
    combination_allowed_by_assignment, AssignmentMode, EligibilityFilter, FilterOutcome,
    FilterRequest, NpcAssignment,
};
use crate::generator::{Combination, CombinationGenerator, GenerationSession};
use crate::npc::NpcDescriptor;
use crate::pack::{BodyShapeDescriptor, FlattenedAssetPack};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const PROGRESS_INTERVAL: usize = 100;

/// One NPC of a roster together with its assignment records.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpcJob {
    pub npc: NpcDescriptor,
    /// Explicit, user-authored assignment.
    pub specific: Option<NpcAssignment>,
    /// Assignment carried over from earlier runs; updated in place.
    pub consistency: NpcAssignment,
    /// Descriptors of the body shape already assigned, if any.
    pub body_shape: Option<BTreeSet<BodyShapeDescriptor>>,
}

impl NpcJob {
    pub fn new(npc: NpcDescriptor) -> Self {
        Self {
            npc,
            specific: None,
            consistency: NpcAssignment::default(),
            body_shape: None,
        }
    }

    pub fn with_specific(mut self, assignment: NpcAssignment) -> Self {
        self.specific = Some(assignment);
        self
    }

    pub fn with_consistency(mut self, assignment: NpcAssignment) -> Self {
        self.consistency = assignment;
        self
    }

    pub fn with_body_shape(mut self, descriptors: BTreeSet<BodyShapeDescriptor>) -> Self {
        self.body_shape = Some(descriptors);
        self
    }
}

/// Where an assigned combination came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinationSource {
    /// Copied from the primary of the NPC's linked group.
    LinkedGroup,
    /// Copied from an earlier unique NPC with the same name and gender.
    LinkedUnique,
    Generated,
    /// Generated after the consistency assignment could not be honored.
    GeneratedIgnoringConsistency,
}

impl fmt::Display for CombinationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinationSource::LinkedGroup => write!(f, "linked group"),
            CombinationSource::LinkedUnique => write!(f, "linked unique NPC"),
            CombinationSource::Generated => write!(f, "generated"),
            CombinationSource::GeneratedIgnoringConsistency => {
                write!(f, "generated ignoring consistency")
            }
        }
    }
}

/// A successful assignment.
#[derive(Debug, Clone)]
pub struct Assigned {
    pub combination: Combination,
    pub source: CombinationSource,
    /// Filter and search trace for this NPC.
    pub report: Vec<String>,
}

/// Result for one NPC of a roster run.
#[derive(Debug, Clone)]
pub struct NpcOutcome {
    /// Index of the NPC in the roster.
    pub index: usize,
    pub npc: String,
    pub result: Result<Assigned, AssignmentError>,
}

impl NpcOutcome {
    pub fn is_assigned(&self) -> bool {
        self.result.is_ok()
    }

    pub fn combination(&self) -> Option<&Combination> {
        self.result.as_ref().ok().map(|a| &a.combination)
    }
}

/// Assigns combinations to NPCs, one NPC at a time.
///
/// For each NPC the assigner restricts the offered packs to the NPC's gender,
/// reuses a combination from its linked group or linked unique NPCs when the
/// NPC's explicit assignment allows it, and otherwise filters and generates.
/// When generation fails while the filter was restricted to the consistency
/// pack, the search is retried once without consistency, continuing the same
/// [`GenerationSession`]. Successful combinations are written back to the
/// consistency record and the linking stores.
///
/// # Examples
///
/// ```
/// use u_variants::assign::{AssetAssigner, AssignerConfig, NpcJob};
/// use u_variants::filter::AssignmentMode;
/// use u_variants::npc::{Gender, NpcDescriptor};
/// use u_variants::pack::{flatten_asset_pack, AssetPack, RaceGroupings, Subgroup};
///
/// let pack = AssetPack::new("Faces", Gender::Female)
///     .with_subgroup(Subgroup::new("F1", "Freckles"))
///     .with_subgroup(Subgroup::new("E", "Eyes").with_subgroup(Subgroup::new("E1", "Blue")));
/// let packs = vec![flatten_asset_pack(&pack, &RaceGroupings::new()).pack];
///
/// let assigner = AssetAssigner::new(AssignerConfig::default().with_seed(1));
/// let mut roster = vec![NpcJob::new(NpcDescriptor::new("01", "NordRace", Gender::Female))];
/// let outcomes = assigner.assign_roster(&mut roster, &packs, &AssignmentMode::Primary);
///
/// assert_eq!(outcomes[0].combination().unwrap().signature, "Faces:F1|E1");
/// assert_eq!(roster[0].consistency.subgroup_ids, vec!["F1", "E1"]);
/// ```
#[derive(Debug)]
pub struct AssetAssigner {
    config: AssignerConfig,
    generator: CombinationGenerator,
    unique: UniqueNpcStore,
    linked: LinkedGroupStore,
}

impl AssetAssigner {
    /// # Panics
    /// Panics if the configuration is invalid (call
    /// [`AssignerConfig::validate`] first to get a descriptive error).
    pub fn new(config: AssignerConfig) -> Self {
        config.validate().expect("invalid AssignerConfig");
        let generator = CombinationGenerator::new(config.generator.clone());
        Self {
            config,
            generator,
            unique: UniqueNpcStore::new(),
            linked: LinkedGroupStore::new(),
        }
    }

    pub fn with_linked_groups(mut self, linked: LinkedGroupStore) -> Self {
        self.linked = linked;
        self
    }

    pub fn config(&self) -> &AssignerConfig {
        &self.config
    }

    pub fn unique_store(&self) -> &UniqueNpcStore {
        &self.unique
    }

    pub fn linked_store(&self) -> &LinkedGroupStore {
        &self.linked
    }

    /// Assigns one NPC in `mode`, updating `job.consistency` on success.
    pub fn assign<R: Rng>(
        &self,
        job: &mut NpcJob,
        packs: &[Arc<FlattenedAssetPack>],
        mode: &AssignmentMode,
        rng: &mut R,
    ) -> Result<Assigned, AssignmentError> {
        let npc = self.config.race_aliases.apply(&job.npc);
        let npc_id = npc.log_id();

        let offered: Vec<Arc<FlattenedAssetPack>> = packs
            .iter()
            .filter(|p| p.gender == npc.gender)
            .cloned()
            .collect();
        if offered.is_empty() {
            return Err(AssignmentError::NoEligibleAssetPack {
                npc: npc_id,
                reasons: vec![format!("No {} asset packs are available", npc.gender)],
            });
        }

        if let Some(assigned) = self.reuse_linked(&npc, job.specific.as_ref(), mode, &offered) {
            debug!(npc = %npc_id, source = %assigned.source, combination = %assigned.combination, "reusing linked combination");
            self.record(&npc, job, mode, &assigned.combination);
            return Ok(assigned);
        }

        let mut session = GenerationSession::new(npc_id.clone());
        let consistency = self
            .config
            .enable_consistency
            .then_some(&job.consistency);
        let request = FilterRequest {
            mode: mode.clone(),
            specific: job.specific.as_ref(),
            consistency,
            ignore_consistency: false,
            body_shape: job.body_shape.as_ref(),
        };

        let outcome = EligibilityFilter::filter(&offered, &npc, &request);
        let first = self.generate(&mut session, outcome, rng);

        let (combination, source, report) = match first {
            Ok((combination, report)) => (combination, CombinationSource::Generated, report),
            Err((err, true)) => {
                warn!(npc = %npc_id, %err, "no combination within the consistency asset pack; retrying without consistency");
                let mut report = err.reasons().to_vec();
                let retry = request.clone().with_ignore_consistency(true);
                let outcome = EligibilityFilter::filter(&offered, &npc, &retry);
                match self.generate(&mut session, outcome, rng) {
                    Ok((combination, more)) => {
                        report.extend(more);
                        (combination, CombinationSource::GeneratedIgnoringConsistency, report)
                    }
                    Err((err, _)) => return Err(err),
                }
            }
            Err((err, false)) => return Err(err),
        };

        self.record(&npc, job, mode, &combination);
        Ok(Assigned {
            combination,
            source,
            report,
        })
    }

    /// Assigns every NPC of `roster` in `mode`.
    ///
    /// Each NPC draws from its own RNG, derived from the configured seed and
    /// its roster index, so results do not depend on scheduling.
    pub fn assign_roster(
        &self,
        roster: &mut [NpcJob],
        packs: &[Arc<FlattenedAssetPack>],
        mode: &AssignmentMode,
    ) -> Vec<NpcOutcome> {
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        let total = roster.len();
        let done = AtomicUsize::new(0);
        info!(npcs = total, asset_packs = packs.len(), %mode, "assigning roster");

        let run_one = |index: usize, job: &mut NpcJob| {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(index as u64));
            let result = self.assign(job, packs, mode, &mut rng);
            if let Err(err) = &result {
                warn!(npc = %job.npc.log_id(), %err, "assignment failed");
            }
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if finished % PROGRESS_INTERVAL == 0 {
                info!(finished, total, "roster progress");
            }
            NpcOutcome {
                index,
                npc: job.npc.log_id(),
                result,
            }
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<NpcOutcome> = if self.config.parallel {
            roster
                .par_iter_mut()
                .enumerate()
                .map(|(i, job)| run_one(i, job))
                .collect()
        } else {
            roster.iter_mut().enumerate().map(|(i, job)| run_one(i, job)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<NpcOutcome> = roster
            .iter_mut()
            .enumerate()
            .map(|(i, job)| run_one(i, job))
            .collect();

        let assigned = outcomes.iter().filter(|o| o.is_assigned()).count();
        info!(assigned, failed = total - assigned, "roster finished");
        outcomes
    }

    fn reuse_linked(
        &self,
        npc: &NpcDescriptor,
        specific: Option<&NpcAssignment>,
        mode: &AssignmentMode,
        offered: &[Arc<FlattenedAssetPack>],
    ) -> Option<Assigned> {
        let usable = |combination: &Combination| {
            offered.iter().any(|p| p.name == combination.asset_pack)
                && combination_allowed_by_assignment(specific, mode, combination, offered)
        };

        if let Some(combination) = self.linked.get(&npc.key, mode) {
            if usable(&combination) {
                return Some(Assigned {
                    combination,
                    source: CombinationSource::LinkedGroup,
                    report: vec!["Using the combination of the linked group primary".into()],
                });
            }
            debug!(npc = %npc.log_id(), "linked group combination conflicts with the specific assignment");
        }

        if self.config.link_npcs_with_same_name
            && npc.is_valid_linked_unique(&self.config.unique_name_exclusions)
        {
            if let Some(combination) = self.unique.get(&npc.name, npc.gender, mode) {
                if usable(&combination) {
                    return Some(Assigned {
                        combination,
                        source: CombinationSource::LinkedUnique,
                        report: vec![format!(
                            "Using the combination assigned to unique NPC {}",
                            npc.name
                        )],
                    });
                }
                debug!(npc = %npc.log_id(), "linked unique combination conflicts with the specific assignment");
            }
        }
        None
    }

    /// Runs the generator on a filter outcome. On failure, also tells
    /// whether the outcome had been restricted to the consistency pack.
    fn generate<R: Rng>(
        &self,
        session: &mut GenerationSession,
        outcome: FilterOutcome,
        rng: &mut R,
    ) -> Result<(Combination, Vec<String>), (AssignmentError, bool)> {
        let by_consistency = outcome.filtered_by_consistency;
        let mut report = outcome.report;
        if outcome.packs.is_empty() {
            let err = AssignmentError::NoEligibleAssetPack {
                npc: session.npc().to_string(),
                reasons: report,
            };
            return Err((err, by_consistency));
        }

        match self.generator.generate(session, &outcome.packs, rng) {
            Ok(combination) => Ok((combination, report)),
            Err(err) => Err((prepend_report(err, &mut report), by_consistency)),
        }
    }

    fn record(&self, npc: &NpcDescriptor, job: &mut NpcJob, mode: &AssignmentMode, combination: &Combination) {
        if self.config.enable_consistency {
            job.consistency.record(mode, combination);
        }
        self.linked.record(&npc.key, mode, combination);
        if self.config.link_npcs_with_same_name
            && npc.is_valid_linked_unique(&self.config.unique_name_exclusions)
        {
            self.unique.record_if_absent(&npc.name, npc.gender, mode, combination);
        }
    }
}

fn prepend_report(err: AssignmentError, report: &mut Vec<String>) -> AssignmentError {
    match err {
        AssignmentError::NoEligibleAssetPack { npc, reasons } => {
            report.extend(reasons);
            AssignmentError::NoEligibleAssetPack {
                npc,
                reasons: std::mem::take(report),
            }
        }
        AssignmentError::SearchExhausted {
            npc,
            pack_count,
            reasons,
        } => {
            report.extend(reasons);
            AssignmentError::SearchExhausted {
                npc,
                pack_count,
                reasons: std::mem::take(report),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::LinkedNpcGroup;
    use crate::npc::{Gender, RaceAliases};
    use crate::pack::{flatten_asset_pack, AssetPack, EligibilityRules, RaceGroupings, Subgroup};

    fn flatten(pack: AssetPack) -> Arc<FlattenedAssetPack> {
        flatten_asset_pack(&pack, &RaceGroupings::new()).pack
    }

    /// Two slots with three leaves each: nine combinations, all valid.
    fn open_pack(name: &str, gender: Gender) -> AssetPack {
        AssetPack::new(name, gender)
            .with_subgroup(
                Subgroup::new("T", "Texture")
                    .with_subgroup(Subgroup::new("T1", "T1"))
                    .with_subgroup(Subgroup::new("T2", "T2"))
                    .with_subgroup(Subgroup::new("T3", "T3")),
            )
            .with_subgroup(
                Subgroup::new("M", "Mesh")
                    .with_subgroup(Subgroup::new("M1", "M1"))
                    .with_subgroup(Subgroup::new("M2", "M2"))
                    .with_subgroup(Subgroup::new("M3", "M3")),
            )
    }

    fn female(key: &str, name: &str) -> NpcDescriptor {
        NpcDescriptor::new(key, "NordRace", Gender::Female)
            .with_name(name)
            .with_unique(true)
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_assign_records_consistency() {
        let packs = vec![flatten(open_pack("P", Gender::Female))];
        let assigner = AssetAssigner::new(AssignerConfig::default());
        let mut job = NpcJob::new(female("01", "Lydia"));

        let assigned = assigner
            .assign(&mut job, &packs, &AssignmentMode::Primary, &mut rng(1))
            .unwrap();

        assert_eq!(assigned.source, CombinationSource::Generated);
        assert_eq!(job.consistency.asset_pack.as_deref(), Some("P"));
        assert_eq!(job.consistency.subgroup_ids, assigned.combination.subgroup_ids());
    }

    #[test]
    fn test_consistency_disabled_leaves_record() {
        let packs = vec![flatten(open_pack("P", Gender::Female))];
        let assigner = AssetAssigner::new(AssignerConfig::default().with_consistency(false));
        let mut job = NpcJob::new(female("01", "Lydia"));

        assigner
            .assign(&mut job, &packs, &AssignmentMode::Primary, &mut rng(1))
            .unwrap();
        assert_eq!(job.consistency, NpcAssignment::default());
    }

    #[test]
    fn test_consistency_reproduced() {
        let packs = vec![
            flatten(open_pack("P", Gender::Female)),
            flatten(open_pack("Q", Gender::Female)),
        ];
        let assigner = AssetAssigner::new(AssignerConfig::default());
        let mut job = NpcJob::new(female("01", "Lydia"))
            .with_consistency(NpcAssignment::primary("Q", ["T2", "M3"]));

        for seed in 0..20 {
            let assigned = assigner
                .assign(&mut job, &packs, &AssignmentMode::Primary, &mut rng(seed))
                .unwrap();
            assert_eq!(assigned.combination.signature, "Q:T2|M3");
        }
    }

    #[test]
    fn test_consistency_fallback_continues_session() {
        // the recorded pair T1 + M2 is no longer valid: T1 now requires M1
        let pack = AssetPack::new("P", Gender::Female)
            .with_subgroup(
                Subgroup::new("T", "Texture")
                    .with_subgroup(Subgroup::new("T1", "T1").requires("M1"))
                    .with_subgroup(Subgroup::new("T2", "T2")),
            )
            .with_subgroup(
                Subgroup::new("M", "Mesh")
                    .with_subgroup(Subgroup::new("M1", "M1"))
                    .with_subgroup(Subgroup::new("M2", "M2")),
            );
        let packs = vec![flatten(pack)];
        let assigner = AssetAssigner::new(AssignerConfig::default());
        let mut job = NpcJob::new(female("01", "Lydia"))
            .with_consistency(NpcAssignment::primary("P", ["T1", "M2"]));

        let assigned = assigner
            .assign(&mut job, &packs, &AssignmentMode::Primary, &mut rng(3))
            .unwrap();

        assert_eq!(assigned.source, CombinationSource::GeneratedIgnoringConsistency);
        assert_ne!(assigned.combination.signature, "P:T1|M2");
        assert!(assigned.report.iter().any(|l| l.contains("consistency")));
        assert_eq!(job.consistency.subgroup_ids, assigned.combination.subgroup_ids());
    }

    #[test]
    fn test_gender_partition() {
        let packs = vec![flatten(open_pack("P", Gender::Female))];
        let assigner = AssetAssigner::new(AssignerConfig::default());
        let mut job = NpcJob::new(NpcDescriptor::new("02", "NordRace", Gender::Male));

        let err = assigner
            .assign(&mut job, &packs, &AssignmentMode::Primary, &mut rng(1))
            .unwrap_err();
        assert!(matches!(err, AssignmentError::NoEligibleAssetPack { .. }));
        assert!(err.reasons()[0].contains("male"));
    }

    #[test]
    fn test_race_alias_applied() {
        let mut rules = EligibilityRules::default();
        rules.allowed_races = ["NordRace".to_string()].into_iter().collect();
        let packs = vec![flatten(
            open_pack("P", Gender::Female).with_distribution_rules(rules),
        )];
        let npc = NpcDescriptor::new("03", "ElderRace", Gender::Female);

        let plain = AssetAssigner::new(AssignerConfig::default());
        assert!(plain
            .assign(&mut NpcJob::new(npc.clone()), &packs, &AssignmentMode::Primary, &mut rng(1))
            .is_err());

        let aliased = AssetAssigner::new(
            AssignerConfig::default()
                .with_race_aliases(RaceAliases::new().with_alias("ElderRace", "NordRace")),
        );
        assert!(aliased
            .assign(&mut NpcJob::new(npc), &packs, &AssignmentMode::Primary, &mut rng(1))
            .is_ok());
    }

    #[test]
    fn test_linked_uniques_share_combination() {
        let packs = vec![flatten(open_pack("P", Gender::Female))];
        let assigner =
            AssetAssigner::new(AssignerConfig::default().with_link_npcs_with_same_name(true));
        let mut first = NpcJob::new(female("01", "Lydia"));
        let mut second = NpcJob::new(female("02", "Lydia"));

        let a = assigner
            .assign(&mut first, &packs, &AssignmentMode::Primary, &mut rng(1))
            .unwrap();
        let b = assigner
            .assign(&mut second, &packs, &AssignmentMode::Primary, &mut rng(2))
            .unwrap();

        assert_eq!(b.source, CombinationSource::LinkedUnique);
        assert_eq!(a.combination.signature, b.combination.signature);
        assert_eq!(second.consistency.subgroup_ids, a.combination.subgroup_ids());
    }

    #[test]
    fn test_linked_unique_yields_to_specific_assignment() {
        let packs = vec![flatten(open_pack("P", Gender::Female))];
        let assigner =
            AssetAssigner::new(AssignerConfig::default().with_link_npcs_with_same_name(true));
        let mut first = NpcJob::new(female("01", "Lydia"))
            .with_specific(NpcAssignment::primary("P", ["T1"]));
        let mut second = NpcJob::new(female("02", "Lydia"))
            .with_specific(NpcAssignment::primary("P", ["T2"]));

        assigner
            .assign(&mut first, &packs, &AssignmentMode::Primary, &mut rng(1))
            .unwrap();
        let b = assigner
            .assign(&mut second, &packs, &AssignmentMode::Primary, &mut rng(2))
            .unwrap();

        assert_eq!(b.source, CombinationSource::Generated);
        assert!(b.combination.contains_id("T2"));
    }

    #[test]
    fn test_excluded_names_not_linked() {
        let packs = vec![flatten(open_pack("P", Gender::Female))];
        let assigner = AssetAssigner::new(
            AssignerConfig::default()
                .with_link_npcs_with_same_name(true)
                .with_unique_name_exclusion("bandit"),
        );
        let mut job = NpcJob::new(female("01", "Bandit"));

        assigner
            .assign(&mut job, &packs, &AssignmentMode::Primary, &mut rng(1))
            .unwrap();
        assert!(assigner.unique_store().is_empty());
    }

    #[test]
    fn test_linked_group_members_copy_primary() {
        let packs = vec![flatten(open_pack("P", Gender::Female))];
        let groups = LinkedGroupStore::new().with_group(LinkedNpcGroup::new("Sisters", "01", ["02", "03"]));
        let assigner = AssetAssigner::new(AssignerConfig::default()).with_linked_groups(groups);

        let mut roster = vec![
            NpcJob::new(female("01", "Ada")),
            NpcJob::new(female("02", "Bea")),
            NpcJob::new(female("03", "Cyd")),
        ];
        let outcomes = assigner.assign_roster(&mut roster, &packs, &AssignmentMode::Primary);

        let primary = outcomes[0].combination().unwrap().signature.clone();
        for outcome in &outcomes[1..] {
            let assigned = outcome.result.as_ref().unwrap();
            assert_eq!(assigned.source, CombinationSource::LinkedGroup);
            assert_eq!(assigned.combination.signature, primary);
        }
    }

    #[test]
    fn test_modes_recorded_separately() {
        let packs = vec![
            flatten(open_pack("Base", Gender::Female)),
            flatten(open_pack("Extra", Gender::Female)),
        ];
        let assigner = AssetAssigner::new(AssignerConfig::default());
        let mut job = NpcJob::new(female("01", "Lydia"));

        let primary = assigner
            .assign(&mut job, &packs[..1], &AssignmentMode::Primary, &mut rng(1))
            .unwrap();
        let mix_in = assigner
            .assign(&mut job, &packs[1..], &AssignmentMode::MixIn, &mut rng(1))
            .unwrap();
        let replacer = AssignmentMode::Replacer {
            replacer: "Eyes".into(),
        };
        assigner
            .assign(&mut job, &packs[1..], &replacer, &mut rng(1))
            .unwrap();

        assert_eq!(job.consistency.asset_pack.as_deref(), Some("Base"));
        assert_eq!(job.consistency.subgroup_ids, primary.combination.subgroup_ids());
        assert_eq!(job.consistency.mix_ins.len(), 1);
        assert_eq!(job.consistency.mix_ins[0].subgroup_ids, mix_in.combination.subgroup_ids());
        assert_eq!(job.consistency.replacers.len(), 1);
        assert_eq!(job.consistency.replacers[0].replacer, "Eyes");
    }

    #[test]
    fn test_roster_reproducible_with_seed() {
        let packs = vec![
            flatten(open_pack("P", Gender::Female)),
            flatten(open_pack("Q", Gender::Male)),
        ];
        let make_roster = || -> Vec<NpcJob> {
            (0..250)
                .map(|i| {
                    let gender = if i % 2 == 0 { Gender::Female } else { Gender::Male };
                    NpcJob::new(NpcDescriptor::new(format!("{:04}", i), "NordRace", gender))
                })
                .collect()
        };

        let assigner = AssetAssigner::new(AssignerConfig::default().with_seed(42));
        let mut a = make_roster();
        let mut b = make_roster();
        let first = assigner.assign_roster(&mut a, &packs, &AssignmentMode::Primary);
        let second = assigner.assign_roster(&mut b, &packs, &AssignmentMode::Primary);

        assert_eq!(first.len(), 250);
        assert!(first.iter().all(NpcOutcome::is_assigned));
        for (x, y) in first.iter().zip(&second) {
            assert_eq!(x.index, y.index);
            assert_eq!(x.combination().map(|c| &c.signature), y.combination().map(|c| &c.signature));
        }
        assert_eq!(a[1].consistency.asset_pack.as_deref(), Some("Q"));
    }
}
