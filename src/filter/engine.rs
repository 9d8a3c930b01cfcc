//! Per-NPC eligibility filtering.
//!
//! Narrows the flattened packs to the candidates an NPC may receive. Every
//! step only removes; the inputs are never mutated, so the same packs can be
//! filtered concurrently for many NPCs.

use super::assignment::Pin;
use super::types::{Candidate, EligiblePack, FilterOutcome, FilterRequest, SlotCoord};
use crate::attribute::{AttributeMatcher, GroupTable};
use crate::npc::NpcDescriptor;
use crate::pack::{BodyShapeDescriptor, FlattenedAssetPack, FlattenedRules, DISTRIBUTION_RULES_ID};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of checking one rule set against one NPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCheck {
    pub eligible: bool,
    pub force_if_weight: u32,
    /// Why the rules rejected the NPC.
    pub reason: Option<String>,
}

impl RuleCheck {
    fn pass(force_if_weight: u32) -> Self {
        Self {
            eligible: true,
            force_if_weight,
            reason: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            force_if_weight: 0,
            reason: Some(reason.into()),
        }
    }
}

/// Evaluates a flattened rule set against `npc`.
///
/// Checks run in a fixed order and stop at the first failure: uniqueness,
/// allowed races, disallowed races, weight range, allowed attributes
/// (which also yield the ForceIf score), disallowed attributes, the
/// distribution toggle (waived when any ForceIf attribute matched), and body
/// shape descriptors when a body shape is already assigned.
pub fn check_rules(
    rules: &FlattenedRules,
    npc: &NpcDescriptor,
    groups: &GroupTable,
    body_shape: Option<&BTreeSet<BodyShapeDescriptor>>,
) -> RuleCheck {
    if npc.is_unique && !rules.allow_unique {
        return RuleCheck::fail("unique NPCs are not allowed");
    }
    if !npc.is_unique && !rules.allow_non_unique {
        return RuleCheck::fail("non-unique NPCs are not allowed");
    }
    if let Some(allowed) = &rules.allowed_races {
        if !allowed.contains(&npc.race) {
            return RuleCheck::fail(format!("race {} is not allowed", npc.race));
        }
    }
    if rules.disallowed_races.contains(&npc.race) {
        return RuleCheck::fail(format!("race {} is disallowed", npc.race));
    }
    if !rules.weight_range.contains(npc.weight) {
        return RuleCheck::fail(format!(
            "weight {} is outside {}..={}",
            npc.weight, rules.weight_range.lower, rules.weight_range.upper
        ));
    }

    let allowed = AttributeMatcher::matches(&rules.allowed_attributes, npc, groups);
    if !allowed.is_match {
        return RuleCheck::fail(format!(
            "allowed attributes not matched: {}",
            allowed.unmatched_log.join(", ")
        ));
    }

    for list in &rules.disallowed_attributes {
        let disallowed = AttributeMatcher::matches(list, npc, groups);
        if disallowed.has_restrictions && disallowed.is_match {
            return RuleCheck::fail(format!(
                "disallowed attributes matched: {}",
                disallowed.matched_log.join(", ")
            ));
        }
    }

    if !rules.distribution_enabled && allowed.force_if_weight == 0 {
        return RuleCheck::fail("distribution is disabled and no ForceIf attribute matched");
    }

    if let Some(assigned) = body_shape.filter(|d| !d.is_empty()) {
        if !rules.allowed_body_shape_descriptors.is_empty()
            && assigned.is_disjoint(&rules.allowed_body_shape_descriptors)
        {
            return RuleCheck::fail("assigned body shape has none of the allowed descriptors");
        }
        if !assigned.is_disjoint(&rules.disallowed_body_shape_descriptors) {
            return RuleCheck::fail("assigned body shape has a disallowed descriptor");
        }
    }

    RuleCheck::pass(allowed.force_if_weight)
}

/// Stateless eligibility filter.
///
/// # Examples
///
/// ```
/// use u_variants::filter::{EligibilityFilter, FilterRequest};
/// use u_variants::npc::{Gender, NpcDescriptor};
/// use u_variants::pack::{flatten_asset_pack, AssetPack, RaceGroupings, Subgroup};
///
/// let pack = AssetPack::new("Bodies", Gender::Male)
///     .with_subgroup(Subgroup::new("A", "Any"))
///     .with_subgroup(Subgroup::new("B", "Heavy").with_rules({
///         let mut rules = u_variants::pack::EligibilityRules::default();
///         rules.weight_range = u_variants::pack::WeightRange::new(60.0, 100.0);
///         rules
///     }));
/// let packs = vec![flatten_asset_pack(&pack, &RaceGroupings::new()).pack];
///
/// let light = NpcDescriptor::new("1", "NordRace", Gender::Male).with_weight(20.0);
/// let outcome = EligibilityFilter::filter(&packs, &light, &FilterRequest::default());
/// assert!(outcome.packs.is_empty());
///
/// let heavy = light.clone().with_weight(80.0);
/// let outcome = EligibilityFilter::filter(&packs, &heavy, &FilterRequest::default());
/// assert_eq!(outcome.packs.len(), 1);
/// ```
pub struct EligibilityFilter;

impl EligibilityFilter {
    pub fn filter(
        packs: &[Arc<FlattenedAssetPack>],
        npc: &NpcDescriptor,
        request: &FilterRequest<'_>,
    ) -> FilterOutcome {
        let mut report = Vec::new();
        let npc_id = npc.log_id();

        // 1. explicit pin
        let explicit = request.specific.and_then(|a| a.pin_for(&request.mode, packs));
        let mut pinned_pack: Option<(usize, Vec<Option<Vec<usize>>>)> = None;
        if let Some(pin) = &explicit {
            match packs.iter().position(|p| p.name == pin.asset_pack) {
                Some(idx) => {
                    let slot_pins = resolve_slot_pins(&packs[idx], pin, &mut report);
                    pinned_pack = Some((idx, slot_pins));
                }
                None => {
                    warn!(npc = %npc_id, asset_pack = %pin.asset_pack, "assigned asset pack is not available");
                    report.push(format!(
                        "Specific assignment requests asset pack {} which is not available; choosing freely",
                        pin.asset_pack
                    ));
                }
            }
        }

        let offered: Vec<usize> = match &pinned_pack {
            Some((idx, _)) => vec![*idx],
            None => (0..packs.len()).collect(),
        };

        // 2. whole-pack rules
        let mut survivors: Vec<(usize, u32)> = Vec::new();
        for idx in offered {
            let pack = &packs[idx];
            let check = check_rules(&pack.rules, npc, &pack.groups, request.body_shape);
            if check.eligible {
                survivors.push((idx, check.force_if_weight));
            } else {
                report.push(format!(
                    "Asset pack {} is invalid due to its {}: {}",
                    pack.name,
                    DISTRIBUTION_RULES_ID,
                    check.reason.unwrap_or_default()
                ));
            }
        }

        // 3. whole-pack ForceIf culling
        let max_pack_force_if = survivors.iter().map(|&(_, w)| w).max().unwrap_or(0);
        if max_pack_force_if > 0 {
            survivors.retain(|&(idx, w)| {
                if w < max_pack_force_if {
                    report.push(format!(
                        "Asset pack {} was removed because another asset pack matched more ForceIf attributes ({} < {})",
                        packs[idx].name, w, max_pack_force_if
                    ));
                    false
                } else {
                    true
                }
            });
        }

        // 4-6. per-slot filtering
        let mut eligible = Vec::new();
        for (idx, force_if_weight) in survivors {
            let slot_pins = match &pinned_pack {
                Some((p, pins)) if *p == idx => Some(pins.as_slice()),
                _ => None,
            };
            if let Some(ep) = filter_slots(idx, &packs[idx], force_if_weight, slot_pins, npc, request, &mut report) {
                eligible.push(ep);
            }
        }

        // 7. consistency
        let mut filtered_by_consistency = false;
        if !request.ignore_consistency && !eligible.is_empty() {
            if let Some(recorded) = request.consistency.and_then(|a| a.pin_for(&request.mode, packs)) {
                filtered_by_consistency = apply_consistency(&mut eligible, &recorded, explicit.as_ref(), &mut report);
            }
        }

        if eligible.is_empty() {
            debug!(npc = %npc_id, mode = %request.mode, "no eligible asset packs");
        }

        FilterOutcome {
            packs: eligible,
            filtered_by_consistency,
            report,
        }
    }
}

/// For each slot, the indices of the unfiltered candidates representing a
/// pinned id, or `None` when nothing at that slot is pinned.
fn resolve_slot_pins(pack: &FlattenedAssetPack, pin: &Pin, report: &mut Vec<String>) -> Vec<Option<Vec<usize>>> {
    let ids: BTreeSet<String> = pin.subgroup_ids.iter().cloned().collect();
    let mut matched: BTreeSet<&str> = BTreeSet::new();

    let pins = pack
        .slots
        .iter()
        .map(|slot| {
            let hits: Vec<usize> = slot
                .iter()
                .enumerate()
                .filter(|(_, sg)| sg.contains_any(&ids))
                .map(|(i, _)| i)
                .collect();
            for &i in &hits {
                matched.extend(slot[i].contained_ids.iter().map(String::as_str));
            }
            (!hits.is_empty()).then_some(hits)
        })
        .collect();

    for id in &ids {
        if !matched.contains(id.as_str()) {
            warn!(asset_pack = %pack.name, subgroup = %id, "assigned subgroup not found");
            report.push(format!(
                "Subgroup {} requested by specific assignment was not found in asset pack {}",
                id, pack.name
            ));
        }
    }
    pins
}

fn filter_slots(
    pack_index: usize,
    pack: &Arc<FlattenedAssetPack>,
    force_if_weight: u32,
    slot_pins: Option<&[Option<Vec<usize>>]>,
    npc: &NpcDescriptor,
    request: &FilterRequest<'_>,
    report: &mut Vec<String>,
) -> Option<EligiblePack> {
    let pinned = slot_pins.is_some();
    let mut slots = Vec::with_capacity(pack.slots.len());

    for (position, slot) in pack.slots.iter().enumerate() {
        let coord = |index| SlotCoord {
            pack: pack_index,
            position,
            index,
        };
        let unfiltered = |indices: &mut dyn Iterator<Item = usize>| -> Vec<Candidate> {
            indices
                .map(|i| Candidate {
                    subgroup: slot[i].clone(),
                    coord: coord(i),
                    force_if_weight: 0,
                })
                .collect()
        };

        let slot_pin = slot_pins.and_then(|pins| pins.get(position)).and_then(Option::as_ref);
        let mut kept = match slot_pin {
            // pinned candidates bypass eligibility
            Some(indices) => unfiltered(&mut indices.iter().copied()),
            None => {
                let mut kept = Vec::new();
                for (i, sg) in slot.iter().enumerate() {
                    let check = check_rules(&sg.rules, npc, &pack.groups, request.body_shape);
                    if check.eligible {
                        kept.push(Candidate {
                            subgroup: sg.clone(),
                            coord: coord(i),
                            force_if_weight: check.force_if_weight,
                        });
                    } else {
                        report.push(format!(
                            "Subgroup {} is invalid: {}",
                            sg.label(),
                            check.reason.unwrap_or_default()
                        ));
                    }
                }
                kept
            }
        };

        let slot_label = pack.slot_labels.get(position).map(String::as_str).unwrap_or("?");
        if kept.is_empty() {
            if pinned {
                warn!(asset_pack = %pack.name, slot = slot_label, "no compatible subgroups in assigned asset pack; ignoring rules at this slot");
                report.push(format!(
                    "Asset pack {} is assigned but no subgroups within {} are compatible; ignoring subgroup rules at this position",
                    pack.name, slot_label
                ));
                kept = unfiltered(&mut (0..slot.len()));
            }
            if kept.is_empty() {
                report.push(format!(
                    "Asset pack {} is invalid because no subgroups within {} are compatible",
                    pack.name, slot_label
                ));
                return None;
            }
        }

        kept.sort_by(|a, b| b.force_if_weight.cmp(&a.force_if_weight));
        let max = kept[0].force_if_weight;
        if max > 0 {
            for dropped in kept.iter().filter(|c| c.force_if_weight < max) {
                report.push(format!(
                    "Subgroup {} was removed because another subgroup at position {} matched more ForceIf attributes",
                    dropped.subgroup.label(),
                    position + 1
                ));
            }
            kept.retain(|c| c.force_if_weight == max);
        }
        slots.push(kept);
    }

    Some(EligiblePack {
        index: pack_index,
        pack: pack.clone(),
        force_if_weight,
        slots,
        pinned,
    })
}

/// Restricts `eligible` to the recorded pack and re-pins its slots.
/// Returns whether the restriction happened.
fn apply_consistency(
    eligible: &mut Vec<EligiblePack>,
    recorded: &Pin,
    explicit: Option<&Pin>,
    report: &mut Vec<String>,
) -> bool {
    if let Some(pin) = explicit {
        if pin.asset_pack != recorded.asset_pack {
            report.push(format!(
                "Assigned asset pack {} supersedes consistency asset pack {}",
                pin.asset_pack, recorded.asset_pack
            ));
            return false;
        }
    }

    let Some(at) = eligible.iter().position(|p| p.name() == recorded.asset_pack) else {
        report.push(format!(
            "The consistency asset pack {} is not available",
            recorded.asset_pack
        ));
        return false;
    };

    report.push(format!("Selecting consistency asset pack {}", recorded.asset_pack));
    let mut chosen = eligible.swap_remove(at);
    for (position, id) in recorded.subgroup_ids.iter().enumerate() {
        let Some(slot) = chosen.slots.get_mut(position) else {
            report.push(format!(
                "Consistency subgroup {} has no matching position in asset pack {}",
                id, recorded.asset_pack
            ));
            break;
        };
        match slot.iter().position(|c| c.id() == id) {
            Some(i) => {
                let kept = slot.swap_remove(i);
                *slot = vec![kept];
                report.push(format!("Using consistency subgroup {}", id));
            }
            None => report.push(format!(
                "The consistency subgroup {} is not available at position {}; choosing a different subgroup",
                id,
                position + 1
            )),
        }
    }
    *eligible = vec![chosen];
    true
}
