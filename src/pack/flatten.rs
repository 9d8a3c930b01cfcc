//! Flattening of authored asset packs into positional slots.
//!
//! Every enabled top-level subgroup becomes one slot. Within a slot, each
//! leaf of the top-level subtree (visited depth-first, pre-order) becomes one
//! candidate carrying the merged rules of its whole ancestor path. Required
//! and excluded subgroup ids are resolved to the slot whose subtree contains
//! them, so the generator can propagate them by position.

use super::types::{AssetPack, BodyShapeDescriptor, EligibilityRules, RaceGroupings, Subgroup, WeightRange};
use crate::attribute::{Attribute, GroupTable};
use crate::error::ConfigError;
use crate::npc::Gender;
use crate::selection::Weighted;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reserved id of the whole-pack distribution rules. Never part of a
/// combination signature.
pub const DISTRIBUTION_RULES_ID: &str = "ConfigDistributionRules";

/// Rules after race-grouping resolution, group expansion and inheritance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlattenedRules {
    pub distribution_enabled: bool,
    /// `None` allows every race.
    pub allowed_races: Option<BTreeSet<String>>,
    pub disallowed_races: BTreeSet<String>,
    /// AND-list the NPC must satisfy.
    pub allowed_attributes: Vec<Attribute>,
    /// Independent AND-lists, one per ancestor that declared any; matching
    /// any of them makes the NPC ineligible.
    pub disallowed_attributes: Vec<Vec<Attribute>>,
    pub allow_unique: bool,
    pub allow_non_unique: bool,
    pub weight_range: WeightRange,
    pub allowed_body_shape_descriptors: BTreeSet<BodyShapeDescriptor>,
    pub disallowed_body_shape_descriptors: BTreeSet<BodyShapeDescriptor>,
}

impl Default for FlattenedRules {
    fn default() -> Self {
        Self::from_authored(
            &EligibilityRules::default(),
            &RaceGroupings::default(),
            &GroupTable::default(),
            &mut Vec::new(),
        )
    }
}

impl FlattenedRules {
    fn from_authored(
        rules: &EligibilityRules,
        race_groupings: &RaceGroupings,
        groups: &GroupTable,
        diagnostics: &mut Vec<ConfigError>,
    ) -> Self {
        let mut allowed_races = rules.allowed_races.clone();
        allowed_races.extend(race_groupings.resolve(&rules.allowed_race_groupings));
        let mut disallowed_races = rules.disallowed_races.clone();
        disallowed_races.extend(race_groupings.resolve(&rules.disallowed_race_groupings));

        let allowed = groups.expand_attributes(&rules.allowed_attributes);
        let disallowed = groups.expand_attributes(&rules.disallowed_attributes);
        for err in allowed.diagnostics.into_iter().chain(disallowed.diagnostics) {
            if !diagnostics.contains(&err) {
                diagnostics.push(err);
            }
        }

        let disallowed_attributes = if disallowed.attributes.is_empty() {
            Vec::new()
        } else {
            vec![disallowed.attributes]
        };

        Self {
            distribution_enabled: rules.distribution_enabled,
            allowed_races: if allowed_races.is_empty() {
                None
            } else {
                Some(allowed_races)
            },
            disallowed_races,
            allowed_attributes: allowed.attributes,
            disallowed_attributes,
            allow_unique: rules.allow_unique,
            allow_non_unique: rules.allow_non_unique,
            weight_range: rules.weight_range,
            allowed_body_shape_descriptors: rules.allowed_body_shape_descriptors.clone(),
            disallowed_body_shape_descriptors: rules.disallowed_body_shape_descriptors.clone(),
        }
    }

    /// Rules of a child nested under `self`: every restriction of both applies.
    fn merge(&self, child: &FlattenedRules) -> FlattenedRules {
        let allowed_races = match (&self.allowed_races, &child.allowed_races) {
            (None, races) | (races, None) => races.clone(),
            (Some(a), Some(b)) => Some(a.intersection(b).cloned().collect()),
        };

        let mut allowed_attributes = self.allowed_attributes.clone();
        allowed_attributes.extend(child.allowed_attributes.iter().cloned());
        let mut disallowed_attributes = self.disallowed_attributes.clone();
        disallowed_attributes.extend(child.disallowed_attributes.iter().cloned());

        FlattenedRules {
            distribution_enabled: self.distribution_enabled && child.distribution_enabled,
            allowed_races,
            disallowed_races: self.disallowed_races.union(&child.disallowed_races).cloned().collect(),
            allowed_attributes,
            disallowed_attributes,
            allow_unique: self.allow_unique && child.allow_unique,
            allow_non_unique: self.allow_non_unique && child.allow_non_unique,
            weight_range: self.weight_range.intersect(&child.weight_range),
            allowed_body_shape_descriptors: self
                .allowed_body_shape_descriptors
                .union(&child.allowed_body_shape_descriptors)
                .cloned()
                .collect(),
            disallowed_body_shape_descriptors: self
                .disallowed_body_shape_descriptors
                .union(&child.disallowed_body_shape_descriptors)
                .cloned()
                .collect(),
        }
    }
}

/// One selectable candidate at one slot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlattenedSubgroup {
    /// Id of the leaf subgroup.
    pub id: String,
    /// Names along the ancestor path, joined with ` -> `.
    pub name: String,
    /// Slot index (index of the enabled top-level subgroup).
    pub position: usize,
    /// Ids of the leaf and all its ancestors.
    pub contained_ids: BTreeSet<String>,
    /// Product of the probability weightings along the path.
    pub probability_weighting: u32,
    pub rules: FlattenedRules,
    /// At each other position, the chosen candidate must contain one of these ids.
    pub required_at_position: BTreeMap<usize, BTreeSet<String>>,
    /// At each other position, the chosen candidate must contain none of these ids.
    pub excluded_at_position: BTreeMap<usize, BTreeSet<String>>,
}

impl FlattenedSubgroup {
    /// Whether this candidate represents any of `ids`.
    pub fn contains_any(&self, ids: &BTreeSet<String>) -> bool {
        !self.contained_ids.is_disjoint(ids)
    }

    pub fn has_constraints(&self) -> bool {
        !self.required_at_position.is_empty() || !self.excluded_at_position.is_empty()
    }

    /// `id: name` label used in report lines.
    pub fn label(&self) -> String {
        format!("{}: {}", self.id, self.name)
    }
}

impl Weighted for FlattenedSubgroup {
    fn probability_weighting(&self) -> u32 {
        self.probability_weighting
    }
}

/// An asset pack ready for filtering and generation. Read-only once built.
#[derive(Debug, Clone)]
pub struct FlattenedAssetPack {
    pub name: String,
    pub gender: Gender,
    /// Whole-pack rules, evaluated as the subgroup [`DISTRIBUTION_RULES_ID`].
    pub rules: FlattenedRules,
    /// Candidates per slot.
    pub slots: Vec<Vec<Arc<FlattenedSubgroup>>>,
    /// `id: name` of the top-level subgroup behind each slot.
    pub slot_labels: Vec<String>,
    /// Attribute groups visible to this pack.
    pub groups: GroupTable,
}

impl FlattenedAssetPack {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Finds the candidate with leaf id `id` at `position`.
    pub fn find(&self, position: usize, id: &str) -> Option<&Arc<FlattenedSubgroup>> {
        self.slots.get(position)?.iter().find(|sg| sg.id == id)
    }
}

/// A flattened pack with the authoring problems found while building it.
#[derive(Debug, Clone)]
pub struct FlattenOutput {
    pub pack: Arc<FlattenedAssetPack>,
    pub diagnostics: Vec<ConfigError>,
}

/// Builds [`FlattenedAssetPack`]s.
///
/// # Examples
///
/// ```
/// use u_variants::npc::Gender;
/// use u_variants::pack::{AssetPack, Flattener, Subgroup};
///
/// let pack = AssetPack::new("Bodies", Gender::Female)
///     .with_subgroup(
///         Subgroup::new("T", "Texture")
///             .with_subgroup(Subgroup::new("T1", "Pale"))
///             .with_subgroup(Subgroup::new("T2", "Tanned")),
///     )
///     .with_subgroup(Subgroup::new("M", "Mesh"));
///
/// let out = Flattener::new().flatten(&pack);
/// assert!(out.diagnostics.is_empty());
/// assert_eq!(out.pack.slot_count(), 2);
/// assert_eq!(out.pack.slots[0].len(), 2);
/// assert!(out.pack.slots[0][1].contained_ids.contains("T"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Flattener {
    race_groupings: RaceGroupings,
    global_groups: GroupTable,
    prefer_global_groups: bool,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_race_groupings(mut self, groupings: RaceGroupings) -> Self {
        self.race_groupings = groupings;
        self
    }

    /// Attribute groups shared by all packs. When `prefer_global` is set they
    /// override pack-defined groups with the same label; otherwise the pack's
    /// own definitions win.
    pub fn with_global_groups(mut self, groups: GroupTable, prefer_global: bool) -> Self {
        self.global_groups = groups;
        self.prefer_global_groups = prefer_global;
        self
    }

    fn group_table(&self, pack: &AssetPack) -> GroupTable {
        let mut table = GroupTable::new();
        if self.prefer_global_groups {
            pack.attribute_groups.iter().cloned().for_each(|g| table.insert(g));
            self.global_groups.iter().cloned().for_each(|g| table.insert(g));
        } else {
            self.global_groups.iter().cloned().for_each(|g| table.insert(g));
            pack.attribute_groups.iter().cloned().for_each(|g| table.insert(g));
        }
        table
    }

    /// Flattens `pack`. Never fails: authoring errors are logged, returned as
    /// diagnostics, and the offending references dropped.
    pub fn flatten(&self, pack: &AssetPack) -> FlattenOutput {
        let groups = self.group_table(pack);
        let mut diagnostics = Vec::new();

        let rules = FlattenedRules::from_authored(
            &pack.distribution_rules,
            &self.race_groupings,
            &groups,
            &mut diagnostics,
        );

        let tops: Vec<&Subgroup> = pack.subgroups.iter().filter(|s| s.enabled).collect();

        let mut id_positions: HashMap<&str, usize> = HashMap::new();
        for (position, top) in tops.iter().enumerate() {
            index_ids(&pack.name, top, position, &mut id_positions, &mut diagnostics);
        }

        let mut walker = Walker {
            pack_name: &pack.name,
            race_groupings: &self.race_groupings,
            groups: &groups,
            id_positions: &id_positions,
            diagnostics: &mut diagnostics,
        };

        let mut slots = Vec::with_capacity(tops.len());
        let mut slot_labels = Vec::with_capacity(tops.len());
        for (position, top) in tops.iter().enumerate() {
            let mut leaves = Vec::new();
            walker.walk(top, position, None, &mut leaves);
            if leaves.is_empty() {
                warn!(
                    asset_pack = %pack.name,
                    subgroup = %top.id,
                    "no selectable subgroups at position {}", position
                );
            }
            slots.push(leaves);
            slot_labels.push(format!("{}: {}", top.id, top.name));
        }

        debug!(
            asset_pack = %pack.name,
            slots = slots.len(),
            candidates = slots.iter().map(Vec::len).sum::<usize>(),
            diagnostics = diagnostics.len(),
            "flattened asset pack"
        );

        FlattenOutput {
            pack: Arc::new(FlattenedAssetPack {
                name: pack.name.clone(),
                gender: pack.gender,
                rules,
                slots,
                slot_labels,
                groups,
            }),
            diagnostics,
        }
    }
}

/// Flattens `pack` using only its own attribute groups.
pub fn flatten_asset_pack(pack: &AssetPack, race_groupings: &RaceGroupings) -> FlattenOutput {
    Flattener::new()
        .with_race_groupings(race_groupings.clone())
        .flatten(pack)
}

/// Records the position of every enabled subgroup id. Disabled subtrees
/// are skipped, so references into them surface as unknown.
fn index_ids<'a>(
    pack_name: &str,
    node: &'a Subgroup,
    position: usize,
    out: &mut HashMap<&'a str, usize>,
    diagnostics: &mut Vec<ConfigError>,
) {
    if !node.enabled {
        return;
    }
    if out.contains_key(node.id.as_str()) {
        let err = ConfigError::DuplicateSubgroupId {
            asset_pack: pack_name.to_string(),
            subgroup: node.id.clone(),
        };
        if !diagnostics.contains(&err) {
            warn!(%err, "keeping the first subgroup with this id");
            diagnostics.push(err);
        }
    } else {
        out.insert(node.id.as_str(), position);
    }
    for child in &node.subgroups {
        index_ids(pack_name, child, position, out, diagnostics);
    }
}

/// Accumulated state along one ancestor path.
struct PathState {
    ids: Vec<String>,
    names: Vec<String>,
    weighting: u32,
    rules: FlattenedRules,
    required: BTreeSet<String>,
    excluded: BTreeSet<String>,
}

struct Walker<'a> {
    pack_name: &'a str,
    race_groupings: &'a RaceGroupings,
    groups: &'a GroupTable,
    id_positions: &'a HashMap<&'a str, usize>,
    diagnostics: &'a mut Vec<ConfigError>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        node: &Subgroup,
        position: usize,
        parent: Option<&PathState>,
        leaves: &mut Vec<Arc<FlattenedSubgroup>>,
    ) {
        if !node.enabled {
            return;
        }

        let own = FlattenedRules::from_authored(&node.rules, self.race_groupings, self.groups, self.diagnostics);
        let state = match parent {
            Some(p) => {
                let mut ids = p.ids.clone();
                ids.push(node.id.clone());
                let mut names = p.names.clone();
                names.push(node.name.clone());
                PathState {
                    ids,
                    names,
                    weighting: p.weighting.saturating_mul(node.probability_weighting),
                    rules: p.rules.merge(&own),
                    required: p.required.union(&node.required_subgroups).cloned().collect(),
                    excluded: p.excluded.union(&node.excluded_subgroups).cloned().collect(),
                }
            }
            None => PathState {
                ids: vec![node.id.clone()],
                names: vec![node.name.clone()],
                weighting: node.probability_weighting,
                rules: own,
                required: node.required_subgroups.clone(),
                excluded: node.excluded_subgroups.clone(),
            },
        };

        if node.subgroups.iter().any(|c| c.enabled) {
            for child in &node.subgroups {
                self.walk(child, position, Some(&state), leaves);
            }
            return;
        }

        if let Some(leaf) = self.build_leaf(node, position, state) {
            leaves.push(Arc::new(leaf));
        }
    }

    fn build_leaf(&mut self, node: &Subgroup, position: usize, state: PathState) -> Option<FlattenedSubgroup> {
        let contained_ids: BTreeSet<String> = state.ids.iter().cloned().collect();
        let mut required_at_position = self.resolve(&node.id, &state.required);
        let mut excluded_at_position = self.resolve(&node.id, &state.excluded);

        if let Some(own) = required_at_position.remove(&position) {
            if contained_ids.is_disjoint(&own) {
                self.unsatisfiable(&node.id, format!("it requires ({}) at its own position", join(&own)));
                return None;
            }
        }
        if let Some(own) = excluded_at_position.remove(&position) {
            if !contained_ids.is_disjoint(&own) {
                self.unsatisfiable(&node.id, format!("it excludes ({}) which it contains", join(&own)));
                return None;
            }
        }

        Some(FlattenedSubgroup {
            id: node.id.clone(),
            name: state.names.join(" -> "),
            position,
            contained_ids,
            probability_weighting: state.weighting,
            rules: state.rules,
            required_at_position,
            excluded_at_position,
        })
    }

    fn resolve(&mut self, subgroup: &str, ids: &BTreeSet<String>) -> BTreeMap<usize, BTreeSet<String>> {
        let mut by_position: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
        for id in ids {
            match self.id_positions.get(id.as_str()) {
                Some(&p) => {
                    by_position.entry(p).or_default().insert(id.clone());
                }
                None => {
                    let err = ConfigError::UnknownSubgroupReference {
                        asset_pack: self.pack_name.to_string(),
                        subgroup: subgroup.to_string(),
                        reference: id.clone(),
                    };
                    if !self.diagnostics.contains(&err) {
                        warn!(%err, "dropping subgroup constraint");
                        self.diagnostics.push(err);
                    }
                }
            }
        }
        by_position
    }

    fn unsatisfiable(&mut self, subgroup: &str, reason: String) {
        let err = ConfigError::UnsatisfiableSubgroup {
            asset_pack: self.pack_name.to_string(),
            subgroup: subgroup.to_string(),
            reason,
        };
        warn!(%err, "pruning subgroup");
        self.diagnostics.push(err);
    }
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeGroup, AttributeNode};

    fn sample_pack() -> AssetPack {
        AssetPack::new("Sample", Gender::Female)
            .with_subgroup(
                Subgroup::new("A", "Textures")
                    .with_probability_weighting(2)
                    .with_subgroup(Subgroup::new("A1", "Light").with_probability_weighting(3))
                    .with_subgroup(
                        Subgroup::new("A2", "Dark")
                            .requires("B2")
                            .with_subgroup(Subgroup::new("A2a", "Dark Matte"))
                            .with_subgroup(Subgroup::new("A2b", "Dark Gloss").excludes("B1")),
                    ),
            )
            .with_subgroup(
                Subgroup::new("B", "Meshes")
                    .with_subgroup(Subgroup::new("B1", "Slim"))
                    .with_subgroup(Subgroup::new("B2", "Curvy")),
            )
    }

    #[test]
    fn test_slots_and_leaves() {
        let out = flatten_asset_pack(&sample_pack(), &RaceGroupings::new());
        let pack = &out.pack;

        assert!(out.diagnostics.is_empty());
        assert_eq!(pack.slot_count(), 2);
        let ids: Vec<&str> = pack.slots[0].iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2a", "A2b"]);
        assert_eq!(pack.slot_labels, vec!["A: Textures".to_string(), "B: Meshes".to_string()]);

        let a2b = pack.find(0, "A2b").unwrap();
        assert_eq!(a2b.position, 0);
        assert_eq!(a2b.name, "Textures -> Dark -> Dark Gloss");
        let contained: Vec<&str> = a2b.contained_ids.iter().map(String::as_str).collect();
        assert_eq!(contained, vec!["A", "A2", "A2b"]);
    }

    #[test]
    fn test_weighting_product() {
        let out = flatten_asset_pack(&sample_pack(), &RaceGroupings::new());
        assert_eq!(out.pack.find(0, "A1").unwrap().probability_weighting, 6);
        assert_eq!(out.pack.find(0, "A2a").unwrap().probability_weighting, 2);
    }

    #[test]
    fn test_constraints_projected_to_leaves() {
        let out = flatten_asset_pack(&sample_pack(), &RaceGroupings::new());
        let a2a = out.pack.find(0, "A2a").unwrap();
        let a2b = out.pack.find(0, "A2b").unwrap();

        let required: BTreeSet<String> = ["B2".to_string()].into();
        let excluded: BTreeSet<String> = ["B1".to_string()].into();
        assert_eq!(a2a.required_at_position.get(&1), Some(&required));
        assert!(a2a.excluded_at_position.is_empty());
        assert_eq!(a2b.required_at_position.get(&1), Some(&required));
        assert_eq!(a2b.excluded_at_position.get(&1), Some(&excluded));
        assert!(!out.pack.find(0, "A1").unwrap().has_constraints());
    }

    #[test]
    fn test_unknown_reference_dropped() {
        let pack = AssetPack::new("P", Gender::Male)
            .with_subgroup(Subgroup::new("A", "A").requires("Ghost").requires("B"))
            .with_subgroup(Subgroup::new("B", "B"));
        let out = flatten_asset_pack(&pack, &RaceGroupings::new());

        assert_eq!(out.diagnostics.len(), 1);
        assert!(matches!(
            &out.diagnostics[0],
            ConfigError::UnknownSubgroupReference { reference, .. } if reference == "Ghost"
        ));
        let a = out.pack.find(0, "A").unwrap();
        assert_eq!(a.required_at_position.len(), 1);
        assert!(a.required_at_position[&1].contains("B"));
    }

    #[test]
    fn test_disabled_subgroups_pruned() {
        let pack = AssetPack::new("P", Gender::Male)
            .with_subgroup(Subgroup::new("Off", "Off").with_enabled(false))
            .with_subgroup(
                Subgroup::new("A", "A")
                    .with_subgroup(Subgroup::new("A1", "A1").with_enabled(false))
                    .with_subgroup(Subgroup::new("A2", "A2")),
            )
            .with_subgroup(Subgroup::new("B", "B").with_subgroup(Subgroup::new("B1", "B1").with_enabled(false)));
        let out = flatten_asset_pack(&pack, &RaceGroupings::new());

        assert_eq!(out.pack.slot_count(), 2);
        assert_eq!(out.pack.slots[0].len(), 1);
        assert_eq!(out.pack.slots[0][0].id, "A2");
        // B has no enabled children, so B itself is the leaf.
        assert_eq!(out.pack.slots[1][0].id, "B");
        assert_eq!(out.pack.slots[1][0].position, 1);
    }

    #[test]
    fn test_reference_to_disabled_subgroup_dropped() {
        let pack = AssetPack::new("P", Gender::Male)
            .with_subgroup(
                Subgroup::new("A", "A")
                    .with_subgroup(Subgroup::new("A1", "A1").requires("B2").requires("C"))
                    .with_subgroup(Subgroup::new("A2", "A2")),
            )
            .with_subgroup(
                Subgroup::new("B", "B")
                    .with_subgroup(Subgroup::new("B1", "B1"))
                    .with_subgroup(Subgroup::new("B2", "B2").with_enabled(false)),
            )
            .with_subgroup(Subgroup::new("C", "C").with_enabled(false));
        let out = flatten_asset_pack(&pack, &RaceGroupings::new());

        let unknown: Vec<&str> = out
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                ConfigError::UnknownSubgroupReference { reference, .. } => Some(reference.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(unknown.len(), 2);
        assert!(unknown.contains(&"B2"));
        assert!(unknown.contains(&"C"));
        assert!(out.pack.find(0, "A1").unwrap().required_at_position.is_empty());
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let pack = AssetPack::new("P", Gender::Male)
            .with_subgroup(
                Subgroup::new("A", "A")
                    .with_subgroup(Subgroup::new("X", "X in A"))
                    .with_subgroup(Subgroup::new("A2", "A2").requires("X")),
            )
            .with_subgroup(
                Subgroup::new("B", "B")
                    .with_subgroup(Subgroup::new("X", "X in B"))
                    .with_subgroup(Subgroup::new("B2", "B2").requires("X")),
            );
        let out = flatten_asset_pack(&pack, &RaceGroupings::new());

        assert!(out.diagnostics.contains(&ConfigError::DuplicateSubgroupId {
            asset_pack: "P".into(),
            subgroup: "X".into(),
        }));
        // the first X, at position 0, owns the id
        let b2 = out.pack.find(1, "B2").unwrap();
        assert!(b2.required_at_position[&0].contains("X"));
    }

    #[test]
    fn test_own_position_constraints() {
        let pack = AssetPack::new("P", Gender::Male).with_subgroup(
            Subgroup::new("A", "A")
                .with_subgroup(Subgroup::new("A1", "A1").requires("A"))
                .with_subgroup(Subgroup::new("A2", "A2").requires("A1"))
                .with_subgroup(Subgroup::new("A3", "A3").excludes("A")),
        );
        let out = flatten_asset_pack(&pack, &RaceGroupings::new());

        let ids: Vec<&str> = out.pack.slots[0].iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A1"]);
        assert!(out.pack.slots[0][0].required_at_position.is_empty());
        assert_eq!(out.diagnostics.len(), 2);
    }

    #[test]
    fn test_rules_inherited() {
        let mut parent_rules = EligibilityRules::default();
        parent_rules.allowed_races = ["NordRace".to_string(), "ImperialRace".to_string()].into();
        parent_rules.weight_range = WeightRange::new(0.0, 60.0);
        parent_rules.allow_unique = false;
        let mut child_rules = EligibilityRules::default();
        child_rules.allowed_race_groupings = ["Imperials".to_string()].into();
        child_rules.weight_range = WeightRange::new(40.0, 100.0);
        child_rules.disallowed_attributes = vec![AttributeNode::class(["Mage"]).into()];

        let pack = AssetPack::new("P", Gender::Male).with_subgroup(
            Subgroup::new("A", "A")
                .with_rules(parent_rules)
                .with_disallowed_attribute(AttributeNode::class(["Thief"]))
                .with_subgroup(Subgroup::new("A1", "A1").with_rules(child_rules)),
        );
        let groupings = RaceGroupings::new().with_grouping("Imperials", ["ImperialRace"]);
        let out = flatten_asset_pack(&pack, &groupings);
        let rules = &out.pack.slots[0][0].rules;

        assert_eq!(rules.allowed_races, Some(["ImperialRace".to_string()].into()));
        assert_eq!(rules.weight_range, WeightRange::new(40.0, 60.0));
        assert!(!rules.allow_unique);
        assert!(rules.allow_non_unique);
        assert_eq!(rules.disallowed_attributes.len(), 2);
    }

    #[test]
    fn test_groups_expanded_and_cycles_reported() {
        let pack = AssetPack::new("P", Gender::Male)
            .with_attribute_group(AttributeGroup::new("G1", vec![AttributeNode::group(["G2"]).into()]))
            .with_attribute_group(AttributeGroup::new(
                "G2",
                vec![crate::attribute::Attribute::new(vec![
                    AttributeNode::group(["G1"]),
                    AttributeNode::race(["NordRace"]),
                ])],
            ))
            .with_subgroup(Subgroup::new("A", "A").with_allowed_attribute(AttributeNode::group(["G1"]).forced()));
        let out = flatten_asset_pack(&pack, &RaceGroupings::new());

        assert!(matches!(out.diagnostics[0], ConfigError::CircularGroupReference { .. }));
        let allowed = &out.pack.slots[0][0].rules.allowed_attributes;
        assert_eq!(allowed.len(), 1);
        assert_eq!(allowed[0].nodes, vec![AttributeNode::race(["NordRace"]).forced()]);
    }

    #[test]
    fn test_global_groups_precedence() {
        let pack = AssetPack::new("P", Gender::Male)
            .with_attribute_group(AttributeGroup::new("G", vec![AttributeNode::race(["PackRace"]).into()]))
            .with_subgroup(Subgroup::new("A", "A").with_allowed_attribute(AttributeNode::group(["G"])));
        let global = GroupTable::new().with_group(AttributeGroup::new("G", vec![AttributeNode::race(["GlobalRace"]).into()]));

        let pack_wins = Flattener::new().with_global_groups(global.clone(), false).flatten(&pack);
        assert_eq!(
            pack_wins.pack.slots[0][0].rules.allowed_attributes[0].nodes,
            vec![AttributeNode::race(["PackRace"])]
        );

        let global_wins = Flattener::new().with_global_groups(global, true).flatten(&pack);
        assert_eq!(
            global_wins.pack.slots[0][0].rules.allowed_attributes[0].nodes,
            vec![AttributeNode::race(["GlobalRace"])]
        );
    }
}
