//! Authored (hierarchical) asset pack configuration.

use crate::attribute::{Attribute, AttributeGroup};
use crate::npc::Gender;
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive NPC weight range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightRange {
    pub lower: f64,
    pub upper: f64,
}

impl Default for WeightRange {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 100.0,
        }
    }
}

impl WeightRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.lower && weight <= self.upper
    }

    /// The range allowed by both `self` and `other`.
    pub fn intersect(&self, other: &WeightRange) -> WeightRange {
        WeightRange {
            lower: self.lower.max(other.lower),
            upper: self.upper.min(other.upper),
        }
    }
}

/// A `category: value` tag annotated on body shapes (morphs or presets).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyShapeDescriptor {
    pub category: String,
    pub value: String,
}

impl BodyShapeDescriptor {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for BodyShapeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category, self.value)
    }
}

/// Named sets of races usable in allowed/disallowed race filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceGroupings {
    groupings: BTreeMap<String, BTreeSet<String>>,
}

impl RaceGroupings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grouping<I, S>(mut self, label: impl Into<String>, races: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groupings
            .insert(label.into(), races.into_iter().map(Into::into).collect());
        self
    }

    /// Union of the races of all `labels`; unknown labels contribute nothing.
    pub fn resolve(&self, labels: &BTreeSet<String>) -> BTreeSet<String> {
        labels
            .iter()
            .filter_map(|l| self.groupings.get(l))
            .flatten()
            .cloned()
            .collect()
    }
}

/// Per-NPC eligibility rules shared by subgroups and whole asset packs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EligibilityRules {
    /// When false, only NPCs matching a ForceIf attribute (or explicitly
    /// assigned) may receive this subgroup.
    pub distribution_enabled: bool,
    pub allowed_races: BTreeSet<String>,
    pub disallowed_races: BTreeSet<String>,
    pub allowed_race_groupings: BTreeSet<String>,
    pub disallowed_race_groupings: BTreeSet<String>,
    pub allowed_attributes: Vec<Attribute>,
    pub disallowed_attributes: Vec<Attribute>,
    pub allow_unique: bool,
    pub allow_non_unique: bool,
    pub weight_range: WeightRange,
    pub allowed_body_shape_descriptors: BTreeSet<BodyShapeDescriptor>,
    pub disallowed_body_shape_descriptors: BTreeSet<BodyShapeDescriptor>,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            distribution_enabled: true,
            allowed_races: BTreeSet::new(),
            disallowed_races: BTreeSet::new(),
            allowed_race_groupings: BTreeSet::new(),
            disallowed_race_groupings: BTreeSet::new(),
            allowed_attributes: Vec::new(),
            disallowed_attributes: Vec::new(),
            allow_unique: true,
            allow_non_unique: true,
            weight_range: WeightRange::default(),
            allowed_body_shape_descriptors: BTreeSet::new(),
            disallowed_body_shape_descriptors: BTreeSet::new(),
        }
    }
}

/// One authored subgroup, possibly containing nested subgroups.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subgroup {
    /// Unique within the asset pack.
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub probability_weighting: u32,
    pub rules: EligibilityRules,
    /// Ids that must be present elsewhere in any combination containing
    /// this subgroup.
    pub required_subgroups: BTreeSet<String>,
    /// Ids that must not be present elsewhere in any combination containing
    /// this subgroup.
    pub excluded_subgroups: BTreeSet<String>,
    pub subgroups: Vec<Subgroup>,
}

impl Subgroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            probability_weighting: 1,
            rules: EligibilityRules::default(),
            required_subgroups: BTreeSet::new(),
            excluded_subgroups: BTreeSet::new(),
            subgroups: Vec::new(),
        }
    }

    pub fn with_subgroup(mut self, child: Subgroup) -> Self {
        self.subgroups.push(child);
        self
    }

    pub fn with_probability_weighting(mut self, weighting: u32) -> Self {
        self.probability_weighting = weighting;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_rules(mut self, rules: EligibilityRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_allowed_attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.rules.allowed_attributes.push(attribute.into());
        self
    }

    pub fn with_disallowed_attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.rules.disallowed_attributes.push(attribute.into());
        self
    }

    pub fn requires(mut self, id: impl Into<String>) -> Self {
        self.required_subgroups.insert(id.into());
        self
    }

    pub fn excludes(mut self, id: impl Into<String>) -> Self {
        self.excluded_subgroups.insert(id.into());
        self
    }
}

/// An authored asset pack.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetPack {
    pub name: String,
    pub gender: Gender,
    /// Rules applying to the pack as a whole.
    pub distribution_rules: EligibilityRules,
    /// Top-level subgroups; each becomes one slot of a combination.
    pub subgroups: Vec<Subgroup>,
    /// Attribute groups defined by this pack.
    pub attribute_groups: Vec<AttributeGroup>,
}

impl AssetPack {
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            gender,
            distribution_rules: EligibilityRules::default(),
            subgroups: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }

    pub fn with_subgroup(mut self, subgroup: Subgroup) -> Self {
        self.subgroups.push(subgroup);
        self
    }

    pub fn with_distribution_rules(mut self, rules: EligibilityRules) -> Self {
        self.distribution_rules = rules;
        self
    }

    pub fn with_attribute_group(mut self, group: AttributeGroup) -> Self {
        self.attribute_groups.push(group);
        self
    }
}
