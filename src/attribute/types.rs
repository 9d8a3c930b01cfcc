//! Attribute tree data model.
//!
//! An attribute list is an AND of [`Attribute`]s; each attribute is an OR of
//! [`AttributeNode`]s; each node tests one NPC property against a set of
//! reference keys.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Default inclusive lower bound of a faction rank range.
pub const DEFAULT_RANK_MIN: i32 = -1;

/// Default inclusive upper bound of a faction rank range.
pub const DEFAULT_RANK_MAX: i32 = 100;

/// The property a node tests, with the keys it matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeKind {
    Class(BTreeSet<String>),
    /// Faction membership with an inclusive rank range.
    Faction {
        factions: BTreeSet<String>,
        rank_min: i32,
        rank_max: i32,
    },
    FaceTexture(BTreeSet<String>),
    Race(BTreeSet<String>),
    /// Matches the NPC's own record key.
    Npc(BTreeSet<String>),
    VoiceType(BTreeSet<String>),
    /// Reference to named [`AttributeGroup`]s, expanded before matching.
    Group(BTreeSet<String>),
    /// Matches a free-form NPC property.
    Custom {
        field: String,
        values: BTreeSet<String>,
    },
}

impl AttributeKind {
    /// Short type name used in report lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeKind::Class(_) => "Class",
            AttributeKind::Faction { .. } => "Faction",
            AttributeKind::FaceTexture(_) => "FaceTexture",
            AttributeKind::Race(_) => "Race",
            AttributeKind::Npc(_) => "NPC",
            AttributeKind::VoiceType(_) => "VoiceType",
            AttributeKind::Group(_) => "Group",
            AttributeKind::Custom { .. } => "Custom",
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, AttributeKind::Group(_))
    }
}

/// One typed condition.
///
/// When `force_if` is set and the node matches, the owning subgroup or asset
/// pack becomes *preferred* for the NPC rather than merely permitted; `weight`
/// is added to its ForceIf score.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeNode {
    pub kind: AttributeKind,
    pub force_if: bool,
    pub weight: u32,
}

fn key_set<I, S>(keys: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    keys.into_iter().map(Into::into).collect()
}

impl AttributeNode {
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            force_if: false,
            weight: 1,
        }
    }

    pub fn class<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(AttributeKind::Class(key_set(keys)))
    }

    /// Faction node with the default rank range.
    pub fn faction<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::faction_ranked(keys, DEFAULT_RANK_MIN, DEFAULT_RANK_MAX)
    }

    pub fn faction_ranked<I: IntoIterator<Item = S>, S: Into<String>>(
        keys: I,
        rank_min: i32,
        rank_max: i32,
    ) -> Self {
        Self::new(AttributeKind::Faction {
            factions: key_set(keys),
            rank_min,
            rank_max,
        })
    }

    pub fn face_texture<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(AttributeKind::FaceTexture(key_set(keys)))
    }

    pub fn race<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(AttributeKind::Race(key_set(keys)))
    }

    pub fn npc<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(AttributeKind::Npc(key_set(keys)))
    }

    pub fn voice_type<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(AttributeKind::VoiceType(key_set(keys)))
    }

    pub fn group<I: IntoIterator<Item = S>, S: Into<String>>(labels: I) -> Self {
        Self::new(AttributeKind::Group(key_set(labels)))
    }

    pub fn custom<I: IntoIterator<Item = S>, S: Into<String>>(
        field: impl Into<String>,
        values: I,
    ) -> Self {
        Self::new(AttributeKind::Custom {
            field: field.into(),
            values: key_set(values),
        })
    }

    /// Marks the node as a ForceIf condition.
    pub fn forced(mut self) -> Self {
        self.force_if = true;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

impl fmt::Display for AttributeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
        match &self.kind {
            AttributeKind::Faction {
                factions,
                rank_min,
                rank_max,
            } => write!(f, "Faction: [{}] rank {}..={}", keys(factions), rank_min, rank_max)?,
            AttributeKind::Custom { field, values } => {
                write!(f, "Custom: {} in [{}]", field, keys(values))?
            }
            AttributeKind::Class(set)
            | AttributeKind::FaceTexture(set)
            | AttributeKind::Race(set)
            | AttributeKind::Npc(set)
            | AttributeKind::VoiceType(set)
            | AttributeKind::Group(set) => {
                write!(f, "{}: [{}]", self.kind.type_name(), keys(set))?
            }
        }
        if self.force_if {
            write!(f, " (ForceIf x{})", self.weight)?;
        }
        Ok(())
    }
}

/// An OR-combined set of nodes: the NPC must match at least one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub nodes: Vec<AttributeNode>,
}

impl Attribute {
    pub fn new(nodes: Vec<AttributeNode>) -> Self {
        Self { nodes }
    }

    pub fn has_group_nodes(&self) -> bool {
        self.nodes.iter().any(|n| n.kind.is_group())
    }
}

impl From<AttributeNode> for Attribute {
    fn from(node: AttributeNode) -> Self {
        Self { nodes: vec![node] }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.nodes.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", parts.join(" OR "))
    }
}

/// A reusable, named attribute list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeGroup {
    pub label: String,
    pub attributes: Vec<Attribute>,
}

impl AttributeGroup {
    pub fn new(label: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            label: label.into(),
            attributes,
        }
    }
}

/// Arena of attribute groups addressable by label.
///
/// Later definitions of the same label replace earlier ones, so plugin-level
/// groups can be overridden by appending the main settings' groups.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    pub(crate) groups: Vec<AttributeGroup>,
    pub(crate) index: HashMap<String, usize>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a group.
    pub fn insert(&mut self, group: AttributeGroup) {
        match self.index.get(&group.label) {
            Some(&i) => self.groups[i] = group,
            None => {
                self.index.insert(group.label.clone(), self.groups.len());
                self.groups.push(group);
            }
        }
    }

    pub fn with_group(mut self, group: AttributeGroup) -> Self {
        self.insert(group);
        self
    }

    pub fn get(&self, label: &str) -> Option<&AttributeGroup> {
        self.index.get(label).map(|&i| &self.groups[i])
    }

    pub(crate) fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl FromIterator<AttributeGroup> for GroupTable {
    fn from_iter<T: IntoIterator<Item = AttributeGroup>>(iter: T) -> Self {
        let mut table = GroupTable::new();
        for group in iter {
            table.insert(group);
        }
        table
    }
}
