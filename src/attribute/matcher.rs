//! Evaluation of attribute lists against an NPC.

use super::types::{Attribute, AttributeKind, AttributeNode, GroupTable};
use crate::npc::NpcDescriptor;

/// Result of matching an attribute list against one NPC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Whether the list contained any attribute at all.
    pub has_restrictions: bool,
    /// Every attribute had at least one matching node (vacuously true when
    /// the list is empty).
    pub is_match: bool,
    /// Sum of the weights of all matched ForceIf nodes.
    pub force_if_weight: u32,
    /// Attributes that matched, with the nodes responsible.
    pub matched_log: Vec<String>,
    /// Attributes that did not match.
    pub unmatched_log: Vec<String>,
    /// Matched ForceIf nodes.
    pub force_if_log: Vec<String>,
}

/// Stateless attribute matcher.
///
/// # Examples
///
/// ```
/// use u_variants::attribute::{Attribute, AttributeMatcher, AttributeNode, GroupTable};
/// use u_variants::npc::{Gender, NpcDescriptor};
///
/// let npc = NpcDescriptor::new("0001", "NordRace", Gender::Male).with_class("Warrior");
/// let attributes = vec![
///     Attribute::new(vec![AttributeNode::race(["NordRace", "ImperialRace"])]),
///     Attribute::new(vec![AttributeNode::class(["Warrior"]).forced().with_weight(3)]),
/// ];
///
/// let outcome = AttributeMatcher::matches(&attributes, &npc, &GroupTable::new());
/// assert!(outcome.is_match);
/// assert_eq!(outcome.force_if_weight, 3);
/// ```
pub struct AttributeMatcher;

impl AttributeMatcher {
    /// Matches an AND-list of OR-attributes against `npc`.
    ///
    /// `Group` nodes are normally expanded at flatten time; any that remain
    /// are resolved through `groups` here.
    pub fn matches(attributes: &[Attribute], npc: &NpcDescriptor, groups: &GroupTable) -> MatchOutcome {
        let mut outcome = MatchOutcome {
            has_restrictions: !attributes.is_empty(),
            is_match: true,
            ..MatchOutcome::default()
        };

        for attribute in attributes {
            let mut matched: Vec<AttributeNode> = Vec::new();
            for node in &attribute.nodes {
                collect_matches(node, npc, groups, &mut matched);
            }

            if matched.is_empty() {
                outcome.is_match = false;
                outcome.unmatched_log.push(attribute.to_string());
                continue;
            }

            let described: Vec<String> = matched.iter().map(ToString::to_string).collect();
            outcome.matched_log.push(described.join(" | "));

            for node in matched.iter().filter(|n| n.force_if) {
                outcome.force_if_weight = outcome.force_if_weight.saturating_add(node.weight);
                outcome.force_if_log.push(node.to_string());
            }
        }

        outcome
    }

    /// Whether a single non-group node matches `npc`.
    ///
    /// Always false for `Group` nodes; use [`matches`](Self::matches) to
    /// resolve those.
    pub fn node_matches(node: &AttributeNode, npc: &NpcDescriptor) -> bool {
        let has = |set: &std::collections::BTreeSet<String>, value: Option<&String>| {
            value.is_some_and(|v| set.contains(v))
        };

        match &node.kind {
            AttributeKind::Class(set) => has(set, npc.class.as_ref()),
            AttributeKind::Faction {
                factions,
                rank_min,
                rank_max,
            } => npc.in_any_faction(factions, *rank_min, *rank_max),
            AttributeKind::FaceTexture(set) => has(set, npc.face_texture.as_ref()),
            AttributeKind::Race(set) => set.contains(&npc.race),
            AttributeKind::Npc(set) => set.contains(&npc.key),
            AttributeKind::VoiceType(set) => has(set, npc.voice_type.as_ref()),
            AttributeKind::Group(_) => false,
            AttributeKind::Custom { field, values } => has(values, npc.custom.get(field)),
        }
    }
}

fn collect_matches(node: &AttributeNode, npc: &NpcDescriptor, groups: &GroupTable, out: &mut Vec<AttributeNode>) {
    if node.kind.is_group() {
        let (expanded, _) = groups.expand_node(node);
        out.extend(
            expanded
                .into_iter()
                .filter(|n| AttributeMatcher::node_matches(n, npc)),
        );
    } else if AttributeMatcher::node_matches(node, npc) {
        out.push(node.clone());
    }
}
