//! Group expansion.
//!
//! Replaces every `Group` node with the nodes of the groups it references,
//! recursively. The labels currently being expanded are kept on a stack of
//! arena indices; meeting a label that is already on the stack is a circular
//! reference, which is reported and expands to nothing.

use super::types::{Attribute, AttributeKind, AttributeNode, GroupTable};
use crate::error::ConfigError;
use tracing::warn;

/// Output of expanding an attribute list.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Attribute list containing no `Group` nodes.
    pub attributes: Vec<Attribute>,
    /// Authoring errors met along the way.
    pub diagnostics: Vec<ConfigError>,
}

impl GroupTable {
    /// Expands all `Group` nodes in `attributes`.
    ///
    /// Nodes pulled in from a group inherit the referencing node's ForceIf
    /// flag and weight. An attribute left with no nodes after expansion is
    /// dropped, since it could never match.
    pub fn expand_attributes(&self, attributes: &[Attribute]) -> Expansion {
        let mut out = Expansion::default();
        for attribute in attributes {
            if !attribute.has_group_nodes() {
                out.attributes.push(attribute.clone());
                continue;
            }

            let mut nodes = Vec::new();
            for node in &attribute.nodes {
                match &node.kind {
                    AttributeKind::Group(labels) => {
                        let mut path = Vec::new();
                        for label in labels {
                            self.expand_label(node, label, &mut path, &mut nodes, &mut out.diagnostics);
                        }
                    }
                    _ => push_unique(&mut nodes, node.clone()),
                }
            }

            if nodes.is_empty() {
                warn!(attribute = %attribute, "attribute expanded to no conditions; dropping it");
            } else {
                out.attributes.push(Attribute::new(nodes));
            }
        }
        out
    }

    /// Expands a single `Group` node into its member nodes.
    ///
    /// Non-group nodes are returned unchanged as a single-element vector.
    pub fn expand_node(&self, node: &AttributeNode) -> (Vec<AttributeNode>, Vec<ConfigError>) {
        let mut nodes = Vec::new();
        let mut diagnostics = Vec::new();
        match &node.kind {
            AttributeKind::Group(labels) => {
                let mut path = Vec::new();
                for label in labels {
                    self.expand_label(node, label, &mut path, &mut nodes, &mut diagnostics);
                }
            }
            _ => nodes.push(node.clone()),
        }
        (nodes, diagnostics)
    }

    fn expand_label(
        &self,
        origin: &AttributeNode,
        label: &str,
        path: &mut Vec<usize>,
        out: &mut Vec<AttributeNode>,
        diagnostics: &mut Vec<ConfigError>,
    ) {
        let Some(idx) = self.index_of(label) else {
            warn!(label, "attribute group is not defined");
            diagnostics.push(ConfigError::UnknownGroupLabel(label.to_string()));
            return;
        };

        if path.contains(&idx) {
            let mut labels: Vec<String> = path
                .iter()
                .map(|&i| self.groups[i].label.clone())
                .collect();
            labels.push(label.to_string());
            let err = ConfigError::CircularGroupReference { path: labels };
            warn!(%err, "skipping group reference");
            diagnostics.push(err);
            return;
        }

        path.push(idx);
        for attribute in &self.groups[idx].attributes {
            for node in &attribute.nodes {
                match &node.kind {
                    AttributeKind::Group(labels) => {
                        for nested in labels {
                            self.expand_label(origin, nested, path, out, diagnostics);
                        }
                    }
                    _ => {
                        let mut inherited = node.clone();
                        inherited.force_if = origin.force_if;
                        inherited.weight = origin.weight;
                        push_unique(out, inherited);
                    }
                }
            }
        }
        path.pop();
    }
}

fn push_unique(nodes: &mut Vec<AttributeNode>, node: AttributeNode) {
    if !nodes.contains(&node) {
        nodes.push(node);
    }
}
