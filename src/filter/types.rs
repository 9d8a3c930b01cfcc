//! Filter inputs and outputs.

use super::assignment::{AssignmentMode, NpcAssignment};
use crate::pack::{BodyShapeDescriptor, FlattenedAssetPack, FlattenedSubgroup};
use crate::selection::{Prioritized, Weighted};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Where a candidate came from: pack index in the filter input, slot
/// position, and index within the unfiltered slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotCoord {
    pub pack: usize,
    pub position: usize,
    pub index: usize,
}

/// A flattened subgroup that passed eligibility for one NPC.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub subgroup: Arc<FlattenedSubgroup>,
    pub coord: SlotCoord,
    /// ForceIf score of this subgroup for the NPC under evaluation.
    pub force_if_weight: u32,
}

impl Candidate {
    pub fn id(&self) -> &str {
        &self.subgroup.id
    }

    pub fn position(&self) -> usize {
        self.coord.position
    }
}

impl Weighted for Candidate {
    fn probability_weighting(&self) -> u32 {
        self.subgroup.probability_weighting
    }
}

impl Prioritized for Candidate {
    fn force_if_weight(&self) -> u32 {
        self.force_if_weight
    }
}

/// A pack that survived filtering, with its narrowed slots.
#[derive(Debug, Clone)]
pub struct EligiblePack {
    /// Index of the pack in the filter input.
    pub index: usize,
    pub pack: Arc<FlattenedAssetPack>,
    /// ForceIf score of the whole-pack rules.
    pub force_if_weight: u32,
    /// Remaining candidates per slot, highest ForceIf score first.
    pub slots: Vec<Vec<Candidate>>,
    /// Whether the pack was selected by an explicit assignment.
    pub pinned: bool,
}

impl EligiblePack {
    pub fn name(&self) -> &str {
        &self.pack.name
    }

    /// Leaf ids remaining at `position`.
    pub fn ids_at(&self, position: usize) -> Vec<&str> {
        self.slots
            .get(position)
            .map(|slot| slot.iter().map(Candidate::id).collect())
            .unwrap_or_default()
    }
}

/// Per-NPC context for one filter pass.
#[derive(Debug, Clone, Default)]
pub struct FilterRequest<'a> {
    pub mode: AssignmentMode,
    /// Explicit, user-authored assignment.
    pub specific: Option<&'a NpcAssignment>,
    /// Assignment recorded by a previous run.
    pub consistency: Option<&'a NpcAssignment>,
    pub ignore_consistency: bool,
    /// Descriptors of the body shape already assigned to the NPC, if any.
    pub body_shape: Option<&'a BTreeSet<BodyShapeDescriptor>>,
}

impl<'a> FilterRequest<'a> {
    pub fn new(mode: AssignmentMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_specific(mut self, assignment: &'a NpcAssignment) -> Self {
        self.specific = Some(assignment);
        self
    }

    pub fn with_consistency(mut self, assignment: &'a NpcAssignment) -> Self {
        self.consistency = Some(assignment);
        self
    }

    pub fn with_ignore_consistency(mut self, ignore: bool) -> Self {
        self.ignore_consistency = ignore;
        self
    }

    pub fn with_body_shape(mut self, descriptors: &'a BTreeSet<BodyShapeDescriptor>) -> Self {
        self.body_shape = Some(descriptors);
        self
    }
}

/// Result of one filter pass.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub packs: Vec<EligiblePack>,
    /// The output was restricted to the pack recorded for consistency.
    pub filtered_by_consistency: bool,
    /// Human-readable trace of every elimination and relaxation.
    pub report: Vec<String>,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&EligiblePack> {
        self.packs.iter().find(|p| p.name() == name)
    }
}
