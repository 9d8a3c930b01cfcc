//! Shared assignment stores.
//!
//! Both stores are owned by the caller (usually through an
//! [`AssetAssigner`](super::AssetAssigner)) and may be shared across threads.

use crate::filter::AssignmentMode;
use crate::generator::Combination;
use crate::npc::Gender;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};
use tracing::warn;

type ByMode = HashMap<AssignmentMode, Combination>;

/// Combinations assigned to linked unique NPCs, keyed by name and gender.
///
/// The first NPC of a given name and gender to be assigned in a mode
/// determines the combination every later one reuses.
#[derive(Debug, Default)]
pub struct UniqueNpcStore {
    entries: RwLock<HashMap<(String, Gender), ByMode>>,
}

impl UniqueNpcStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str, gender: Gender, mode: &AssignmentMode) -> Option<Combination> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(name.to_string(), gender))
            .and_then(|by_mode| by_mode.get(mode))
            .cloned()
    }

    /// Stores `combination` unless one is already recorded for this name,
    /// gender and mode. Returns whether it was stored.
    pub fn record_if_absent(
        &self,
        name: &str,
        gender: Gender,
        mode: &AssignmentMode,
        combination: &Combination,
    ) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let by_mode = entries.entry((name.to_string(), gender)).or_default();
        if by_mode.contains_key(mode) {
            return false;
        }
        by_mode.insert(mode.clone(), combination.clone());
        true
    }

    /// Number of (name, gender) pairs with at least one recorded combination.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// A user-defined group of NPCs that share their assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkedNpcGroup {
    pub label: String,
    /// NPC record keys, including the primary.
    pub members: BTreeSet<String>,
    /// The member whose assignment the others copy.
    pub primary: String,
}

impl LinkedNpcGroup {
    pub fn new<I, S>(label: impl Into<String>, primary: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let primary = primary.into();
        let mut members: BTreeSet<String> = members.into_iter().map(Into::into).collect();
        members.insert(primary.clone());
        Self {
            label: label.into(),
            members,
            primary,
        }
    }

    pub fn is_primary(&self, key: &str) -> bool {
        self.primary == key
    }
}

/// Linked NPC groups and the combinations their primaries received.
#[derive(Debug, Default)]
pub struct LinkedGroupStore {
    groups: Vec<LinkedNpcGroup>,
    by_member: HashMap<String, usize>,
    assigned: RwLock<Vec<ByMode>>,
}

impl LinkedGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group. An NPC already belonging to an earlier group stays
    /// there.
    pub fn with_group(mut self, group: LinkedNpcGroup) -> Self {
        let index = self.groups.len();
        for member in &group.members {
            if let Some(&existing) = self.by_member.get(member) {
                warn!(
                    npc = %member,
                    group = %group.label,
                    kept = %self.groups[existing].label,
                    "NPC belongs to more than one linked group"
                );
                continue;
            }
            self.by_member.insert(member.clone(), index);
        }
        self.groups.push(group);
        self.assigned
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ByMode::new());
        self
    }

    pub fn groups(&self) -> &[LinkedNpcGroup] {
        &self.groups
    }

    /// The group `key` belongs to, if any.
    pub fn group_of(&self, key: &str) -> Option<&LinkedNpcGroup> {
        self.by_member.get(key).map(|&i| &self.groups[i])
    }

    pub fn is_primary(&self, key: &str) -> bool {
        self.group_of(key).is_some_and(|g| g.is_primary(key))
    }

    /// The combination recorded for the group of `key` in `mode`.
    pub fn get(&self, key: &str, mode: &AssignmentMode) -> Option<Combination> {
        let &index = self.by_member.get(key)?;
        let assigned = self.assigned.read().unwrap_or_else(PoisonError::into_inner);
        assigned.get(index).and_then(|by_mode| by_mode.get(mode)).cloned()
    }

    /// Records `combination` for the group of `key`, if `key` is the group's
    /// primary. Returns whether it was recorded.
    pub fn record(&self, key: &str, mode: &AssignmentMode, combination: &Combination) -> bool {
        let Some(&index) = self.by_member.get(key) else {
            return false;
        };
        if !self.groups[index].is_primary(key) {
            return false;
        }
        let mut assigned = self.assigned.write().unwrap_or_else(PoisonError::into_inner);
        match assigned.get_mut(index) {
            Some(by_mode) => {
                by_mode.insert(mode.clone(), combination.clone());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(pack: &str) -> Combination {
        Combination::new(pack, Vec::new())
    }

    #[test]
    fn test_unique_first_wins() {
        let store = UniqueNpcStore::new();
        let mode = AssignmentMode::Primary;

        assert!(store.record_if_absent("Lydia", Gender::Female, &mode, &combo("A")));
        assert!(!store.record_if_absent("Lydia", Gender::Female, &mode, &combo("B")));
        assert_eq!(store.get("Lydia", Gender::Female, &mode).map(|c| c.asset_pack), Some("A".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unique_keyed_by_gender_and_mode() {
        let store = UniqueNpcStore::new();
        store.record_if_absent("Sam", Gender::Male, &AssignmentMode::Primary, &combo("A"));

        assert!(store.get("Sam", Gender::Female, &AssignmentMode::Primary).is_none());
        assert!(store.get("Sam", Gender::Male, &AssignmentMode::MixIn).is_none());

        let replacer = AssignmentMode::Replacer {
            replacer: "Eyes".into(),
        };
        assert!(store.record_if_absent("Sam", Gender::Male, &replacer, &combo("R")));
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_linked_group_primary_records() {
        let store = LinkedGroupStore::new().with_group(LinkedNpcGroup::new("Twins", "01", ["02"]));
        let mode = AssignmentMode::Primary;

        assert!(store.is_primary("01"));
        assert!(!store.is_primary("02"));
        assert!(!store.record("02", &mode, &combo("A")));
        assert!(store.get("02", &mode).is_none());

        assert!(store.record("01", &mode, &combo("A")));
        assert_eq!(store.get("02", &mode).map(|c| c.asset_pack), Some("A".into()));
        assert!(store.get("99", &mode).is_none());
    }

    #[test]
    fn test_member_kept_in_first_group() {
        let store = LinkedGroupStore::new()
            .with_group(LinkedNpcGroup::new("G1", "01", ["02"]))
            .with_group(LinkedNpcGroup::new("G2", "03", ["02"]));

        assert_eq!(store.group_of("02").map(|g| g.label.as_str()), Some("G1"));
        assert_eq!(store.group_of("03").map(|g| g.label.as_str()), Some("G2"));
        assert_eq!(store.groups().len(), 2);
    }
}
