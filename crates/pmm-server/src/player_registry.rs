//! Player-name tag allocation: assigns the lowest free disambiguating tag
//! for each display name so two connected clients may share a name without
//! colliding on the wire-level `player_full_name` identity.
//!
//! Grounded on the original server's per-name tag pool (skip the reserved
//! `0` tag, skip tags already handed out, take the lowest free one) and,
//! for the lock choice, the same reasoning as `room_store`: allocation is
//! pure bookkeeping, never an await point.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;
use pmm_core::codec::FixedString;
use pmm_core::player_name::{NAME_MAX_BYTES, PlayerFullName};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlayerRegistryError {
    #[error("no free tag remains for that name")]
    TagsExhausted,
    #[error("that name/tag pair is not registered")]
    NotRegistered,
}

/// Tags a name has handed out, plus where the next scan should start.
struct NameEntry {
    /// Lowest tag worth trying first. Bumped past each freshly-assigned tag
    /// so a busy, never-shrinking name allocates in O(1); pulled back down
    /// to a released tag so the lowest-free-tag guarantee still holds once
    /// churn frees up an earlier slot.
    next_tag_hint: u16,
    used_tags: BTreeSet<u16>,
}

impl Default for NameEntry {
    fn default() -> Self {
        Self { next_tag_hint: 1, used_tags: BTreeSet::new() }
    }
}

pub const MAX_TAGS_PER_NAME: usize = 65535;

#[derive(Default)]
pub struct PlayerNameRegistry {
    entries: Mutex<HashMap<FixedString<NAME_MAX_BYTES>, NameEntry>>,
}

impl PlayerNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the lowest tag `>= 1` not already held for `name`, scanning
    /// forward from `next_tag_hint`.
    pub fn assign(&self, name: FixedString<NAME_MAX_BYTES>) -> Result<PlayerFullName, PlayerRegistryError> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(name.clone()).or_default();

        if entry.used_tags.len() >= MAX_TAGS_PER_NAME {
            return Err(PlayerRegistryError::TagsExhausted);
        }

        let mut candidate = entry.next_tag_hint.max(1);
        while entry.used_tags.contains(&candidate) {
            candidate = candidate.checked_add(1).ok_or(PlayerRegistryError::TagsExhausted)?;
        }

        entry.used_tags.insert(candidate);
        entry.next_tag_hint = candidate.checked_add(1).unwrap_or(candidate);
        Ok(PlayerFullName::new(name, candidate))
    }

    pub fn release(&self, full_name: &PlayerFullName) -> Result<(), PlayerRegistryError> {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&full_name.name) else {
            return Err(PlayerRegistryError::NotRegistered);
        };
        if !entry.used_tags.remove(&full_name.tag) {
            return Err(PlayerRegistryError::NotRegistered);
        }
        if entry.used_tags.is_empty() {
            entries.remove(&full_name.name);
        } else {
            entry.next_tag_hint = entry.next_tag_hint.min(full_name.tag);
        }
        Ok(())
    }

    pub fn contains(&self, full_name: &PlayerFullName) -> bool {
        self.entries
            .lock()
            .get(&full_name.name)
            .is_some_and(|entry| entry.used_tags.contains(&full_name.tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> FixedString<NAME_MAX_BYTES> {
        FixedString::new(s).unwrap()
    }

    #[test]
    fn first_assignment_gets_tag_one() {
        let registry = PlayerNameRegistry::new();
        let assigned = registry.assign(name("alice")).unwrap();
        assert_eq!(assigned.tag, 1);
    }

    #[test]
    fn second_assignment_for_same_name_gets_next_tag() {
        let registry = PlayerNameRegistry::new();
        registry.assign(name("alice")).unwrap();
        let second = registry.assign(name("alice")).unwrap();
        assert_eq!(second.tag, 2);
    }

    #[test]
    fn different_names_each_start_at_tag_one() {
        let registry = PlayerNameRegistry::new();
        let a = registry.assign(name("alice")).unwrap();
        let b = registry.assign(name("bob")).unwrap();
        assert_eq!(a.tag, 1);
        assert_eq!(b.tag, 1);
    }

    #[test]
    fn release_frees_the_tag_for_reuse() {
        let registry = PlayerNameRegistry::new();
        let first = registry.assign(name("alice")).unwrap();
        registry.assign(name("alice")).unwrap();
        registry.release(&first).unwrap();
        let reassigned = registry.assign(name("alice")).unwrap();
        assert_eq!(reassigned.tag, 1);
    }

    #[test]
    fn release_unknown_name_fails() {
        let registry = PlayerNameRegistry::new();
        let ghost = PlayerFullName::new(name("nobody"), 1);
        assert_eq!(registry.release(&ghost), Err(PlayerRegistryError::NotRegistered));
    }

    #[test]
    fn contains_reflects_current_allocation() {
        let registry = PlayerNameRegistry::new();
        let assigned = registry.assign(name("alice")).unwrap();
        assert!(registry.contains(&assigned));
        registry.release(&assigned).unwrap();
        assert!(!registry.contains(&assigned));
    }

    #[test]
    fn lowest_free_tag_wins_even_when_a_higher_tag_is_also_free() {
        let registry = PlayerNameRegistry::new();
        let t1 = registry.assign(name("alice")).unwrap();
        let _t2 = registry.assign(name("alice")).unwrap();
        let t3 = registry.assign(name("alice")).unwrap();
        registry.release(&t1).unwrap();
        registry.release(&t3).unwrap();
        let next = registry.assign(name("alice")).unwrap();
        assert_eq!(next.tag, 1);
    }
}
