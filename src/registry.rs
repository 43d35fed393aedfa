//! In-memory statue bookkeeping.
//!
//! [`StatueRegistry`] owns the primary mapping from owner identity to named
//! statues and the reverse index from statue identifier back to
//! `(owner, name)`. The two maps are maintained as a bijection: every
//! registered statue has exactly one reverse-index entry, and every removal
//! path drops both sides together. The reverse index exists so the
//! perish-event handler can resolve a dying entity in O(1) instead of
//! scanning every owner.

use bevy::prelude::*;
use hashbrown::HashMap;
use log::warn;
use rand::Rng;

use crate::components::{OwnerId, StatueId};

/// Resolution of a statue identifier back to its owning record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatueKey {
    /// Player the statue belongs to.
    pub owner: OwnerId,
    /// Statue name within that owner's namespace.
    pub name: String,
}

/// A registered statue: its live entity handle and identifier token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredStatue {
    /// Live entity in the host world.
    pub entity: Entity,
    /// Identifier token, also persisted with the record.
    pub id: StatueId,
}

/// Primary registry plus reverse lookup index.
#[derive(Resource, Default)]
pub struct StatueRegistry {
    by_owner: HashMap<OwnerId, HashMap<String, RegisteredStatue>>,
    by_id: HashMap<StatueId, StatueKey>,
}

impl StatueRegistry {
    /// Records a statue under `(owner, name)`.
    ///
    /// Returns the displaced prior entry when the name was already taken;
    /// the displaced entry's reverse-index entry is dropped, so the caller
    /// only needs to despawn its entity. The new statue's identifier is
    /// indexed; if the identifier was somehow already present the stale
    /// key is overwritten with a warning.
    pub fn insert(
        &mut self,
        owner: OwnerId,
        name: impl Into<String>,
        statue: RegisteredStatue,
    ) -> Option<RegisteredStatue> {
        let name = name.into();
        let displaced = self
            .by_owner
            .entry(owner)
            .or_default()
            .insert(name.clone(), statue.clone());
        if let Some(old) = &displaced {
            self.by_id.remove(&old.id);
        }
        if let Some(stale) = self.by_id.insert(statue.id, StatueKey { owner, name }) {
            warn!(
                "statue identifier remapped away from {}/{}",
                stale.owner, stale.name
            );
        }
        displaced
    }

    /// Looks up the live entity for `(owner, name)`.
    #[must_use]
    pub fn get(&self, owner: OwnerId, name: &str) -> Option<Entity> {
        self.get_registered(owner, name).map(|s| s.entity)
    }

    /// Looks up the full registered entry for `(owner, name)`.
    #[must_use]
    pub fn get_registered(&self, owner: OwnerId, name: &str) -> Option<&RegisteredStatue> {
        self.by_owner.get(&owner).and_then(|named| named.get(name))
    }

    /// Removes `(owner, name)` from both maps.
    ///
    /// Returns `None` without touching anything when the statue does not
    /// exist.
    pub fn remove(&mut self, owner: OwnerId, name: &str) -> Option<RegisteredStatue> {
        let named = self.by_owner.get_mut(&owner)?;
        let removed = named.remove(name)?;
        if named.is_empty() {
            self.by_owner.remove(&owner);
        }
        self.by_id.remove(&removed.id);
        Some(removed)
    }

    /// Removes a statue by identifier, the perish-event path.
    pub fn remove_by_id(&mut self, id: &StatueId) -> Option<(StatueKey, RegisteredStatue)> {
        let key = self.by_id.get(id)?.clone();
        let named = self.by_owner.get_mut(&key.owner)?;
        let removed = named.remove(&key.name)?;
        if named.is_empty() {
            self.by_owner.remove(&key.owner);
        }
        self.by_id.remove(id);
        Some((key, removed))
    }

    /// Resolves an identifier to its `(owner, name)` without removing it.
    #[must_use]
    pub fn resolve(&self, id: &StatueId) -> Option<&StatueKey> {
        self.by_id.get(id)
    }

    /// Statue names owned by `owner`, sorted for stable listing output.
    #[must_use]
    pub fn names(&self, owner: OwnerId) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_owner
            .get(&owner)
            .map(|named| named.keys().cloned().collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Whether `owner` currently has any statues.
    #[must_use]
    pub fn owner_is_empty(&self, owner: OwnerId) -> bool {
        self.by_owner.get(&owner).is_none_or(HashMap::is_empty)
    }

    /// Every owner with at least one statue.
    #[must_use]
    pub fn owners(&self) -> Vec<OwnerId> {
        self.by_owner.keys().copied().collect()
    }

    /// Total number of registered statues across all owners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_owner.values().map(HashMap::len).sum()
    }

    /// Whether the registry holds no statues at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }

    /// Empties both maps, yielding every entry for the shutdown walk.
    pub fn drain_all(&mut self) -> Vec<(StatueKey, RegisteredStatue)> {
        self.by_id.clear();
        let mut drained = Vec::new();
        for (owner, named) in self.by_owner.drain() {
            for (name, statue) in named {
                drained.push((StatueKey { owner, name }, statue));
            }
        }
        drained
    }

    /// Generates an identifier that is not yet indexed.
    ///
    /// Collisions in a 62^16 space are effectively impossible, but the
    /// retry keeps the global-uniqueness invariant unconditional.
    pub fn fresh_id<R: Rng + ?Sized>(&self, rng: &mut R) -> StatueId {
        loop {
            let id = StatueId::generate(rng);
            if !self.by_id.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerId {
        OwnerId::random()
    }

    fn statue(bits: u64, token: &str) -> RegisteredStatue {
        RegisteredStatue {
            entity: Entity::from_bits(bits),
            id: StatueId::new(token),
        }
    }

    #[test]
    fn insert_then_get_returns_the_entity() {
        let mut registry = StatueRegistry::default();
        let owner = owner();
        registry.insert(owner, "guard", statue(1, "aaaa"));

        assert_eq!(registry.get(owner, "guard"), Some(Entity::from_bits(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn insert_same_name_displaces_prior_entry_and_its_index() {
        let mut registry = StatueRegistry::default();
        let owner = owner();
        registry.insert(owner, "guard", statue(1, "aaaa"));
        let displaced = registry.insert(owner, "guard", statue(2, "bbbb"));

        assert_eq!(displaced, Some(statue(1, "aaaa")));
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(&StatueId::new("aaaa")).is_none());
        assert_eq!(
            registry.resolve(&StatueId::new("bbbb")).map(|k| k.owner),
            Some(owner)
        );
    }

    #[test]
    fn remove_missing_name_is_a_noop() {
        let mut registry = StatueRegistry::default();
        let owner = owner();
        registry.insert(owner, "guard", statue(1, "aaaa"));

        assert!(registry.remove(owner, "watcher").is_none());
        assert_eq!(registry.get(owner, "guard"), Some(Entity::from_bits(1)));
    }

    #[test]
    fn remove_drops_both_sides() {
        let mut registry = StatueRegistry::default();
        let owner = owner();
        registry.insert(owner, "guard", statue(1, "aaaa"));

        let removed = registry.remove(owner, "guard");
        assert_eq!(removed, Some(statue(1, "aaaa")));
        assert!(registry.resolve(&StatueId::new("aaaa")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_by_id_resolves_owner_and_name() {
        let mut registry = StatueRegistry::default();
        let owner = owner();
        registry.insert(owner, "guard", statue(1, "aaaa"));

        let (key, removed) = registry
            .remove_by_id(&StatueId::new("aaaa"))
            .expect("id should resolve");
        assert_eq!(key.owner, owner);
        assert_eq!(key.name, "guard");
        assert_eq!(removed.entity, Entity::from_bits(1));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_by_unknown_id_is_a_noop() {
        let mut registry = StatueRegistry::default();
        let owner = owner();
        registry.insert(owner, "guard", statue(1, "aaaa"));

        assert!(registry.remove_by_id(&StatueId::new("zzzz")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_sorted_and_scoped_to_owner() {
        let mut registry = StatueRegistry::default();
        let first = owner();
        let second = owner();
        registry.insert(first, "watcher", statue(1, "aaaa"));
        registry.insert(first, "guard", statue(2, "bbbb"));
        registry.insert(second, "pet", statue(3, "cccc"));

        assert_eq!(registry.names(first), vec!["guard", "watcher"]);
        assert_eq!(registry.names(second), vec!["pet"]);
        assert!(registry.names(owner()).is_empty());
    }

    #[test]
    fn drain_all_empties_everything() {
        let mut registry = StatueRegistry::default();
        registry.insert(owner(), "guard", statue(1, "aaaa"));
        registry.insert(owner(), "pet", statue(2, "bbbb"));

        let drained = registry.drain_all();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.resolve(&StatueId::new("aaaa")).is_none());
    }

    #[test]
    fn fresh_id_avoids_indexed_tokens() {
        let mut registry = StatueRegistry::default();
        registry.insert(owner(), "guard", statue(1, "aaaa"));

        let mut rng = rand::thread_rng();
        let id = registry.fresh_id(&mut rng);
        assert!(registry.resolve(&id).is_none());
    }
}
