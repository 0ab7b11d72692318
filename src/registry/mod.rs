//! Registry gateway: the key-value store the ledger reads entities from and
//! commits transitions to.
//!
//! Implementations must make `commit` all-or-nothing and must reject an
//! update whose `version` differs from the stored one.

pub mod in_memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{Entity, EntityKey, EntityKind};
use crate::errors::Result;

pub use in_memory::InMemoryRegistry;

/// one write inside a changeset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// new entity; fails with `DuplicateKey` if the key exists
    Insert(Entity),
    /// replacement; the entity carries the version it was read at
    Update(Entity),
}

impl Change {
    pub fn entity(&self) -> &Entity {
        match self {
            Change::Insert(entity) | Change::Update(entity) => entity,
        }
    }

    pub fn into_entity(self) -> Entity {
        match self {
            Change::Insert(entity) | Change::Update(entity) => entity,
        }
    }

    pub fn key(&self) -> EntityKey {
        self.entity().key()
    }
}

/// writes committed together or not at all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    changes: Vec<Change>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: impl Into<Entity>) -> &mut Self {
        self.changes.push(Change::Insert(entity.into()));
        self
    }

    pub fn update(&mut self, entity: impl Into<Entity>) -> &mut Self {
        self.changes.push(Change::Update(entity.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn keys(&self) -> Vec<EntityKey> {
        self.changes.iter().map(Change::key).collect()
    }

    /// entity written under `key`, if any
    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.changes
            .iter()
            .map(Change::entity)
            .find(|entity| entity.key() == *key)
    }
}

impl IntoIterator for Changeset {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

#[async_trait]
pub trait Registry: Send + Sync {
    /// fetch by key, `NotFound` if absent
    async fn get(&self, key: &EntityKey) -> Result<Entity>;

    /// add a new entity, `DuplicateKey` if present
    async fn add(&self, entity: Entity) -> Result<()>;

    /// replace an entity, `Conflict` if its version is stale
    async fn update(&self, entity: Entity) -> Result<()>;

    /// apply every change atomically
    async fn commit(&self, changes: Changeset) -> Result<()>;

    /// every stored entity of one kind
    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>>;
}

pub type RegistryBox = Box<dyn Registry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Borrower, Lender};
    use crate::money::Money;

    #[test]
    fn test_changeset_lookup() {
        let mut changes = Changeset::new();
        changes
            .update(Lender::new("l1", Money::new(400)))
            .insert(Borrower::new("b1", Money::new(1000), Money::ZERO));

        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes.keys(),
            vec![EntityKey::lender("l1"), EntityKey::borrower("b1")]
        );
        assert!(matches!(
            changes.get(&EntityKey::lender("l1")),
            Some(Entity::Lender(l)) if l.account_balance == Money::new(400)
        ));
        assert!(changes.get(&EntityKey::lender("l2")).is_none());
    }
}
