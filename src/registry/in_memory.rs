use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::entities::{Entity, EntityKey, EntityKind};
use crate::errors::{LedgerError, Result};
use crate::registry::{Change, Changeset, Registry};

/// A thread-safe in-memory registry.
///
/// Uses `Arc<RwLock<HashMap<EntityKey, Entity>>>` so clones share one store.
/// Commits are staged against the current map under the write lock and
/// applied only if every change validates.
#[derive(Default, Clone)]
pub struct InMemoryRegistry {
    entities: Arc<RwLock<HashMap<EntityKey, Entity>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of stored entities
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}

/// checks one change against the latest visible state and returns the entity to store
fn stage(current: Option<&Entity>, change: Change) -> Result<Entity> {
    match change {
        Change::Insert(mut entity) => {
            if current.is_some() {
                return Err(LedgerError::DuplicateKey { key: entity.key() });
            }
            entity.set_version(0);
            Ok(entity)
        }
        Change::Update(mut entity) => {
            let key = entity.key();
            let stored = current.ok_or_else(|| key.not_found())?;
            if stored.version() != entity.version() {
                return Err(LedgerError::Conflict {
                    key,
                    expected: entity.version(),
                    found: stored.version(),
                });
            }
            entity.set_version(stored.version() + 1);
            Ok(entity)
        }
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn get(&self, key: &EntityKey) -> Result<Entity> {
        let entities = self.entities.read().await;
        entities.get(key).cloned().ok_or_else(|| key.not_found())
    }

    async fn add(&self, entity: Entity) -> Result<()> {
        let mut changes = Changeset::new();
        changes.insert(entity);
        self.commit(changes).await
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        let mut changes = Changeset::new();
        changes.update(entity);
        self.commit(changes).await
    }

    async fn commit(&self, changes: Changeset) -> Result<()> {
        let mut entities = self.entities.write().await;
        let mut staged: HashMap<EntityKey, Entity> = HashMap::with_capacity(changes.len());

        for change in changes {
            let key = change.key();
            let current = staged.get(&key).or_else(|| entities.get(&key));
            let next = stage(current, change)?;
            staged.insert(key, next);
        }

        entities.extend(staged);
        Ok(())
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        let entities = self.entities.read().await;
        let mut found: Vec<Entity> = entities
            .values()
            .filter(|entity| entity.kind() == kind)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(found)
    }
}
