use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use totes_core::{Entity, EntityId};

use super::{Repository, StoreError};

type KeySlot = (&'static str, String);

#[derive(Debug)]
struct State<E> {
    rows: BTreeMap<i64, E>,
    last_id: i64,
    keys: HashMap<KeySlot, i64>,
}

/// Process-local repository for dev and tests.
///
/// Key checks and writes happen under one write lock, so uniqueness holds
/// under concurrent inserts.
#[derive(Debug)]
pub struct InMemoryRepository<E> {
    state: RwLock<State<E>>,
}

impl<E> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                rows: BTreeMap::new(),
                last_id: 0,
                keys: HashMap::new(),
            }),
        }
    }
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

fn slots<E: Entity>(entity: &E) -> Vec<KeySlot> {
    entity
        .unique_keys()
        .into_iter()
        .map(|k| (k.name, k.value))
        .collect()
}

impl<E: Entity> State<E> {
    /// First key of `entity` that is held by a different record.
    fn conflicting_key(&self, entity: &E, owner: i64) -> Option<&'static str> {
        slots(entity)
            .into_iter()
            .find(|slot| self.keys.get(slot).is_some_and(|holder| *holder != owner))
            .map(|(name, _)| name)
    }

    fn release_keys(&mut self, id: i64) {
        self.keys.retain(|_, holder| *holder != id);
    }
}

#[async_trait::async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn get(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.rows.get(&id.get()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.rows.values().cloned().collect())
    }

    async fn search(&self, field: &str, needle: &str) -> Result<Vec<E>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .rows
            .values()
            .filter(|e| e.matches(field, needle))
            .cloned()
            .collect())
    }

    async fn filter_eq(&self, field: &str, value: &str) -> Result<Vec<E>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .rows
            .values()
            .filter(|e| e.field(field).as_deref() == Some(value))
            .cloned()
            .collect())
    }

    async fn find_by_key(&self, key: &str, value: &str) -> Result<Option<E>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let holder = state
            .keys
            .iter()
            .find(|((name, v), _)| *name == key && v == value)
            .map(|(_, id)| *id);
        Ok(holder.and_then(|id| state.rows.get(&id).cloned()))
    }

    async fn insert(&self, mut entity: E) -> Result<E, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if let Some(key) = state.conflicting_key(&entity, 0) {
            return Err(StoreError::UniqueViolation { key: key.to_string() });
        }

        let id = state.last_id + 1;
        let assigned = EntityId::new(id).map_err(|e| StoreError::Backend(e.to_string()))?;
        entity.set_id(assigned);

        state.last_id = id;
        for slot in slots(&entity) {
            state.keys.insert(slot, id);
        }
        state.rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<Option<E>, StoreError> {
        let id = entity.id().get();
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if !state.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(key) = state.conflicting_key(&entity, id) {
            return Err(StoreError::UniqueViolation { key: key.to_string() });
        }

        state.release_keys(id);
        for slot in slots(&entity) {
            state.keys.insert(slot, id);
        }
        state.rows.insert(id, entity.clone());
        Ok(Some(entity))
    }

    async fn delete(&self, id: EntityId) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let removed = state.rows.remove(&id.get()).is_some();
        if removed {
            state.release_keys(id.get());
        }
        Ok(removed)
    }
}
