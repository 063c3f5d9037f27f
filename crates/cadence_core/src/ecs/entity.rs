//! Entity handles and the registry that allocates them.
//!
//! Entities are plain ids. Ids grow monotonically from 1 and are never
//! reused, so a stale handle can never alias a newer entity.

use crate::ecs::ComponentId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Entity handle (opaque, never reused).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    /// Serialize to 64-bit integer (for logs and external references)
    pub fn to_bits(&self) -> u64 {
        self.0
    }

    /// Deserialize from 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates entity ids and tracks which component types each live entity
/// holds.
#[derive(Debug)]
pub(crate) struct EntityRegistry {
    next_id: u64,
    alive: HashMap<Entity, BTreeSet<ComponentId>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            alive: HashMap::new(),
        }
    }

    pub fn create(&mut self) -> Entity {
        let entity = Entity::new(self.next_id);
        self.next_id += 1;
        self.alive.insert(entity, BTreeSet::new());
        entity
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.alive.contains_key(&entity)
    }

    /// Record that `entity` now holds `component`. Returns `false` for dead
    /// or unknown entities.
    pub fn record(&mut self, entity: Entity, component: ComponentId) -> bool {
        match self.alive.get_mut(&entity) {
            Some(types) => {
                types.insert(component);
                true
            }
            None => false,
        }
    }

    pub fn forget(&mut self, entity: Entity, component: ComponentId) {
        if let Some(types) = self.alive.get_mut(&entity) {
            types.remove(&component);
        }
    }

    /// Retire `entity`, handing back the component types it held.
    pub fn remove(&mut self, entity: Entity) -> Option<BTreeSet<ComponentId>> {
        self.alive.remove(&entity)
    }

    pub fn component_types(&self, entity: Entity) -> Option<&BTreeSet<ComponentId>> {
        self.alive.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }
}
