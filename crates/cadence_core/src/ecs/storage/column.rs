// column.rs - Dense, entity-ordered storage for one component type
//
// Entity ids and values live in two parallel vectors sorted by ascending
// entity id. Lookups are binary searches; appends for freshly created
// entities (the common case) land at the end without shifting.

use crate::ecs::{Component, ComponentId, Entity, QueryError};
use std::any::Any;

/// Type-erased view of a column, used by the store for locking, joins and
/// cascading removal.
pub(crate) trait ErasedColumn: Send + Sync {
    fn component_id(&self) -> ComponentId;

    fn component_name(&self) -> &'static str;

    /// Entities holding this component, ascending.
    fn entities(&self) -> &[Entity];

    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// All instances of component `T`, keyed by entity.
pub struct Column<T> {
    entities: Vec<Entity>,
    values: Vec<T>,
}

impl<T: Component> Column<T> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Insert or overwrite; returns the previous value.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        match self.entities.binary_search(&entity) {
            Ok(row) => Some(std::mem::replace(&mut self.values[row], value)),
            Err(row) => {
                self.entities.insert(row, entity);
                self.values.insert(row, value);
                None
            }
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        let row = self.entities.binary_search(&entity).ok()?;
        self.values.get(row)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let row = self.entities.binary_search(&entity).ok()?;
        self.entities.remove(row);
        Some(self.values.remove(row))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `(entity, value)` pairs in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Mutable references to the values of `wanted`, in the same order.
    ///
    /// `wanted` must be ascending. Fails with `MissingEntity` for the first
    /// entry this column does not hold, so the result is always exactly as
    /// long as `wanted`.
    pub(crate) fn select_mut(&mut self, wanted: &[Entity]) -> Result<Vec<&mut T>, QueryError> {
        let mut pending = wanted.iter().copied().peekable();
        let mut selected = Vec::with_capacity(wanted.len());
        for (entity, value) in self.entities.iter().zip(self.values.iter_mut()) {
            match pending.peek() {
                Some(&next) if next == *entity => {
                    selected.push(value);
                    pending.next();
                }
                Some(&next) if next < *entity => break,
                Some(_) => {}
                None => break,
            }
        }
        match pending.next() {
            Some(entity) => Err(QueryError::MissingEntity { name: T::NAME, entity }),
            None => Ok(selected),
        }
    }
}

impl<T: Component> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ErasedColumn for Column<T> {
    fn component_id(&self) -> ComponentId {
        T::id()
    }

    fn component_name(&self) -> &'static str {
        T::NAME
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
