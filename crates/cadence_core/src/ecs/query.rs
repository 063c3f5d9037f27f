// query.rs - Inner-join query over locked component columns
//
// A query names an ordered list of component types. The matching entity set
// is the intersection of every requested column, walked in ascending entity
// id, so the i-th value handed out for every type belongs to the same entity
// and repeated queries over unchanged state produce the same order.

use crate::ecs::storage::{Column, ErasedColumn};
use crate::ecs::{Component, ComponentId, Entity};
use thiserror::Error;

/// Failures while resolving or locking a query's columns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("component type {component:?} is not registered")]
    UnknownComponent { component: ComponentId },

    #[error("component '{name}' requested more than once in one query")]
    DuplicateComponent { name: &'static str },

    #[error("column for '{name}' does not hold the expected component type")]
    ColumnTypeMismatch { name: &'static str },

    #[error("query requested '{name}' but only {available} columns were locked")]
    MissingColumn { name: &'static str, available: usize },

    #[error("column for '{name}' does not hold {entity}")]
    MissingEntity { name: &'static str, entity: Entity },
}

/// Entities present in every column, ascending.
///
/// Starts from the shortest column and probes the rest by binary search.
/// No columns means no entities.
pub(crate) fn join(columns: &[&mut dyn ErasedColumn]) -> Vec<Entity> {
    let Some(smallest) = columns.iter().min_by_key(|column| column.entities().len()) else {
        return Vec::new();
    };

    smallest
        .entities()
        .iter()
        .copied()
        .filter(|entity| {
            columns
                .iter()
                .all(|column| column.entities().binary_search(entity).is_ok())
        })
        .collect()
}

/// Locked columns for one query invocation, handed out in declaration order.
///
/// Each `fetch` consumes the next column, so a system with parameters
/// `(Vec<&mut A>, Vec<&mut B>)` calls `fetch::<A>()` then `fetch::<B>()`.
pub struct QueryBatch<'w, 'c> {
    columns: std::slice::IterMut<'c, &'w mut dyn ErasedColumn>,
    entities: &'c [Entity],
    available: usize,
}

impl<'w, 'c> QueryBatch<'w, 'c> {
    pub(crate) fn new(columns: &'c mut [&'w mut dyn ErasedColumn], entities: &'c [Entity]) -> Self {
        Self {
            available: columns.len(),
            columns: columns.iter_mut(),
            entities,
        }
    }

    /// Matching entities, ascending. Position `i` of every fetched list
    /// refers to `entities()[i]`.
    pub fn entities(&self) -> &[Entity] {
        self.entities
    }

    /// Mutable references to the next column's values for the matching
    /// entities.
    pub fn fetch<T: Component>(&mut self) -> Result<Vec<&'c mut T>, QueryError> {
        let column = self.columns.next().ok_or(QueryError::MissingColumn {
            name: T::NAME,
            available: self.available,
        })?;
        let column: &'c mut dyn ErasedColumn = &mut **column;
        let typed = column
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .ok_or(QueryError::ColumnTypeMismatch { name: T::NAME })?;
        typed.select_mut(self.entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;
    use crate::ecs::storage::ComponentStore;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Mass(f32);
    define_component!(Mass);

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Charge(f32);
    define_component!(Charge);

    fn e(id: u64) -> Entity {
        Entity::new(id)
    }

    fn seeded() -> ComponentStore {
        let store = ComponentStore::new();
        for id in [1, 2, 3, 5, 8] {
            store.set(e(id), Mass(id as f32)).unwrap();
        }
        for id in [2, 3, 4, 8] {
            store.set(e(id), Charge(-(id as f32))).unwrap();
        }
        store
    }

    #[test]
    fn join_is_inner_and_ascending() {
        let store = seeded();
        let entities = store
            .with_locked(&[Charge::id(), Mass::id()], |columns| join(columns))
            .unwrap();
        assert_eq!(entities, vec![e(2), e(3), e(8)]);
    }

    #[test]
    fn join_of_nothing_is_empty() {
        assert!(join(&[]).is_empty());
    }

    #[test]
    fn empty_column_empties_the_result() {
        #[derive(Clone, Copy)]
        struct Unused;
        define_component!(Unused);

        let store = seeded();
        store.register::<Unused>();
        let entities = store
            .with_locked(&[Mass::id(), Unused::id()], |columns| join(columns))
            .unwrap();
        assert!(entities.is_empty());
    }

    #[test]
    fn batch_values_are_aligned() {
        let store = seeded();
        let pairs = store
            .with_locked(&[Charge::id(), Mass::id()], |columns| {
                let entities = join(columns);
                let mut batch = QueryBatch::new(columns, &entities);
                let charges = batch.fetch::<Charge>()?;
                let masses = batch.fetch::<Mass>()?;
                Ok::<_, QueryError>(
                    charges
                        .iter()
                        .zip(masses.iter())
                        .map(|(c, m)| (c.0, m.0))
                        .collect::<Vec<_>>(),
                )
            })
            .unwrap()
            .unwrap();
        assert_eq!(pairs, vec![(-2.0, 2.0), (-3.0, 3.0), (-8.0, 8.0)]);
    }

    #[test]
    fn fetch_checks_type_and_count() {
        let store = seeded();
        let result = store
            .with_locked(&[Mass::id()], |columns| {
                let entities = join(columns);
                let mut batch = QueryBatch::new(columns, &entities);
                let wrong = batch.fetch::<Charge>().map(|v| v.len());
                let missing = batch.fetch::<Mass>().map(|v| v.len());
                (wrong, missing)
            })
            .unwrap();
        assert_eq!(result.0, Err(QueryError::ColumnTypeMismatch { name: "Charge" }));
        assert_eq!(
            result.1,
            Err(QueryError::MissingColumn { name: "Mass", available: 1 })
        );
    }
}
