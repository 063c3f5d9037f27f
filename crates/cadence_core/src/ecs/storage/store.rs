// store.rs - Per-type component columns behind per-type locks
//
// Every registered component type owns one column wrapped in its own
// RwLock. The table of columns is a DashMap so registration from one thread
// never blocks queries on another. Column handles are cloned out of the map
// before any column lock is taken, so no map shard is held while waiting.

use crate::ecs::storage::column::{Column, ErasedColumn};
use crate::ecs::{Component, ComponentId, ComponentMeta, Entity};
use crate::ecs::QueryError;
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type ColumnCell = Arc<RwLock<Box<dyn ErasedColumn>>>;

struct ColumnEntry {
    meta: ComponentMeta,
    cell: ColumnCell,
}

/// Holds one column per registered component type.
pub struct ComponentStore {
    columns: DashMap<ComponentId, ColumnEntry>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self {
            columns: DashMap::new(),
        }
    }

    /// Register `T`, creating its empty column. Idempotent.
    pub fn register<T: Component>(&self) -> ComponentMeta {
        self.columns
            .entry(T::id())
            .or_insert_with(|| ColumnEntry {
                meta: T::meta(),
                cell: Arc::new(RwLock::new(Box::new(Column::<T>::new()))),
            })
            .meta
            .clone()
    }

    pub fn is_registered(&self, component: ComponentId) -> bool {
        self.columns.contains_key(&component)
    }

    pub fn meta(&self, component: ComponentId) -> Option<ComponentMeta> {
        self.columns.get(&component).map(|entry| entry.meta.clone())
    }

    fn cell(&self, component: ComponentId) -> Result<ColumnCell, QueryError> {
        self.columns
            .get(&component)
            .map(|entry| Arc::clone(&entry.cell))
            .ok_or(QueryError::UnknownComponent { component })
    }

    fn cell_for<T: Component>(&self) -> ColumnCell {
        self.register::<T>();
        // Registered above, so the lookup cannot miss.
        self.columns
            .get(&T::id())
            .map(|entry| Arc::clone(&entry.cell))
            .unwrap_or_else(|| unreachable!("column for {} registered above", T::NAME))
    }

    /// Run `f` with shared access to the typed column of `T`.
    pub fn read<T: Component, R>(&self, f: impl FnOnce(&Column<T>) -> R) -> Result<R, QueryError> {
        let cell = self.cell(T::id())?;
        let guard = read_lock(&cell);
        let column = guard
            .as_any()
            .downcast_ref::<Column<T>>()
            .ok_or(QueryError::ColumnTypeMismatch { name: T::NAME })?;
        Ok(f(column))
    }

    /// Run `f` with exclusive access to the typed column of `T`,
    /// registering `T` first if needed.
    pub fn write<T: Component, R>(&self, f: impl FnOnce(&mut Column<T>) -> R) -> Result<R, QueryError> {
        let cell = self.cell_for::<T>();
        let mut guard = write_lock(&cell);
        let column = guard
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .ok_or(QueryError::ColumnTypeMismatch { name: T::NAME })?;
        Ok(f(column))
    }

    pub fn set<T: Component>(&self, entity: Entity, value: T) -> Result<Option<T>, QueryError> {
        self.write(|column: &mut Column<T>| column.insert(entity, value))
    }

    pub fn get<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        self.read(|column: &Column<T>| column.get(entity).cloned())
            .ok()
            .flatten()
    }

    pub fn remove<T: Component>(&self, entity: Entity) -> Option<T> {
        if !self.is_registered(T::id()) {
            return None;
        }
        self.write(|column: &mut Column<T>| column.remove(entity))
            .ok()
            .flatten()
    }

    /// Remove `entity` from the column of an erased type.
    pub fn remove_erased(&self, component: ComponentId, entity: Entity) -> bool {
        match self.cell(component) {
            Ok(cell) => write_lock(&cell).remove_entity(entity),
            Err(_) => false,
        }
    }

    /// Every `(entity, value)` of type `T`, ascending by entity.
    pub fn all_with_type<T: Component + Clone>(&self) -> Vec<(Entity, T)> {
        self.read(|column: &Column<T>| {
            column
                .iter()
                .map(|(entity, value)| (entity, value.clone()))
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn len_of(&self, component: ComponentId) -> usize {
        self.cell(component)
            .map(|cell| read_lock(&cell).entities().len())
            .unwrap_or(0)
    }

    /// Lock the columns for `components` and hand them to `f` in the
    /// requested order.
    ///
    /// Locks are acquired in ascending `ComponentId` order no matter how the
    /// request is ordered, so two callers locking overlapping sets cannot
    /// deadlock. All guards are held until `f` returns. A repeated id fails
    /// with `DuplicateComponent`, an unregistered one with
    /// `UnknownComponent`.
    pub(crate) fn with_locked<R>(
        &self,
        components: &[ComponentId],
        f: impl FnOnce(&mut [&mut dyn ErasedColumn]) -> R,
    ) -> Result<R, QueryError> {
        let mut order: Vec<usize> = (0..components.len()).collect();
        order.sort_by_key(|&i| components[i]);
        if let Some(pair) = order.windows(2).find(|w| components[w[0]] == components[w[1]]) {
            let name = self
                .meta(components[pair[0]])
                .map(|meta| meta.name)
                .unwrap_or("<unknown>");
            return Err(QueryError::DuplicateComponent { name });
        }

        let cells = components
            .iter()
            .map(|&component| self.cell(component))
            .collect::<Result<Vec<_>, _>>()?;

        let mut slots: Vec<Option<RwLockWriteGuard<'_, Box<dyn ErasedColumn>>>> =
            (0..components.len()).map(|_| None).collect();
        for &i in &order {
            slots[i] = Some(write_lock(&cells[i]));
        }

        let mut guards: Vec<RwLockWriteGuard<'_, Box<dyn ErasedColumn>>> =
            slots.into_iter().flatten().collect();
        let mut columns: Vec<&mut dyn ErasedColumn> = guards
            .iter_mut()
            .map(|guard| {
                let column: &mut dyn ErasedColumn = &mut ***guard;
                column
            })
            .collect();
        Ok(f(&mut columns))
    }
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new()
    }
}

// A system that panicked while holding a column poisons its lock. The column
// itself is still structurally valid (all mutation is through safe code), so
// later readers recover the guard instead of cascading the panic.
fn read_lock(cell: &ColumnCell) -> RwLockReadGuard<'_, Box<dyn ErasedColumn>> {
    cell.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock(cell: &ColumnCell) -> RwLockWriteGuard<'_, Box<dyn ErasedColumn>> {
    cell.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Heat(i32);
    define_component!(Heat);

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Cold(i32);
    define_component!(Cold);

    fn e(id: u64) -> Entity {
        Entity::new(id)
    }

    #[test]
    fn set_get_remove() {
        let store = ComponentStore::new();
        assert_eq!(store.set(e(1), Heat(10)).unwrap(), None);
        assert_eq!(store.set(e(1), Heat(11)).unwrap(), Some(Heat(10)));
        assert_eq!(store.get::<Heat>(e(1)), Some(Heat(11)));
        assert_eq!(store.get::<Heat>(e(2)), None);
        assert_eq!(store.remove::<Heat>(e(1)), Some(Heat(11)));
        assert_eq!(store.get::<Heat>(e(1)), None);
    }

    #[test]
    fn stores_are_independent_per_type() {
        let store = ComponentStore::new();
        store.set(e(1), Heat(1)).unwrap();
        store.set(e(2), Cold(2)).unwrap();

        assert_eq!(store.all_with_type::<Heat>(), vec![(e(1), Heat(1))]);
        assert_eq!(store.all_with_type::<Cold>(), vec![(e(2), Cold(2))]);
        assert_eq!(store.len_of(Heat::id()), 1);
    }

    #[test]
    fn unregistered_reads_are_absent_not_errors() {
        let store = ComponentStore::new();
        assert!(!store.is_registered(Heat::id()));
        assert_eq!(store.get::<Heat>(e(1)), None);
        assert_eq!(store.remove::<Heat>(e(1)), None);
        assert!(store.all_with_type::<Heat>().is_empty());
        assert!(!store.is_registered(Heat::id()));
    }

    #[test]
    fn all_with_type_is_ordered_by_entity() {
        let store = ComponentStore::new();
        for id in [4, 2, 9, 1] {
            store.set(e(id), Heat(id as i32)).unwrap();
        }
        let ids: Vec<u64> = store
            .all_with_type::<Heat>()
            .into_iter()
            .map(|(entity, _)| entity.id())
            .collect();
        assert_eq!(ids, vec![1, 2, 4, 9]);
    }

    #[test]
    fn with_locked_preserves_request_order() {
        let store = ComponentStore::new();
        store.register::<Heat>();
        store.register::<Cold>();

        let names = store
            .with_locked(&[Cold::id(), Heat::id()], |columns| {
                columns
                    .iter()
                    .map(|column| column.component_name())
                    .collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(names, vec!["Cold", "Heat"]);
    }

    #[test]
    fn with_locked_rejects_unknown_and_duplicates() {
        let store = ComponentStore::new();
        store.register::<Heat>();

        let unknown = store.with_locked(&[Cold::id()], |_| ());
        assert_eq!(
            unknown,
            Err(QueryError::UnknownComponent { component: Cold::id() })
        );

        let duplicate = store.with_locked(&[Heat::id(), Heat::id()], |_| ());
        assert_eq!(duplicate, Err(QueryError::DuplicateComponent { name: "Heat" }));
    }
}
