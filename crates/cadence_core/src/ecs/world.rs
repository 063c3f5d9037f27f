// world.rs - Entity registry plus component store, shared across threads
//
// Every method takes `&self`. The registry sits behind one RwLock and each
// component column behind its own, so threaded systems and the scheduler
// thread can use the same world concurrently.
//
// Lock order: a column lock may be held while taking the registry lock,
// never the reverse. Attach and per-type removal take the column first;
// despawn retires the entity under the registry lock, releases it, and only
// then visits the columns. Code holding a column lock (a running system)
// restructures through `commands()` instead of calling attach or removal
// directly.

use crate::ecs::commands::{CommandQueue, Commands};
use crate::ecs::entity::EntityRegistry;
use crate::ecs::query::{join, QueryBatch};
use crate::ecs::storage::{Column, ComponentStore};
use crate::ecs::system::{SystemFn, SystemResult};
use crate::ecs::{Component, ComponentId, ComponentMeta, Entity, EntityRef, QueryError};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("{entity} was never created or has been despawned")]
    InvalidEntity { entity: Entity },

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// All entities and components of one runtime instance.
pub struct World {
    entities: RwLock<EntityRegistry>,
    store: ComponentStore,
    commands: CommandQueue,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(EntityRegistry::new()),
            store: ComponentStore::new(),
            commands: CommandQueue::default(),
        }
    }

    /// Make `T` a recognized component type. Idempotent.
    pub fn register_component<T: Component>(&self) -> ComponentMeta {
        self.store.register::<T>()
    }

    pub fn is_registered(&self, component: ComponentId) -> bool {
        self.store.is_registered(component)
    }

    /// Allocate a fresh entity and return a handle for chaining attachments.
    pub fn create_entity(&self) -> EntityRef<'_> {
        let entity = self.registry_mut().create();
        tracing::trace!(%entity, "entity created");
        EntityRef::new(self, entity)
    }

    /// Attach `value` to `entity`, overwriting any previous `T`.
    ///
    /// Returns the value it replaced. Registers `T` on first use.
    pub fn add_component<T: Component>(&self, entity: Entity, value: T) -> Result<Option<T>, WorldError> {
        self.store
            .write(|column: &mut Column<T>| {
                if !self.registry_mut().record(entity, T::id()) {
                    return Err(WorldError::InvalidEntity { entity });
                }
                Ok(column.insert(entity, value))
            })
            .map_err(WorldError::from)?
    }

    /// Detach and return the `T` held by `entity`, if any.
    pub fn remove_component<T: Component>(&self, entity: Entity) -> Result<Option<T>, WorldError> {
        if !self.store.is_registered(T::id()) {
            return if self.contains(entity) {
                Ok(None)
            } else {
                Err(WorldError::InvalidEntity { entity })
            };
        }

        self.store
            .write(|column: &mut Column<T>| {
                let mut registry = self.registry_mut();
                if !registry.contains(entity) {
                    return Err(WorldError::InvalidEntity { entity });
                }
                registry.forget(entity, T::id());
                Ok(column.remove(entity))
            })
            .map_err(WorldError::from)?
    }

    /// Retire `entity` and drop every component it holds.
    pub fn despawn(&self, entity: Entity) -> Result<(), WorldError> {
        let held = self
            .registry_mut()
            .remove(entity)
            .ok_or(WorldError::InvalidEntity { entity })?;

        for component in &held {
            self.store.remove_erased(*component, entity);
        }
        tracing::trace!(%entity, components = held.len(), "entity despawned");
        Ok(())
    }

    /// Copy of the `T` held by `entity`.
    pub fn get<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        self.store.get::<T>(entity)
    }

    /// Every `(entity, T)` pair, ascending by entity.
    pub fn all_with_type<T: Component + Clone>(&self) -> Vec<(Entity, T)> {
        self.store.all_with_type::<T>()
    }

    /// Component types held by `entity`, ascending by id.
    pub fn component_types(&self, entity: Entity) -> Result<Vec<ComponentId>, WorldError> {
        self.registry()
            .component_types(entity)
            .map(|types| types.iter().copied().collect())
            .ok_or(WorldError::InvalidEntity { entity })
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.registry().contains(entity)
    }

    /// Live entities.
    pub fn entity_count(&self) -> usize {
        self.registry().len()
    }

    /// Number of entities holding `T`.
    pub fn count_with<T: Component>(&self) -> usize {
        self.store.len_of(T::id())
    }

    /// Entities holding every type in `components`, ascending.
    ///
    /// A type no entity has ever held matches nothing, so the result is
    /// empty. Naming the same type twice is an error.
    pub fn query_entities(&self, components: &[ComponentId]) -> Result<Vec<Entity>, QueryError> {
        match self.store.with_locked(components, |columns| join(columns)) {
            Err(QueryError::UnknownComponent { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Lock the columns `components` names and pass them to `f` as a
    /// [`QueryBatch`]. Columns stay locked until `f` returns. Every id must
    /// be registered.
    pub(crate) fn with_query<R>(
        &self,
        components: &[ComponentId],
        f: impl FnOnce(QueryBatch<'_, '_>) -> R,
    ) -> Result<R, QueryError> {
        self.store.with_locked(components, |columns| {
            let entities = join(columns);
            f(QueryBatch::new(columns, &entities))
        })
    }

    /// Run a system function once against this world.
    ///
    /// Parameter types are registered first, so a type no entity holds
    /// yields empty lists. The outer `Result` reports query failures, the
    /// inner one is whatever the function returned.
    pub fn run_query<Q, F>(&self, mut f: F) -> Result<SystemResult, QueryError>
    where
        F: SystemFn<Q>,
    {
        F::register(self);
        let components: Vec<ComponentId> = F::components().iter().map(|meta| meta.id).collect();
        self.run_system(&components, &mut f)
    }

    pub(crate) fn run_system<Q, F>(&self, components: &[ComponentId], f: &mut F) -> Result<SystemResult, QueryError>
    where
        F: SystemFn<Q>,
    {
        self.with_query(components, |batch| f.run(batch))?
    }

    /// Queue structural changes to apply later, when no column is locked.
    pub fn commands(&self) -> Commands<'_> {
        Commands::new(self)
    }

    /// Apply every queued command in the order it was queued and return how
    /// many ran. Failures (e.g. a target despawned meanwhile) are logged and
    /// skipped. Must not be called while holding column locks.
    pub fn apply_commands(&self) -> usize {
        let queued = self.commands.take();
        let count = queued.len();
        for command in queued {
            if let Err(error) = command(self) {
                tracing::warn!(%error, "queued command failed");
            }
        }
        count
    }

    pub(crate) fn command_queue(&self) -> &CommandQueue {
        &self.commands
    }

    fn registry(&self) -> RwLockReadGuard<'_, EntityRegistry> {
        self.entities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, EntityRegistry> {
        self.entities.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Health(i32);
    define_component!(Health);

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Shield(i32);
    define_component!(Shield);

    #[test]
    fn attach_is_last_write_wins() {
        let world = World::new();
        let e = world.create_entity().id();
        assert_eq!(world.add_component(e, Health(10)).unwrap(), None);
        assert_eq!(world.add_component(e, Health(20)).unwrap(), Some(Health(10)));
        assert_eq!(world.get::<Health>(e), Some(Health(20)));
        assert_eq!(world.count_with::<Health>(), 1);
    }

    #[test]
    fn fluent_attachment_chains() {
        let world = World::new();
        let e = world
            .create_entity()
            .with(Health(5))
            .unwrap()
            .with(Shield(3))
            .unwrap()
            .id();
        assert_eq!(world.get::<Health>(e), Some(Health(5)));
        assert_eq!(world.get::<Shield>(e), Some(Shield(3)));
        assert_eq!(world.component_types(e).unwrap().len(), 2);
    }

    #[test]
    fn dead_entities_are_rejected() {
        let world = World::new();
        let e = world.create_entity().with(Health(1)).unwrap().id();
        world.despawn(e).unwrap();

        assert_eq!(
            world.add_component(e, Health(2)),
            Err(WorldError::InvalidEntity { entity: e })
        );
        assert_eq!(world.despawn(e), Err(WorldError::InvalidEntity { entity: e }));
        assert_eq!(
            world.remove_component::<Health>(e),
            Err(WorldError::InvalidEntity { entity: e })
        );
        assert_eq!(
            world.remove_component::<Shield>(e),
            Err(WorldError::InvalidEntity { entity: e })
        );
        assert!(world.component_types(e).is_err());

        let never = Entity::from_bits(999);
        assert_eq!(
            world.add_component(never, Health(0)),
            Err(WorldError::InvalidEntity { entity: never })
        );
    }

    #[test]
    fn despawn_cascades_to_every_column() {
        let world = World::new();
        let a = world.create_entity().with(Health(1)).unwrap().with(Shield(1)).unwrap().id();
        let b = world.create_entity().with(Health(2)).unwrap().id();

        world.despawn(a).unwrap();
        assert_eq!(world.all_with_type::<Health>(), vec![(b, Health(2))]);
        assert!(world.all_with_type::<Shield>().is_empty());
        assert_eq!(world.entity_count(), 1);
        assert!(!world.contains(a));
    }

    #[test]
    fn remove_component_is_per_type() {
        let world = World::new();
        let e = world.create_entity().with(Health(1)).unwrap().with(Shield(9)).unwrap().id();

        assert_eq!(world.remove_component::<Shield>(e).unwrap(), Some(Shield(9)));
        assert_eq!(world.remove_component::<Shield>(e).unwrap(), None);
        assert_eq!(world.get::<Health>(e), Some(Health(1)));
        assert_eq!(world.component_types(e).unwrap(), vec![Health::id()]);
        assert!(world.contains(e));
    }

    #[test]
    fn query_entities_joins_and_treats_unheld_types_as_empty() {
        let world = World::new();
        let a = world.create_entity().with(Health(1)).unwrap().with(Shield(1)).unwrap().id();
        let _b = world.create_entity().with(Health(2)).unwrap().id();
        let c = world.create_entity().with(Shield(3)).unwrap().with(Health(3)).unwrap().id();

        let ids = [Shield::id(), Health::id()];
        let first = world.query_entities(&ids).unwrap();
        assert_eq!(first, vec![a, c]);
        assert_eq!(world.query_entities(&ids).unwrap(), first);

        #[derive(Clone, Copy)]
        struct Never;
        define_component!(Never);
        assert_eq!(world.query_entities(&[Never::id()]), Ok(vec![]));
        assert_eq!(world.query_entities(&[Health::id(), Never::id()]), Ok(vec![]));
        assert!(!world.is_registered(Never::id()));
        world.register_component::<Never>();
        assert_eq!(world.query_entities(&[Health::id(), Never::id()]), Ok(vec![]));

        assert_eq!(
            world.query_entities(&[Health::id(), Health::id()]),
            Err(QueryError::DuplicateComponent { name: "Health" })
        );
    }

    #[test]
    fn run_query_over_an_unheld_type_sees_empty_lists() {
        let world = World::new();
        world.create_entity().with(Health(3)).unwrap();

        #[derive(Clone, Copy)]
        struct Never;
        define_component!(Never);

        let mut seen = None;
        world
            .run_query(|health: Vec<&mut Health>, never: Vec<&mut Never>| -> SystemResult {
                seen = Some((health.len(), never.len()));
                Ok(())
            })
            .unwrap()
            .unwrap();
        assert_eq!(seen, Some((0, 0)));
        assert!(world.is_registered(Never::id()));
    }

    #[test]
    fn run_query_mutates_in_place() {
        let world = World::new();
        let e = world.create_entity().with(Health(10)).unwrap().with(Shield(4)).unwrap().id();

        fn absorb(health: Vec<&mut Health>, shield: Vec<&mut Shield>) -> SystemResult {
            for (h, s) in health.into_iter().zip(shield) {
                h.0 -= 1;
                s.0 -= 1;
            }
            Ok(())
        }

        world.run_query(absorb).unwrap().unwrap();
        assert_eq!(world.get::<Health>(e), Some(Health(9)));
        assert_eq!(world.get::<Shield>(e), Some(Shield(3)));
    }
}
