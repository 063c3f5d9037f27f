// commands.rs - Structural changes queued while systems hold column locks
//
// A running system owns write locks on the columns it queries, so attaching
// or removing one of those types from inside the body would wait on itself.
// Commands queue the change instead; the scheduler applies the queue at the
// start of every tick and after every threaded invocation, when the applying
// thread holds no column locks.

use crate::ecs::{Component, Entity, World, WorldError};
use std::fmt;
use std::sync::{Mutex, PoisonError};

type Command = Box<dyn FnOnce(&World) -> Result<(), WorldError> + Send>;

#[derive(Default)]
pub(crate) struct CommandQueue {
    pending: Mutex<Vec<Command>>,
}

impl CommandQueue {
    pub fn push(&self, command: Command) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    pub fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Deferred structural changes on a [`World`], obtained from
/// [`World::commands`].
///
/// ```ignore
/// let world = game.world_handle();
/// game.add_threaded_system(move |positions: Vec<&mut Position>| {
///     let commands = world.commands();
///     for p in positions.into_iter().filter(|p| p.x > 100.0) {
///         let spark = commands.spawn();
///         commands.insert(spark, Position::new(p.x, p.y));
///     }
///     Ok(())
/// }, 60.0)?;
/// ```
pub struct Commands<'w> {
    world: &'w World,
}

impl<'w> Commands<'w> {
    pub(crate) fn new(world: &'w World) -> Self {
        Self { world }
    }

    /// Allocate an entity now. Its components arrive when the queue is
    /// applied.
    pub fn spawn(&self) -> Entity {
        self.world.create_entity().id()
    }

    pub fn insert<T: Component>(&self, entity: Entity, value: T) -> &Self {
        self.push(move |world| world.add_component(entity, value).map(drop))
    }

    pub fn remove<T: Component>(&self, entity: Entity) -> &Self {
        self.push(move |world| world.remove_component::<T>(entity).map(drop))
    }

    pub fn despawn(&self, entity: Entity) -> &Self {
        self.push(move |world| world.despawn(entity))
    }

    /// Changes queued and not yet applied, from every `Commands` of this
    /// world.
    pub fn pending(&self) -> usize {
        self.world.command_queue().len()
    }

    fn push(&self, command: impl FnOnce(&World) -> Result<(), WorldError> + Send + 'static) -> &Self {
        self.world.command_queue().push(Box::new(command));
        self
    }
}

impl fmt::Debug for Commands<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands").field("pending", &self.pending()).finish()
    }
}
