use crate::ecs::{Component, Entity, World, WorldError};
use std::fmt;

/// Handle to a freshly created entity for chaining component attachments.
///
/// ```ignore
/// let ship = world
///     .create_entity()
///     .with(Position::new(50.0, 50.0))?
///     .with(Velocity::new(2.0, -1.0))?
///     .id();
/// ```
#[derive(Clone, Copy)]
pub struct EntityRef<'w> {
    world: &'w World,
    entity: Entity,
}

impl<'w> EntityRef<'w> {
    pub(crate) fn new(world: &'w World, entity: Entity) -> Self {
        Self { world, entity }
    }

    #[inline]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Attach `value`, overwriting any existing component of the same type.
    pub fn with<T: Component>(self, value: T) -> Result<Self, WorldError> {
        self.world.add_component(self.entity, value)?;
        Ok(self)
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityRef").field(&self.entity).finish()
    }
}

impl From<EntityRef<'_>> for Entity {
    fn from(entity: EntityRef<'_>) -> Self {
        entity.id()
    }
}
