//! Convenience macros for entity spawning

/// Create an entity and attach every listed component in order.
///
/// Evaluates to `Result<Entity, WorldError>`; attachment stops at the first
/// failure.
///
/// # Examples
///
/// ```ignore
/// // Single component
/// let entity = spawn!(world, Position::new(0.0, 0.0))?;
///
/// // Multiple components
/// let entity = spawn!(world,
///     Position::new(0.0, 0.0),
///     Velocity::new(1.0, 1.0),
/// )?;
/// ```
#[macro_export]
macro_rules! spawn {
    ($world:expr $(, $component:expr)* $(,)?) => {{
        let world: &$crate::ecs::World = &$world;
        let entity = world.create_entity().id();
        #[allow(unused_mut)]
        let mut result: ::std::result::Result<$crate::ecs::Entity, $crate::ecs::WorldError> =
            ::std::result::Result::Ok(entity);
        $(
            if result.is_ok() {
                if let ::std::result::Result::Err(err) = world.add_component(entity, $component) {
                    result = ::std::result::Result::Err(err);
                }
            }
        )*
        result
    }};
}
