// system.rs - Typed system functions and their type-erased wrapper
//
// A system is a function whose parameters are `Vec<&mut C>` for each
// component type `C` it needs, in the order it wants them. The parameter
// list is its query: `SystemFn::components` reports the declared types and
// `SystemFn::run` pulls one aligned list per parameter out of a locked
// `QueryBatch`.

use crate::ecs::query::QueryBatch;
use crate::ecs::{Component, ComponentId, ComponentMeta, QueryError, World};
use std::marker::PhantomData;

/// Error a system body may return.
pub type SystemError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of every system function.
pub type SystemResult = Result<(), SystemError>;

/// A function usable as a system over the component tuple `Q`.
///
/// Implemented for every `FnMut(Vec<&mut A>, Vec<&mut B>, ...) ->
/// SystemResult` with up to eight component parameters.
pub trait SystemFn<Q> {
    /// Declared component types, in parameter order.
    fn components() -> Vec<ComponentMeta>;

    /// Make every declared type a recognized component of `world`.
    fn register(world: &World);

    fn run(&mut self, batch: QueryBatch<'_, '_>) -> Result<SystemResult, QueryError>;
}

macro_rules! impl_system_fn {
    ($($T:ident),*) => {
        impl<Func, $($T: Component),*> SystemFn<($($T,)*)> for Func
        where
            Func: FnMut($(Vec<&mut $T>),*) -> SystemResult,
        {
            fn components() -> Vec<ComponentMeta> {
                vec![$(<$T as Component>::meta()),*]
            }

            #[allow(unused_variables)]
            fn register(world: &World) {
                $(world.register_component::<$T>();)*
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn run(&mut self, mut batch: QueryBatch<'_, '_>) -> Result<SystemResult, QueryError> {
                $(let $T = batch.fetch::<$T>()?;)*
                Ok((self)($($T),*))
            }
        }
    };
}

impl_system_fn!();
impl_system_fn!(A);
impl_system_fn!(A, B);
impl_system_fn!(A, B, C);
impl_system_fn!(A, B, C, D);
impl_system_fn!(A, B, C, D, E);
impl_system_fn!(A, B, C, D, E, F);
impl_system_fn!(A, B, C, D, E, F, G);
impl_system_fn!(A, B, C, D, E, F, G, H);

/// Object-safe view of a registered system.
pub(crate) trait System {
    fn run(&mut self, world: &World) -> Result<SystemResult, QueryError>;
}

/// Adapts a typed [`SystemFn`] into a [`System`].
pub(crate) struct FunctionSystem<F, Q> {
    func: F,
    components: Vec<ComponentId>,
    _query: PhantomData<fn() -> Q>,
}

impl<F, Q> FunctionSystem<F, Q>
where
    F: SystemFn<Q>,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            components: F::components().iter().map(|meta| meta.id).collect(),
            _query: PhantomData,
        }
    }
}

impl<F, Q> System for FunctionSystem<F, Q>
where
    F: SystemFn<Q>,
{
    fn run(&mut self, world: &World) -> Result<SystemResult, QueryError> {
        world.run_system(&self.components, &mut self.func)
    }
}

/// Short type name of `F` for logs (`movement` rather than
/// `my_game::systems::movement`). Closures keep their enclosing item:
/// `setup::{{closure}}`.
pub(crate) fn short_type_name<F>() -> &'static str {
    let full = std::any::type_name::<F>();
    let base = full.split('<').next().unwrap_or(full);
    let mut start = base.rfind("::").map(|i| i + 2).unwrap_or(0);
    if base[start..].starts_with('{') {
        start = base[..start.saturating_sub(2)]
            .rfind("::")
            .map(|i| i + 2)
            .unwrap_or(0);
    }
    &full[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Pos(i32);
    define_component!(Pos);

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Vel(i32);
    define_component!(Vel);

    fn step(pos: Vec<&mut Pos>, vel: Vec<&mut Vel>) -> SystemResult {
        for (p, v) in pos.into_iter().zip(vel) {
            p.0 += v.0;
        }
        Ok(())
    }

    fn idle() -> SystemResult {
        Ok(())
    }

    fn declared<Q, F: SystemFn<Q>>(_: &F) -> Vec<&'static str> {
        F::components().iter().map(|meta| meta.name).collect()
    }

    #[test]
    fn components_follow_parameter_order() {
        assert_eq!(declared(&step), vec!["Pos", "Vel"]);
        assert!(declared(&idle).is_empty());
    }

    #[test]
    fn function_system_runs_against_world() {
        let world = World::new();
        let e = world.create_entity().with(Pos(1)).unwrap().with(Vel(2)).unwrap().id();

        let mut system = FunctionSystem::new(step);
        system.run(&world).unwrap().unwrap();
        system.run(&world).unwrap().unwrap();
        assert_eq!(world.get::<Pos>(e), Some(Pos(5)));
    }

    #[test]
    fn closures_keep_state_between_runs() {
        let world = World::new();
        world.create_entity().with(Pos(0)).unwrap();

        let mut seen = 0usize;
        let mut system = FunctionSystem::new(move |pos: Vec<&mut Pos>| -> SystemResult {
            seen += pos.len();
            if seen > 1 {
                return Err(format!("seen {seen} positions").into());
            }
            Ok(())
        });
        assert!(system.run(&world).unwrap().is_ok());
        let err = system.run(&world).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "seen 2 positions");
    }

    #[test]
    fn zero_component_systems_run() {
        let world = World::new();
        let mut system = FunctionSystem::new(idle);
        assert!(system.run(&world).unwrap().is_ok());
    }

    #[test]
    fn short_names_drop_module_paths() {
        assert_eq!(short_type_name::<World>(), "World");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec<u8>");

        fn name_of<F>(_: &F) -> &'static str {
            short_type_name::<F>()
        }
        assert_eq!(name_of(&step), "step");
        let closure = || ();
        assert_eq!(name_of(&closure), "short_names_drop_module_paths::{{closure}}");
    }
}
