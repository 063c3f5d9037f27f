// component.rs - Component identity and layout metadata
//
// Components are identified by their Rust type, not by their field layout.
// Two newtypes over the same shape land in two different columns.

use std::any::TypeId;
use std::fmt;
use std::mem::{align_of, size_of};

/// Identity of a component type (wraps the type's `TypeId`).
///
/// Ordered so that multi-column locking can always proceed in ascending id
/// order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(TypeId);

impl ComponentId {
    /// Identity of the component type `T`.
    pub fn of<T: Component>() -> Self {
        Self(TypeId::of::<T>())
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({:?})", self.0)
    }
}

/// Metadata describing a component's memory layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMeta {
    pub id: ComponentId,
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
}

/// Trait for plain data attached to entities.
///
/// Implementors must be `Send + Sync`: columns are shared between the
/// scheduler thread and every threaded-system worker.
pub trait Component: 'static + Sized + Send + Sync {
    /// Human-readable name for logs and error messages.
    const NAME: &'static str;

    fn id() -> ComponentId {
        ComponentId::of::<Self>()
    }

    fn meta() -> ComponentMeta {
        ComponentMeta {
            id: Self::id(),
            name: Self::NAME,
            size: size_of::<Self>(),
            align: align_of::<Self>(),
        }
    }
}

/// Helper macro to implement the Component trait.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy)]
/// struct Health { current: i32 }
///
/// define_component!(Health);
/// define_component!(Mana, "MagicPoints");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty) => {
        $crate::define_component!($ty, stringify!($ty));
    };
    ($ty:ty, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const NAME: &'static str = $name;
        }
    };
}
