//! Math types and shared component shapes
//!
//! Re-exports glam. Components that share a shape (a 2D vector for position,
//! velocity, acceleration ...) are distinct newtypes over the same glam type,
//! so each still gets its own column and query identity.

pub use glam::*;

/// Declare a component newtype over [`glam::Vec2`].
///
/// The generated type derefs to `Vec2` (so `pos.x += vel.x` works), has
/// `new(x, y)` and `to_tuple()`, converts from `Vec2`, and implements
/// `Component` under its own name.
///
/// ```ignore
/// vector2_component!(Position);
/// vector2_component!(Velocity);
///
/// let mut p = Position::new(50.0, 50.0);
/// p.x += 2.0;
/// ```
#[macro_export]
macro_rules! vector2_component {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Debug, Default, PartialEq)]
        pub struct $name(pub $crate::math::Vec2);

        impl $name {
            pub const ZERO: Self = Self($crate::math::Vec2::ZERO);

            pub fn new(x: f32, y: f32) -> Self {
                Self($crate::math::Vec2::new(x, y))
            }

            pub fn to_tuple(self) -> (f32, f32) {
                (self.0.x, self.0.y)
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::math::Vec2;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl ::std::convert::From<$crate::math::Vec2> for $name {
            fn from(value: $crate::math::Vec2) -> Self {
                Self(value)
            }
        }

        $crate::define_component!($name);
    };
}
