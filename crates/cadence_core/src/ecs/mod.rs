//! Entity Component System core types.
//!
//! Entities are plain ids, components live in one locked column per type,
//! and systems are functions whose parameters name the columns they need.
//! Everything is owned by a [`World`]; there is no global registry.

mod builder;
mod commands;
mod component;
mod entity;
mod macros;
mod query;
pub mod storage;
pub(crate) mod system;
mod system_descriptor;
mod system_handle;
mod system_registration_error;
pub(crate) mod system_registry;
mod world;

pub use builder::EntityRef;
pub use commands::Commands;
pub use component::{Component, ComponentId, ComponentMeta};
pub use entity::Entity;
pub use query::{QueryBatch, QueryError};
pub use system::{SystemError, SystemFn, SystemResult};
pub use system_descriptor::{ExecutionMode, SystemDescriptor};
pub use system_handle::SystemHandle;
pub use system_registration_error::SystemRegistrationError;
pub use world::{World, WorldError};
