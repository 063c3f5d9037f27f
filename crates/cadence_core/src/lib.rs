//! Cadence Core
//!
//! Entity-component-system runtime with a mixed-mode scheduler:
//! - Entity registry and per-type component store
//! - Inner-join queries over typed component columns
//! - Per-frame, threaded (fixed rate) and main-thread-only systems
//! - A blocking run loop with clean, joined shutdown

pub mod config;
pub mod ecs;
pub mod game;
pub mod math;
pub mod scheduler;
pub mod time;

pub use glam;

pub use config::SchedulerConfig;
pub use ecs::{
    Commands, Component, ComponentId, Entity, ExecutionMode, QueryError, SystemError, SystemHandle,
    SystemRegistrationError, SystemResult, World, WorldError,
};
pub use game::Game;
pub use scheduler::{
    ErrorHook, RunSummary, SchedulerError, SchedulerState, StopHandle, SystemInvocationError,
    SystemReport,
};
pub use time::{CallRate, DEFAULT_CALL_RATE_HZ};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
