use crate::ecs::{QueryError, SystemError, SystemHandle};
use thiserror::Error;

/// A system invocation that did not complete normally.
///
/// Per-frame and main-thread systems keep running on later ticks after one
/// of these; a threaded system's timer loop ends with it.
#[derive(Debug, Error)]
pub enum SystemInvocationError {
    #[error("system '{system}' ({handle}) failed: {source}")]
    Failed {
        system: String,
        handle: SystemHandle,
        #[source]
        source: SystemError,
    },

    #[error("system '{system}' ({handle}) panicked: {message}")]
    Panicked {
        system: String,
        handle: SystemHandle,
        message: String,
    },

    #[error("system '{system}' ({handle}) could not run its query: {source}")]
    Query {
        system: String,
        handle: SystemHandle,
        #[source]
        source: QueryError,
    },
}

impl SystemInvocationError {
    pub fn system(&self) -> &str {
        match self {
            SystemInvocationError::Failed { system, .. }
            | SystemInvocationError::Panicked { system, .. }
            | SystemInvocationError::Query { system, .. } => system,
        }
    }

    pub fn handle(&self) -> SystemHandle {
        match self {
            SystemInvocationError::Failed { handle, .. }
            | SystemInvocationError::Panicked { handle, .. }
            | SystemInvocationError::Query { handle, .. } => *handle,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, SystemInvocationError::Panicked { .. })
    }
}

/// Errors that prevent the scheduler from running at all.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to spawn worker thread for system '{system}'")]
    WorkerSpawn {
        system: String,
        #[source]
        source: std::io::Error,
    },
}
