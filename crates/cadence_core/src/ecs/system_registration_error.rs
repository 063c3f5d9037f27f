use crate::time::InvalidCallRate;
use thiserror::Error;

/// Errors that can occur while registering a system with the world.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SystemRegistrationError {
    #[error("system '{name}' requests '{component}', which is not a registered component type")]
    InvalidSystemSignature { name: String, component: &'static str },

    #[error("system '{name}' requests '{component}' more than once")]
    DuplicateComponent { name: String, component: &'static str },

    #[error("system '{name}': {source}")]
    InvalidCallRate {
        name: String,
        #[source]
        source: InvalidCallRate,
    },
}
