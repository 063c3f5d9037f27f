// invoke.rs - One query-and-call cycle of a system, with failure capture
//
// Panics are caught here and turned into `SystemInvocationError::Panicked`
// so a misbehaving system never unwinds through the tick loop or a worker.

use super::error::SystemInvocationError;
use super::ErrorHook;
use crate::ecs::system::System;
use crate::ecs::system_registry::SystemStats;
use crate::ecs::{SystemDescriptor, SystemHandle, World};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub(crate) fn invoke<S: System + ?Sized>(
    handle: SystemHandle,
    descriptor: &SystemDescriptor,
    system: &mut S,
    world: &World,
) -> Result<(), SystemInvocationError> {
    // Columns poisoned by a panic are recovered by the store.
    match panic::catch_unwind(AssertUnwindSafe(|| system.run(world))) {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(source))) => Err(SystemInvocationError::Failed {
            system: descriptor.name().to_string(),
            handle,
            source,
        }),
        Ok(Err(source)) => Err(SystemInvocationError::Query {
            system: descriptor.name().to_string(),
            handle,
            source,
        }),
        Err(payload) => Err(SystemInvocationError::Panicked {
            system: descriptor.name().to_string(),
            handle,
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Update counters and surface a failure through the log and the hook.
pub(crate) fn record(
    stats: &mut SystemStats,
    outcome: &Result<(), SystemInvocationError>,
    hook: Option<&ErrorHook>,
) {
    stats.invocations += 1;
    if let Err(error) = outcome {
        stats.failures += 1;
        tracing::error!(
            system = error.system(),
            handle = %error.handle(),
            panicked = error.is_panic(),
            %error,
            "system invocation failed"
        );
        if let Some(hook) = hook {
            hook(error);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
