// worker.rs - Timer loop for one threaded system
//
// Each threaded system owns a worker thread for the duration of a run. The
// worker invokes the system, then sleeps on the stop signal until the next
// period boundary. Deadlines advance by whole periods from the first
// invocation; after an overrun the schedule restarts from "now" so missed
// periods are dropped rather than replayed in a burst.

use super::invoke::{invoke, record};
use super::signal::StopSignal;
use super::ErrorHook;
use crate::ecs::system_registry::SharedSystem;
use crate::ecs::World;
use crate::time::CallRate;
use cadence_metrics::SystemProfiler;
use std::time::Instant;
use tracing::{debug, info, warn};

pub(crate) fn run(
    entry: &mut SharedSystem,
    rate: CallRate,
    world: &World,
    signal: &StopSignal,
    hook: Option<&ErrorHook>,
) {
    let period = rate.period();
    let mut profiler = SystemProfiler::new();
    let mut next = Instant::now();

    info!(system = entry.descriptor.name(), handle = %entry.handle, %rate, "threaded system started");

    loop {
        if signal.wait_until(next) {
            break;
        }

        let outcome = profiler.time(entry.handle, || {
            invoke(entry.handle, &entry.descriptor, &mut *entry.system, world)
        });
        record(&mut entry.stats, &outcome, hook);
        world.apply_commands();
        if outcome.is_err() {
            entry.stats.aborted = true;
            warn!(system = entry.descriptor.name(), handle = %entry.handle, "threaded system aborted");
            break;
        }

        next += period;
        let now = Instant::now();
        if next < now {
            debug!(
                system = entry.descriptor.name(),
                behind_us = (now - next).as_micros() as u64,
                "threaded system overran its period"
            );
            next = now;
        }
    }

    entry.stats.busy += profiler.timing(&entry.handle);
    debug!(
        system = entry.descriptor.name(),
        invocations = entry.stats.invocations,
        "threaded system stopped"
    );
}
