//! Scheduler and run loop.
//!
//! The calling thread runs the tick loop: every tick invokes all per-frame
//! systems, then all main-thread systems, each group in registration order.
//! Every threaded system gets its own scoped worker thread with its own
//! timer. Stopping wakes all workers, and `run` joins them before it
//! returns, so no worker outlives the call.

mod error;
mod invoke;
mod report;
mod signal;
mod worker;

pub use error::{SchedulerError, SystemInvocationError};
pub use report::{RunSummary, SystemReport};
pub use signal::{SchedulerState, StopHandle};

pub(crate) use signal::StopSignal;

use crate::config::SchedulerConfig;
use crate::ecs::system_registry::{LocalSystem, RegisteredSystem, SharedSystem, SystemRegistry};
use crate::ecs::system::System;
use crate::ecs::{ExecutionMode, SystemHandle, World};
use cadence_metrics::{FrameTimer, SystemProfiler};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Callback invoked for every failed system invocation, from whichever
/// thread ran the system.
pub type ErrorHook = Arc<dyn Fn(&SystemInvocationError) + Send + Sync>;

/// Block the calling thread running ticks until `signal` is stopped or
/// `config.max_ticks` is reached.
pub(crate) fn run(
    world: &World,
    registry: &mut SystemRegistry,
    config: &SchedulerConfig,
    signal: &StopSignal,
    hook: Option<&ErrorHook>,
) -> Result<RunSummary, SchedulerError> {
    let split = registry.split_mut();
    let (per_frame, threaded, main_thread) = (split.per_frame, split.threaded, split.main_thread);

    for entry in per_frame.iter_mut().chain(threaded.iter_mut()) {
        entry.stats = Default::default();
    }
    for entry in main_thread.iter_mut() {
        entry.stats = Default::default();
    }

    info!(
        per_frame = per_frame.len(),
        threaded = threaded.len(),
        main_thread = main_thread.len(),
        frame_rate = ?config.frame_rate.map(|rate| rate.hz()),
        max_ticks = config.max_ticks,
        "scheduler starting"
    );

    if !signal.begin() {
        info!("stop was requested before start; the run ends at once");
    }
    let started = Instant::now();
    let mut timer = FrameTimer::new(config.frame_samples).with_budget(config.frame_period());

    let outcome = thread::scope(|scope| {
        let mut workers = Vec::with_capacity(threaded.len());
        for entry in threaded.iter_mut() {
            let ExecutionMode::Threaded(rate) = entry.descriptor.mode() else {
                continue;
            };
            let system = entry.descriptor.name().to_string();
            let spawned = thread::Builder::new()
                .name(format!("cadence-{}", entry.handle.index()))
                .spawn_scoped(scope, move || worker::run(entry, rate, world, signal, hook));
            match spawned {
                Ok(worker) => workers.push((system, worker)),
                Err(source) => {
                    error!(%system, %source, "failed to spawn worker thread");
                    signal.request_stop();
                    join_workers(workers);
                    return Err(SchedulerError::WorkerSpawn { system, source });
                }
            }
        }

        let ticks = tick_loop(world, per_frame, main_thread, config, signal, hook, &mut timer);

        signal.request_stop();
        join_workers(workers);
        Ok(ticks)
    });

    signal.finish();
    let ticks = outcome?;
    world.apply_commands();

    let mut systems: Vec<SystemReport> = per_frame
        .iter()
        .chain(threaded.iter())
        .map(|entry| report_for(entry))
        .chain(main_thread.iter().map(|entry| report_for(entry)))
        .collect();
    systems.sort_by_key(|report| report.handle);

    let summary = RunSummary {
        ticks,
        elapsed: started.elapsed(),
        frame_time_ms: timer.frame_time_ms(),
        overruns: timer.overruns(),
        systems,
    };
    info!(
        ticks = summary.ticks,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        failures = summary.total_failures(),
        overruns = summary.overruns,
        "scheduler stopped"
    );
    Ok(summary)
}

fn join_workers(workers: Vec<(String, thread::ScopedJoinHandle<'_, ()>)>) {
    for (system, worker) in workers {
        if worker.join().is_err() {
            error!(%system, "worker thread panicked outside its system body");
        }
    }
}

fn tick_loop(
    world: &World,
    per_frame: &mut [SharedSystem],
    main_thread: &mut [LocalSystem],
    config: &SchedulerConfig,
    signal: &StopSignal,
    hook: Option<&ErrorHook>,
    timer: &mut FrameTimer,
) -> u64 {
    let frame_period = config.frame_period();
    let mut profiler = SystemProfiler::new();
    let mut ticks = 0u64;
    let mut next_frame = Instant::now();

    while signal.is_running() {
        timer.begin();
        tick(world, per_frame, main_thread, hook, &mut profiler);
        timer.end();
        ticks += 1;

        if config.max_ticks > 0 && ticks >= config.max_ticks {
            info!(ticks, "tick limit reached");
            break;
        }

        match frame_period {
            Some(period) => {
                next_frame += period;
                let now = Instant::now();
                if next_frame <= now {
                    warn!(
                        tick = ticks,
                        behind_ms = (now - next_frame).as_millis() as u64,
                        budget_ms = period.as_millis() as u64,
                        "tick exceeded frame budget"
                    );
                    next_frame = now;
                    thread::yield_now();
                } else if signal.wait_until(next_frame) {
                    break;
                }
            }
            None => thread::yield_now(),
        }
    }

    for entry in per_frame.iter_mut() {
        entry.stats.busy += profiler.timing(&entry.handle);
    }
    for entry in main_thread.iter_mut() {
        entry.stats.busy += profiler.timing(&entry.handle);
    }
    debug!(ticks, "tick loop finished");
    ticks
}

/// One tick on the calling thread: queued commands, then per-frame systems,
/// then main-thread systems, each group in registration order. Failures are
/// recorded and returned; they never stop the tick.
pub(crate) fn tick(
    world: &World,
    per_frame: &mut [SharedSystem],
    main_thread: &mut [LocalSystem],
    hook: Option<&ErrorHook>,
    profiler: &mut SystemProfiler<SystemHandle>,
) -> Vec<SystemInvocationError> {
    let applied = world.apply_commands();
    if applied > 0 {
        debug!(applied, "queued commands applied");
    }

    let mut failures = Vec::new();
    for entry in per_frame.iter_mut() {
        if let Err(error) = run_entry(entry, world, hook, profiler) {
            failures.push(error);
        }
    }
    for entry in main_thread.iter_mut() {
        if let Err(error) = run_entry(entry, world, hook, profiler) {
            failures.push(error);
        }
    }
    failures
}

fn run_entry<S>(
    entry: &mut RegisteredSystem<S>,
    world: &World,
    hook: Option<&ErrorHook>,
    profiler: &mut SystemProfiler<SystemHandle>,
) -> Result<(), SystemInvocationError>
where
    S: System + ?Sized,
{
    let handle = entry.handle;
    let outcome = profiler.time(handle, || {
        invoke::invoke(handle, &entry.descriptor, &mut *entry.system, world)
    });
    invoke::record(&mut entry.stats, &outcome, hook);
    outcome
}

fn report_for<S: ?Sized>(entry: &RegisteredSystem<S>) -> SystemReport {
    SystemReport {
        handle: entry.handle,
        name: entry.descriptor.name().to_string(),
        mode: entry.descriptor.mode(),
        invocations: entry.stats.invocations,
        failures: entry.stats.failures,
        aborted: entry.stats.aborted,
        busy: entry.stats.busy,
    }
}
