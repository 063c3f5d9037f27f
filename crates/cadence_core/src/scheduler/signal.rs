// signal.rs - Run state shared by the tick loop, workers and stop handles
//
// The state lives under a mutex paired with a condition variable. Workers
// sleep on the condvar until their next deadline, so a stop request wakes
// them immediately instead of after a full period.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
    /// Stop requested; workers are finishing their current invocation.
    Stopping,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Stopped => "stopped",
            SchedulerState::Running => "running",
            SchedulerState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

struct Shared {
    state: SchedulerState,
    /// A stop arrived while stopped; the next `begin` honours it.
    stop_pending: bool,
}

pub(crate) struct StopSignal {
    shared: Mutex<Shared>,
    wake: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(Shared {
                state: SchedulerState::Stopped,
                stop_pending: false,
            }),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SchedulerState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Enter `Running`, or go straight to `Stopping` if a stop was requested
    /// before the run began. Returns `false` in the latter case.
    pub fn begin(&self) -> bool {
        let mut shared = self.lock();
        if std::mem::take(&mut shared.stop_pending) {
            shared.state = SchedulerState::Stopping;
            false
        } else {
            shared.state = SchedulerState::Running;
            true
        }
    }

    /// Ask the scheduler to stop. A running scheduler moves to `Stopping`
    /// and every sleeper wakes; a stopped one remembers the request for its
    /// next run. Returns `false` if a stop was already under way.
    pub fn request_stop(&self) -> bool {
        let mut shared = self.lock();
        match shared.state {
            SchedulerState::Running => {
                shared.state = SchedulerState::Stopping;
                self.wake.notify_all();
                true
            }
            SchedulerState::Stopped => !std::mem::replace(&mut shared.stop_pending, true),
            SchedulerState::Stopping => false,
        }
    }

    pub fn finish(&self) {
        self.lock().state = SchedulerState::Stopped;
        self.wake.notify_all();
    }

    /// Sleep until `deadline` or until a stop is requested, whichever comes
    /// first. Returns `true` if the scheduler is no longer running.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut shared = self.lock();
        loop {
            if shared.state != SchedulerState::Running {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            shared = self
                .wake
                .wait_timeout(shared, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }
}

/// Cloneable, thread-safe handle for stopping a running game.
#[derive(Clone)]
pub struct StopHandle {
    signal: Arc<StopSignal>,
}

impl StopHandle {
    pub(crate) fn new(signal: Arc<StopSignal>) -> Self {
        Self { signal }
    }

    /// Request shutdown. Workers exit at their next wake point and the
    /// blocked `start` call returns once all of them have been joined.
    /// A stop requested before `start` makes that run end immediately.
    pub fn stop(&self) {
        if self.signal.request_stop() {
            tracing::info!("stop requested");
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.signal.state()
    }

    pub fn is_running(&self) -> bool {
        self.signal.is_running()
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopHandle").field("state", &self.state()).finish()
    }
}
