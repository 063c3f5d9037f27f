//! Accumulated busy time per system

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Default)]
struct Timing {
    total: Duration,
    calls: u64,
}

/// Times closures under a key (a system handle, a name, ...) and keeps the
/// running total and call count per key.
pub struct SystemProfiler<K = String> {
    timings: HashMap<K, Timing>,
}

impl<K: Hash + Eq> SystemProfiler<K> {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
        }
    }

    pub fn time<F, R>(&mut self, key: K, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let timing = self.timings.entry(key).or_default();
        timing.total += elapsed;
        timing.calls += 1;
        result
    }

    pub fn timing(&self, key: &K) -> Duration {
        self.timings.get(key).map(|t| t.total).unwrap_or(Duration::ZERO)
    }

    pub fn calls(&self, key: &K) -> u64 {
        self.timings.get(key).map(|t| t.calls).unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, Duration)> {
        self.timings.iter().map(|(key, t)| (key, t.total))
    }
}

impl<K: Hash + Eq> Default for SystemProfiler<K> {
    fn default() -> Self {
        Self::new()
    }
}
