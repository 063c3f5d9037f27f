//! Cadence Metrics - timing for the scheduler's tick loop and systems
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use cadence_metrics::{FrameTimer, SystemProfiler};
//!
//! let mut timer = FrameTimer::new(60); // Track last 60 ticks
//! let mut profiler = SystemProfiler::new();
//!
//! timer.begin();
//! profiler.time("movement", || { /* ... run the system ... */ });
//! timer.end();
//!
//! println!("tick rate: {:.1}/s", timer.fps());
//! ```
//!
//! In production builds (without `metrics` feature), all instrumentation
//! is compiled out to zero overhead.

#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::SystemProfiler;

/// Whether this build collects real timings.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn with_budget(self, _budget: Option<std::time::Duration>) -> Self { self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn frames(&self) -> u64 { 0 }
    pub fn overruns(&self) -> u64 { 0 }
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
    pub fn capacity(&self) -> usize { 0 }
}

#[cfg(not(feature = "metrics"))]
impl RingBuffer<std::time::Duration> {
    pub fn average(&self) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn min_max(&self) -> (std::time::Duration, std::time::Duration) {
        (std::time::Duration::ZERO, std::time::Duration::ZERO)
    }
}

#[cfg(not(feature = "metrics"))]
pub struct SystemProfiler<K = String>(std::marker::PhantomData<K>);

#[cfg(not(feature = "metrics"))]
impl<K> SystemProfiler<K> {
    pub fn new() -> Self { Self(std::marker::PhantomData) }
    pub fn time<F, R>(&mut self, _key: K, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn timing(&self, _key: &K) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn calls(&self, _key: &K) -> u64 { 0 }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
impl<K> Default for SystemProfiler<K> {
    fn default() -> Self {
        Self::new()
    }
}
