//! Tick timing for the scheduler loop

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Busy time of recent ticks, plus a count of ticks that ran past a budget.
pub struct FrameTimer {
    started: Instant,
    window: RingBuffer<Duration>,
    budget: Option<Duration>,
    frames: u64,
    overruns: u64,
}

impl FrameTimer {
    /// `capacity` is the number of most recent frames the averages cover.
    pub fn new(capacity: usize) -> Self {
        Self {
            started: Instant::now(),
            window: RingBuffer::new(capacity),
            budget: None,
            frames: 0,
            overruns: 0,
        }
    }

    /// Count frames whose busy time exceeds `budget`.
    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn begin(&mut self) {
        self.started = Instant::now();
    }

    /// Close the current frame and return its busy time.
    pub fn end(&mut self) -> Duration {
        let busy = self.started.elapsed();
        self.window.push(busy);
        self.frames += 1;
        if self.budget.is_some_and(|budget| busy > budget) {
            self.overruns += 1;
        }
        busy
    }

    /// Total frames recorded since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Frames per second implied by the average busy time of a frame.
    pub fn fps(&self) -> f64 {
        let avg = self.window.average().as_secs_f64();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.window.average().as_secs_f64() * 1000.0
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.window.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}
