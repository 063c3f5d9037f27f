use crate::ecs::{ExecutionMode, SystemHandle};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// What one system did during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemReport {
    pub handle: SystemHandle,
    pub name: String,
    pub mode: ExecutionMode,
    pub invocations: u64,
    pub failures: u64,
    /// Threaded systems only: the timer loop ended on a failure.
    pub aborted: bool,
    /// Time spent inside the system body. Zero without the `metrics`
    /// feature.
    pub busy: Duration,
}

/// Returned by `Game::start` once every worker has been joined.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub elapsed: Duration,
    /// Average tick time over the last `frame_samples` ticks. Zero without
    /// the `metrics` feature.
    pub frame_time_ms: f64,
    /// Ticks whose busy time exceeded the frame period. Always zero for an
    /// unpaced loop or without the `metrics` feature.
    pub overruns: u64,
    /// Ordered by handle.
    pub systems: Vec<SystemReport>,
}

impl RunSummary {
    pub fn system(&self, handle: SystemHandle) -> Option<&SystemReport> {
        self.systems.iter().find(|report| report.handle == handle)
    }

    pub fn total_failures(&self) -> u64 {
        self.systems.iter().map(|report| report.failures).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ticks in {:.2}s (avg tick {:.3}ms, {} over budget)",
            self.ticks,
            self.elapsed.as_secs_f64(),
            self.frame_time_ms,
            self.overruns
        )?;
        for report in &self.systems {
            writeln!(
                f,
                "  {:<4} {:<24} {:<16} calls={:<8} failures={:<4} busy={:.1}ms{}",
                report.handle.to_string(),
                report.name,
                report.mode.to_string(),
                report.invocations,
                report.failures,
                report.busy.as_secs_f64() * 1000.0,
                if report.aborted { " (aborted)" } else { "" }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::CallRate;

    fn report(index: u32, mode: ExecutionMode, failures: u64, aborted: bool) -> SystemReport {
        SystemReport {
            handle: SystemHandle::new(index),
            name: format!("system{index}"),
            mode,
            invocations: 10,
            failures,
            aborted,
            busy: Duration::from_millis(3),
        }
    }

    #[test]
    fn summary_totals_and_renders() {
        let rate = CallRate::new(60.0).unwrap();
        let summary = RunSummary {
            ticks: 10,
            elapsed: Duration::from_millis(250),
            frame_time_ms: 0.5,
            overruns: 2,
            systems: vec![
                report(0, ExecutionMode::PerFrame, 1, false),
                report(1, ExecutionMode::Threaded(rate), 1, true),
            ],
        };

        assert_eq!(summary.total_failures(), 2);
        assert_eq!(summary.system(SystemHandle::new(1)).map(|r| r.aborted), Some(true));
        assert!(summary.system(SystemHandle::new(7)).is_none());

        let text = summary.to_string();
        assert!(text.starts_with("10 ticks in 0.25s"));
        assert!(text.contains("2 over budget"));
        assert!(text.contains("threaded@60Hz"));
        assert!(text.contains("(aborted)"));
    }
}
