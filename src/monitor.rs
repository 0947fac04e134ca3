use std::time::{Duration, Instant};

use serde::Serialize;

/// Wall-clock timing of one full insight run.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub elapsed: Duration,
    pub succeeded: bool,
}

impl PerformanceReport {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

impl std::fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Response time: {:.3}s ({})",
            self.elapsed.as_secs_f64(),
            if self.succeeded { "ok" } else { "failed" }
        )
    }
}

/// Simple stopwatch started at construction.
pub struct Stopwatch(Instant);

impl Stopwatch {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn finish(self, succeeded: bool) -> PerformanceReport {
        PerformanceReport {
            elapsed: self.0.elapsed(),
            succeeded,
        }
    }
}
