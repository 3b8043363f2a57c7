//! Lightweight timing of client operations.
//!
//! Components wrap their network-bound operations in a [`PerfMark`]; the
//! finished measure is stored under the operation name and logged at debug
//! level.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Everything recorded for one operation name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationMetrics {
    /// Duration of the latest finished measure.
    pub last: Option<Duration>,
    /// Number of finished measures.
    pub count: u64,
}

#[derive(Debug, Default)]
pub struct PerfMonitor {
    metrics: Mutex<HashMap<String, OperationMetrics>>,
}

impl PerfMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, OperationMetrics>> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts timing `name`. The measure is recorded by [`PerfMark::finish`].
    pub fn mark(&self, name: &'static str) -> PerfMark<'_> {
        PerfMark {
            monitor: self,
            name,
            started: Instant::now(),
        }
    }

    pub fn record(&self, name: &str, elapsed: Duration) {
        tracing::debug!("[Perf] {} took {:?}", name, elapsed);
        let mut metrics = self.guard();
        let entry = metrics.entry(name.to_string()).or_default();
        entry.last = Some(elapsed);
        entry.count += 1;
    }

    pub fn metrics(&self, name: &str) -> Option<OperationMetrics> {
        self.guard().get(name).cloned()
    }

    /// All recorded metrics, sorted by operation name.
    pub fn export(&self) -> Vec<(String, OperationMetrics)> {
        let mut all: Vec<_> = self
            .guard()
            .iter()
            .map(|(name, metrics)| (name.clone(), metrics.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn clear(&self) {
        self.guard().clear();
    }
}

/// An in-progress measure.
#[must_use = "a mark records nothing until finish() is called"]
pub struct PerfMark<'a> {
    monitor: &'a PerfMonitor,
    name: &'static str,
    started: Instant,
}

impl PerfMark<'_> {
    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.monitor.record(self.name, elapsed);
        elapsed
    }
}
