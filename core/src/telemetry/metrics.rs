use std::sync::Mutex;

/// Counters for the poll loop.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles: usize,
    pub cycle_errors: usize,
    pub calibration_triggers: usize,
}

#[derive(Default)]
struct Metrics {
    snapshot: MetricsSnapshot,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_cycle(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshot.cycles += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshot.cycle_errors += 1;
        }
    }

    pub fn record_calibration(&self, triggers: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshot.calibration_triggers += triggers;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            metrics.snapshot
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
