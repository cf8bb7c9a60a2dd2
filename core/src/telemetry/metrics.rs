use std::sync::Mutex;

/// Counts drawing resources created and disposed by the scene manager.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub created: usize,
    pub disposed: usize,
}

impl ResourceCounts {
    pub fn retained(&self) -> usize {
        self.created.saturating_sub(self.disposed)
    }
}

struct Metrics {
    created: usize,
    disposed: usize,
    updates: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics {
                created: 0,
                disposed: 0,
                updates: 0,
            }),
        }
    }

    pub fn record_created(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.created += count;
        }
    }

    pub fn record_disposed(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.disposed += count;
        }
    }

    pub fn record_update(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.updates += 1;
        }
    }

    pub fn snapshot(&self) -> ResourceCounts {
        if let Ok(metrics) = self.inner.lock() {
            ResourceCounts {
                created: metrics.created,
                disposed: metrics.disposed,
            }
        } else {
            ResourceCounts::default()
        }
    }

    pub fn updates(&self) -> usize {
        self.inner.lock().map(|metrics| metrics.updates).unwrap_or(0)
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
