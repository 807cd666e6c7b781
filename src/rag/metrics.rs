//! Request metrics as running means

use std::sync::Mutex;

use crate::models::RagMetrics;

/// Process-wide request counters and rolling averages.
///
/// Averages use the running-mean update so no history is retained.
/// Writes serialize on the mutex; `snapshot` clones the current state.
#[derive(Default)]
pub struct MetricsCollector {
    inner: Mutex<RagMetrics>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, retrieval_time: f64, processing_time: f64) {
        let mut metrics = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        metrics.total_requests += 1;
        metrics.successful_requests += 1;

        let n = metrics.successful_requests as f64;
        metrics.avg_retrieval_time = running_mean(metrics.avg_retrieval_time, retrieval_time, n);
        metrics.avg_processing_time = running_mean(metrics.avg_processing_time, processing_time, n);
        metrics.avg_total_time = running_mean(
            metrics.avg_total_time,
            retrieval_time + processing_time,
            n,
        );
    }

    pub fn record_failure(&self) {
        let mut metrics = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        metrics.total_requests += 1;
        metrics.failed_requests += 1;
    }

    #[must_use]
    pub fn snapshot(&self) -> RagMetrics {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

fn running_mean(old_avg: f64, sample: f64, n: f64) -> f64 {
    (old_avg * (n - 1.0) + sample) / n
}
