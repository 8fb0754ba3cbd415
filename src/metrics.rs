use anyhow::Result;
use metrics::{counter, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metric names emitted through the `metrics` facade
pub mod names {
    /// Searches by mode and outcome
    pub const SEARCHES_TOTAL: &str = "land_records_searches_total";
    /// Search latency
    pub const SEARCH_DURATION: &str = "land_records_search_duration_seconds";
    /// Records returned across all searches
    pub const RESULTS_TOTAL: &str = "land_records_results_total";
    /// Requests rejected by validation
    pub const VALIDATION_FAILURES_TOTAL: &str = "land_records_validation_failures_total";
    /// Errors by type
    pub const ERRORS_TOTAL: &str = "land_records_errors_total";
    /// Captcha challenges issued
    pub const CAPTCHAS_ISSUED_TOTAL: &str = "land_records_captchas_issued_total";
}

/// Point-in-time copy of the process-local tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Searches that completed
    pub searches_completed: u64,
    /// Searches that faulted after the audit row was opened
    pub searches_failed: u64,
    /// Records returned
    pub results_returned: u64,
    /// Requests rejected by validation
    pub validation_failures: u64,
    /// Errors of any type
    pub errors: u64,
    /// Captchas issued
    pub captchas_issued: u64,
}

/// Metrics collection and management
///
/// Every event is forwarded to the global `metrics` recorder (a no-op until
/// one is installed) and counted locally so it can be read back with
/// [`MetricsCollector::snapshot`].
#[derive(Debug, Default)]
pub struct MetricsCollector {
    searches_completed: AtomicU64,
    searches_failed: AtomicU64,
    results_returned: AtomicU64,
    validation_failures: AtomicU64,
    errors: AtomicU64,
    captchas_issued: AtomicU64,
}

impl MetricsCollector {
    /// Initialize metrics collection
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record a search that reached a terminal status
    pub fn record_search(&self, mode: &'static str, success: bool, results: usize, duration: Duration) {
        let outcome = if success { "completed" } else { "failed" };
        counter!(names::SEARCHES_TOTAL, "mode" => mode, "outcome" => outcome).increment(1);
        histogram!(names::SEARCH_DURATION, "mode" => mode).record(duration.as_secs_f64());

        if success {
            self.searches_completed.fetch_add(1, Ordering::Relaxed);
            let results = results as u64;
            counter!(names::RESULTS_TOTAL, "mode" => mode).increment(results);
            self.results_returned.fetch_add(results, Ordering::Relaxed);
        } else {
            self.searches_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a request rejected before any lookup
    pub fn record_validation_failure(&self, fields: usize) {
        counter!(names::VALIDATION_FAILURES_TOTAL).increment(1);
        histogram!("land_records_validation_violations").record(fields as f64);
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str) {
        counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an issued captcha
    pub fn record_captcha_issued(&self) {
        counter!(names::CAPTCHAS_ISSUED_TOTAL).increment(1);
        self.captchas_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Current tallies
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            searches_completed: self.searches_completed.load(Ordering::Relaxed),
            searches_failed: self.searches_failed.load(Ordering::Relaxed),
            results_returned: self.results_returned.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            captchas_issued: self.captchas_issued.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_failed_search_does_not_count_results() {
        let collector = MetricsCollector::default();
        collector.record_search("uid", false, 3, Duration::from_millis(2));
        let snapshot = collector.snapshot();
        assert_eq!(snapshot.searches_failed, 1);
        assert_eq!(snapshot.results_returned, 0);
    }
}
