//! Unit tests for metrics.rs module

use land_record_search::metrics::{MetricsCollector, MetricsSnapshot};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_metrics_collector_default() {
    let collector = MetricsCollector::default();
    assert_eq!(collector.snapshot(), MetricsSnapshot::default());
}

#[test]
fn test_metrics_initialization() {
    // The global recorder can only be installed once per process.
    let result = MetricsCollector::init();
    assert!(result.is_ok());
}

#[test]
fn test_record_successful_search() {
    let collector = MetricsCollector::default();
    collector.record_search("survey", true, 2, Duration::from_millis(5));

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.searches_completed, 1);
    assert_eq!(snapshot.searches_failed, 0);
    assert_eq!(snapshot.results_returned, 2);
}

#[test]
fn test_record_failed_search() {
    let collector = MetricsCollector::default();
    collector.record_search("owner", false, 0, Duration::from_millis(5));

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.searches_completed, 0);
    assert_eq!(snapshot.searches_failed, 1);
}

#[test]
fn test_record_validation_failure() {
    let collector = MetricsCollector::default();
    collector.record_validation_failure(3);
    collector.record_validation_failure(1);
    assert_eq!(collector.snapshot().validation_failures, 2);
}

#[test]
fn test_record_error_and_captcha() {
    let collector = MetricsCollector::default();
    collector.record_error("lookup");
    collector.record_captcha_issued();
    collector.record_captcha_issued();

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.errors, 1);
    assert_eq!(snapshot.captchas_issued, 2);
}

#[test]
fn test_concurrent_recording() {
    let collector = Arc::new(MetricsCollector::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let collector = Arc::clone(&collector);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    collector.record_search("uid", true, 1, Duration::from_micros(10));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.searches_completed, 800);
    assert_eq!(snapshot.results_returned, 800);
}
