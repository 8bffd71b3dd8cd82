// Concurrent metrics accumulation for a load run
//
// Decision: a single mutex-protected accumulator shared by every worker.
// Critical sections only touch memory (no await while locked), so contention
// stays negligible at request-level frequencies, no increment is lost, and
// snapshot() is one consistent point-in-time read.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

/// One measurement, consumed immediately by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSample {
    /// Outcome of a single response check.
    Check { passed: bool },
    /// Wall-clock duration of one outbound call, any endpoint.
    Request { latency: Duration },
    /// Wall-clock duration of a single-event publish call.
    PublishLatency { latency: Duration },
    /// A worker finished one full dispatcher iteration.
    IterationComplete,
}

struct Inner {
    checks_total: u64,
    checks_failed: u64,
    requests_total: u64,
    iterations: u64,
    request_duration_us: Histogram<u64>,
    publish_latency_us: Histogram<u64>,
}

/// Thread-safe accumulator handle, cloned into every worker task.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Inner>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                checks_total: 0,
                checks_failed: 0,
                requests_total: 0,
                iterations: 0,
                request_duration_us: new_histogram(),
                publish_latency_us: new_histogram(),
            })),
        }
    }

    pub fn record(&self, sample: MetricSample) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            // A poisoned lock means a panic mid-record; measurements after
            // that point are best-effort.
            Err(poisoned) => poisoned.into_inner(),
        };
        match sample {
            MetricSample::Check { passed } => {
                inner.checks_total += 1;
                if !passed {
                    inner.checks_failed += 1;
                }
            }
            MetricSample::Request { latency } => {
                inner.requests_total += 1;
                let us = latency.as_micros().min(u128::from(u64::MAX)) as u64;
                inner.request_duration_us.saturating_record(us.max(1));
            }
            MetricSample::PublishLatency { latency } => {
                let us = latency.as_micros().min(u128::from(u64::MAX)) as u64;
                inner.publish_latency_us.saturating_record(us.max(1));
            }
            MetricSample::IterationComplete => {
                inner.iterations += 1;
            }
        }
    }

    /// Consistent point-in-time read of everything accumulated so far.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        MetricsSnapshot {
            checks_total: inner.checks_total,
            checks_failed: inner.checks_failed,
            requests_total: inner.requests_total,
            iterations: inner.iterations,
            request_duration: LatencySummary::from_histogram(&inner.request_duration_us),
            publish_latency: LatencySummary::from_histogram(&inner.publish_latency_us),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn new_histogram() -> Histogram<u64> {
    // Auto-resizing, 3 significant figures; values are microseconds.
    Histogram::new(3).expect("3 significant figures is a valid histogram config")
}

/// Aggregated view of one latency distribution, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl LatencySummary {
    fn from_histogram(histogram: &Histogram<u64>) -> Self {
        if histogram.is_empty() {
            return Self::empty();
        }
        let ms = |us: u64| us as f64 / 1_000.0;
        Self {
            count: histogram.len(),
            min_ms: ms(histogram.min()),
            avg_ms: histogram.mean() / 1_000.0,
            p50_ms: ms(histogram.value_at_quantile(0.50)),
            p95_ms: ms(histogram.value_at_quantile(0.95)),
            p99_ms: ms(histogram.value_at_quantile(0.99)),
            max_ms: ms(histogram.max()),
        }
    }

    pub fn empty() -> Self {
        Self {
            count: 0,
            min_ms: 0.0,
            avg_ms: 0.0,
            p50_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            max_ms: 0.0,
        }
    }
}

/// Final aggregated statistics for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub checks_total: u64,
    pub checks_failed: u64,
    pub requests_total: u64,
    pub iterations: u64,
    pub request_duration: LatencySummary,
    pub publish_latency: LatencySummary,
}

impl MetricsSnapshot {
    /// Failed checks over total checks; 0.0 when nothing was checked.
    pub fn error_rate(&self) -> f64 {
        if self.checks_total == 0 {
            0.0
        } else {
            self.checks_failed as f64 / self.checks_total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_checks_and_failures() {
        let collector = MetricsCollector::new();
        for i in 0..10 {
            collector.record(MetricSample::Check { passed: i != 0 });
        }
        let snapshot = collector.snapshot();
        assert_eq!(snapshot.checks_total, 10);
        assert_eq!(snapshot.checks_failed, 1);
        assert!((snapshot.error_rate() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn empty_snapshot_is_all_zeros() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.checks_total, 0);
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.error_rate(), 0.0);
        assert_eq!(snapshot.request_duration, LatencySummary::empty());
    }

    #[test]
    fn latency_distribution_supports_percentiles() {
        let collector = MetricsCollector::new();
        for ms in 1..=100u64 {
            collector.record(MetricSample::Request {
                latency: Duration::from_millis(ms),
            });
        }
        let summary = collector.snapshot().request_duration;
        assert_eq!(summary.count, 100);
        assert!((summary.min_ms - 1.0).abs() < 0.1);
        // 3 significant figures keeps percentile error well under 1%.
        assert!((summary.p95_ms - 95.0).abs() < 1.0, "p95 {}", summary.p95_ms);
        assert!((summary.p99_ms - 99.0).abs() < 1.0, "p99 {}", summary.p99_ms);
        assert!((summary.avg_ms - 50.5).abs() < 1.0, "avg {}", summary.avg_ms);
        assert!((summary.max_ms - 100.0).abs() < 1.0);
    }

    #[test]
    fn publish_latency_is_tracked_separately_from_requests() {
        let collector = MetricsCollector::new();
        collector.record(MetricSample::PublishLatency {
            latency: Duration::from_millis(5),
        });
        let snapshot = collector.snapshot();
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.publish_latency.count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_writers_lose_no_updates() {
        let collector = MetricsCollector::new();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let collector = collector.clone();
                tokio::spawn(async move {
                    for _ in 0..1_000 {
                        collector.record(MetricSample::Check { passed: true });
                        collector.record(MetricSample::Request {
                            latency: Duration::from_micros(250),
                        });
                        collector.record(MetricSample::IterationComplete);
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.checks_total, 8_000);
        assert_eq!(snapshot.requests_total, 8_000);
        assert_eq!(snapshot.iterations, 8_000);
        assert_eq!(snapshot.request_duration.count, 8_000);
    }
}
