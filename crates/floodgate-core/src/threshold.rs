// SLA threshold evaluation over the final metrics snapshot

use std::fmt;

use serde::Serialize;

use crate::metrics::MetricsSnapshot;

/// Which aggregated value a threshold binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMetric {
    /// p95 of the request-duration distribution, in milliseconds.
    RequestDurationP95,
    /// Failed checks over total checks, as a fraction.
    ErrorRate,
}

impl ThresholdMetric {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdMetric::RequestDurationP95 => "p95 request duration (ms)",
            ThresholdMetric::ErrorRate => "error rate",
        }
    }

    fn observe(self, snapshot: &MetricsSnapshot) -> f64 {
        match self {
            ThresholdMetric::RequestDurationP95 => snapshot.request_duration.p95_ms,
            ThresholdMetric::ErrorRate => snapshot.error_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    LessThan,
    GreaterThan,
}

impl Comparison {
    fn holds(self, observed: f64, bound: f64) -> bool {
        match self {
            Comparison::LessThan => observed < bound,
            Comparison::GreaterThan => observed > bound,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::LessThan => write!(f, "<"),
            Comparison::GreaterThan => write!(f, ">"),
        }
    }
}

/// Static pass/fail bound on one aggregated metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSpec {
    pub metric: ThresholdMetric,
    pub comparison: Comparison,
    pub bound: f64,
}

impl ThresholdSpec {
    pub fn new(metric: ThresholdMetric, comparison: Comparison, bound: f64) -> Self {
        Self {
            metric,
            comparison,
            bound,
        }
    }

    /// The default SLA: p95 request duration under 500ms, error rate under 1%.
    pub fn defaults() -> Vec<ThresholdSpec> {
        vec![
            ThresholdSpec::new(
                ThresholdMetric::RequestDurationP95,
                Comparison::LessThan,
                500.0,
            ),
            ThresholdSpec::new(ThresholdMetric::ErrorRate, Comparison::LessThan, 0.01),
        ]
    }
}

/// Verdict for one threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdResult {
    pub metric: ThresholdMetric,
    pub comparison: Comparison,
    pub bound: f64,
    pub observed: f64,
    pub passed: bool,
}

impl fmt::Display for ThresholdResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.4} {} {:.4} ... {}",
            self.metric.name(),
            self.observed,
            self.comparison,
            self.bound,
            if self.passed { "ok" } else { "FAILED" }
        )
    }
}

/// Overall verdict plus per-threshold breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdReport {
    pub passed: bool,
    pub results: Vec<ThresholdResult>,
}

impl ThresholdReport {
    /// Names of the thresholds that failed.
    pub fn failed_metrics(&self) -> Vec<&'static str> {
        self.results
            .iter()
            .filter(|result| !result.passed)
            .map(|result| result.metric.name())
            .collect()
    }
}

/// Evaluate every threshold against the final snapshot. Read-only: the
/// snapshot is borrowed and never mutated.
pub fn evaluate(specs: &[ThresholdSpec], snapshot: &MetricsSnapshot) -> ThresholdReport {
    let results: Vec<ThresholdResult> = specs
        .iter()
        .map(|spec| {
            let observed = spec.metric.observe(snapshot);
            ThresholdResult {
                metric: spec.metric,
                comparison: spec.comparison,
                bound: spec.bound,
                observed,
                passed: spec.comparison.holds(observed, spec.bound),
            }
        })
        .collect();
    ThresholdReport {
        passed: results.iter().all(|result| result.passed),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LatencySummary;

    fn snapshot(p95_ms: f64, checks_total: u64, checks_failed: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_total,
            checks_failed,
            requests_total: checks_total,
            iterations: 10,
            request_duration: LatencySummary {
                count: checks_total,
                min_ms: 1.0,
                avg_ms: p95_ms / 2.0,
                p50_ms: p95_ms / 2.0,
                p95_ms,
                p99_ms: p95_ms * 1.2,
                max_ms: p95_ms * 1.5,
            },
            publish_latency: LatencySummary::empty(),
        }
    }

    #[test]
    fn slow_p95_fails_the_run() {
        let report = evaluate(&ThresholdSpec::defaults(), &snapshot(600.0, 1_000, 0));
        assert!(!report.passed);
        assert_eq!(report.failed_metrics(), vec!["p95 request duration (ms)"]);
    }

    #[test]
    fn fast_p95_and_low_error_rate_pass() {
        // 0.5% error rate, p95 well under the bound.
        let report = evaluate(&ThresholdSpec::defaults(), &snapshot(400.0, 1_000, 5));
        assert!(report.passed);
        assert!(report.results.iter().all(|result| result.passed));
    }

    #[test]
    fn error_rate_at_one_percent_fails() {
        let report = evaluate(&ThresholdSpec::defaults(), &snapshot(100.0, 1_000, 10));
        assert!(!report.passed);
        assert_eq!(report.failed_metrics(), vec!["error rate"]);
    }

    #[test]
    fn breakdown_reports_observed_values() {
        let report = evaluate(&ThresholdSpec::defaults(), &snapshot(400.0, 200, 1));
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].observed, 400.0);
        assert!((report.results[1].observed - 0.005).abs() < 1e-9);
    }

    #[test]
    fn evaluation_does_not_mutate_the_snapshot() {
        let before = snapshot(123.0, 50, 2);
        let after = before.clone();
        let _ = evaluate(&ThresholdSpec::defaults(), &before);
        assert_eq!(before, after);
    }

    #[test]
    fn result_display_names_the_verdict() {
        let report = evaluate(&ThresholdSpec::defaults(), &snapshot(600.0, 10, 0));
        let line = report.results[0].to_string();
        assert!(line.contains("FAILED"), "{line}");
        assert!(report.results[1].to_string().contains("ok"));
    }
}
