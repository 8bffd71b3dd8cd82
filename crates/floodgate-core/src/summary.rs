// Final run summary: structured archival document + human-readable report
//
// Both renderings are pure functions of the snapshot and run metadata, so
// re-rendering the same inputs is byte-identical.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::{LatencySummary, MetricsSnapshot};

/// Run-level metadata captured by the scheduler at teardown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    /// Highest live worker count observed during the run.
    pub max_concurrency: u32,
}

/// Complete aggregated view of one finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub max_concurrency: u32,
    pub iterations: u64,
    pub requests: RequestStats,
    pub request_duration: LatencySummary,
    pub publish_latency: LatencySummary,
    pub checks: CheckStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestStats {
    pub total: u64,
    pub rate_per_sec: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckStats {
    pub total: u64,
    pub failed: u64,
    pub error_rate: f64,
}

impl RunSummary {
    pub fn build(meta: &RunMeta, snapshot: &MetricsSnapshot) -> Self {
        let rate_per_sec = if meta.elapsed_secs > 0.0 {
            snapshot.requests_total as f64 / meta.elapsed_secs
        } else {
            0.0
        };
        Self {
            run_id: meta.run_id,
            started_at: meta.started_at,
            elapsed_secs: meta.elapsed_secs,
            max_concurrency: meta.max_concurrency,
            iterations: snapshot.iterations,
            requests: RequestStats {
                total: snapshot.requests_total,
                rate_per_sec,
            },
            request_duration: snapshot.request_duration.clone(),
            publish_latency: snapshot.publish_latency.clone(),
            checks: CheckStats {
                total: snapshot.checks_total,
                failed: snapshot.checks_failed,
                error_rate: snapshot.error_rate(),
            },
        }
    }

    /// The machine-readable archival document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// The multi-line console report.
    pub fn render_text(&self) -> String {
        let mut lines = Vec::new();
        lines.push("\n=== Floodgate Load Test Summary ===\n".to_string());
        lines.push(format!("Run duration: {:.2}s", self.elapsed_secs));
        lines.push(format!("Max workers: {}", self.max_concurrency));
        lines.push(format!("Iterations: {}", self.iterations));
        lines.push("\nHTTP requests:".to_string());
        lines.push(format!("  Total: {}", self.requests.total));
        lines.push(format!("  Rate: {:.2} req/s", self.requests.rate_per_sec));
        lines.push("\nResponse time:".to_string());
        lines.push(format!("  Avg: {:.2}ms", self.request_duration.avg_ms));
        lines.push(format!("  p95: {:.2}ms", self.request_duration.p95_ms));
        lines.push(format!("  p99: {:.2}ms", self.request_duration.p99_ms));
        lines.push(format!(
            "\nError rate: {:.2}%",
            self.checks.error_rate * 100.0
        ));
        lines.push("\n===================================\n".to_string());
        lines.join("\n")
    }
}
