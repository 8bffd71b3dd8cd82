// Stage scheduler: reconciles live workers against the ramp profile
//
// A tick loop computes the desired concurrency for the elapsed wall-clock
// time and spawns or retires workers to match. Retired workers drain
// gracefully; their tasks are awaited before the final snapshot is taken,
// so the summary is produced exactly once over settled metrics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use floodgate_client::AggregatorClient;
use floodgate_core::metrics::{MetricsCollector, MetricsSnapshot};
use floodgate_core::stage::RampProfile;
use floodgate_core::summary::RunMeta;

use crate::dispatcher::DispatcherConfig;
use crate::worker::{spawn_worker, WorkerHandle};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often desired concurrency is recomputed and reconciled.
    pub tick_interval: Duration,
    /// Base seed for per-worker event generators.
    pub seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            seed: 42,
        }
    }
}

/// Everything the run produced: metadata for the reporter plus the final
/// metrics snapshot.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub meta: RunMeta,
    pub snapshot: MetricsSnapshot,
}

pub struct StageScheduler {
    profile: RampProfile,
    config: SchedulerConfig,
}

impl StageScheduler {
    pub fn new(profile: RampProfile, config: SchedulerConfig) -> Self {
        Self { profile, config }
    }

    /// Drive the full ramp profile to completion and return the final
    /// report. Workers are plain tokio tasks sharing only the metrics
    /// collector handle.
    pub async fn run(
        &self,
        client: &AggregatorClient,
        dispatcher: DispatcherConfig,
    ) -> RunReport {
        let metrics = MetricsCollector::new();
        let dispatcher = Arc::new(dispatcher);
        let total = self.profile.total_duration();
        let started_at = Utc::now();
        let started = Instant::now();

        info!(
            stages = self.profile.stages().len(),
            total_secs = total.as_secs_f64(),
            "starting staged load run"
        );

        let mut active: Vec<WorkerHandle> = Vec::new();
        let mut draining: Vec<WorkerHandle> = Vec::new();
        let mut next_worker_id: u32 = 1;
        let mut max_concurrency: u32 = 0;

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let elapsed = started.elapsed();
            if elapsed >= total {
                break;
            }

            let desired = self.profile.concurrency_at(elapsed) as usize;
            while active.len() < desired {
                let handle = spawn_worker(
                    next_worker_id,
                    client.clone(),
                    metrics.clone(),
                    dispatcher.clone(),
                    self.config.seed,
                );
                next_worker_id += 1;
                active.push(handle);
            }
            while active.len() > desired {
                if let Some(handle) = active.pop() {
                    handle.retire();
                    draining.push(handle);
                }
            }

            max_concurrency = max_concurrency.max(active.len() as u32);
            debug!(
                elapsed_secs = elapsed.as_secs_f64(),
                desired,
                live = active.len(),
                "reconciled worker count"
            );
        }

        info!(
            live = active.len(),
            draining = draining.len(),
            "run duration reached, draining workers"
        );
        for handle in &active {
            handle.retire();
        }
        for handle in active.into_iter().chain(draining) {
            handle.join().await;
        }

        let elapsed = started.elapsed();
        let snapshot = metrics.snapshot();
        info!(
            elapsed_secs = elapsed.as_secs_f64(),
            iterations = snapshot.iterations,
            requests = snapshot.requests_total,
            "load run complete"
        );

        RunReport {
            meta: RunMeta {
                run_id: Uuid::now_v7(),
                started_at,
                elapsed_secs: elapsed.as_secs_f64(),
                max_concurrency,
            },
            snapshot,
        }
    }
}
