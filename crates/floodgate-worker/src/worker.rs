// One worker: a tokio task looping the dispatcher until retired
//
// Retirement is cooperative. The stop flag is only observed between
// iterations, so a retiring worker always finishes the iteration it is in
// (graceful drain, no mid-iteration abort).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use floodgate_client::AggregatorClient;
use floodgate_core::event::EventGenerator;
use floodgate_core::metrics::{MetricSample, MetricsCollector};
use floodgate_core::WorkerContext;

use crate::dispatcher::{self, DispatcherConfig};

/// Handle the scheduler keeps for each live worker task.
pub struct WorkerHandle {
    pub worker_id: u32,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Ask the worker to stop after its current iteration.
    pub fn retire(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker task to finish.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            warn!(worker_id = self.worker_id, error = %err, "worker task failed");
        }
    }
}

/// Spawn one worker. The worker derives its event-generator seed from the
/// run seed and its id, so a run's traffic is reproducible per worker.
pub fn spawn_worker(
    worker_id: u32,
    client: AggregatorClient,
    metrics: MetricsCollector,
    config: Arc<DispatcherConfig>,
    run_seed: u64,
) -> WorkerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    let handle = tokio::spawn(async move {
        let mut ctx = WorkerContext::new(worker_id);
        let mut generator = EventGenerator::seeded(run_seed.wrapping_add(u64::from(worker_id)));
        debug!(worker_id, "worker started");

        while !flag.load(Ordering::Relaxed) {
            dispatcher::run_iteration(&client, &mut generator, &ctx, &metrics, &config).await;
            metrics.record(MetricSample::IterationComplete);
            ctx.advance();
        }

        debug!(worker_id, iterations = ctx.iteration, "worker retired");
    });

    WorkerHandle {
        worker_id,
        stop,
        handle,
    }
}
