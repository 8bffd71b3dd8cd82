// Per-iteration request/check sequence
//
// One iteration always runs the same ordered steps: single publish, batch
// publish, periodic stats and listing polls, with think-time pauses between
// them. Checks validate each response locally; a failed check is recorded
// and the iteration carries on. Nothing here aborts a worker.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info};

use floodgate_client::{AggregatorClient, ClientError};
use floodgate_core::event::EventGenerator;
use floodgate_core::metrics::{MetricSample, MetricsCollector};
use floodgate_core::WorkerContext;

/// Pacing and cadence knobs. Defaults match the production profile; tests
/// zero the pauses to run iterations back-to-back.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub batch_size: usize,
    /// Think-time after the single publish.
    pub publish_pause: Duration,
    /// Think-time after the batch publish.
    pub batch_pause: Duration,
    /// Think-time closing out the iteration.
    pub iteration_pause: Duration,
    /// Stats poll fires when `iteration % stats_poll_every == 0`.
    pub stats_poll_every: u64,
    /// Listing poll fires when `iteration % listing_poll_every == 0`.
    pub listing_poll_every: u64,
    pub listing_limit: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            publish_pause: Duration::from_millis(100),
            batch_pause: Duration::from_millis(200),
            iteration_pause: Duration::from_millis(500),
            stats_poll_every: 10,
            listing_poll_every: 20,
            listing_limit: 10,
        }
    }
}

/// Run one full dispatcher iteration for this worker.
pub async fn run_iteration(
    client: &AggregatorClient,
    generator: &mut EventGenerator,
    ctx: &WorkerContext,
    metrics: &MetricsCollector,
    config: &DispatcherConfig,
) {
    single_publish(client, generator, ctx, metrics).await;
    sleep(config.publish_pause).await;

    batch_publish(client, generator, ctx, metrics, config.batch_size).await;
    sleep(config.batch_pause).await;

    if ctx.iteration % config.stats_poll_every == 0 {
        stats_poll(client, ctx, metrics).await;
    }
    if ctx.iteration % config.listing_poll_every == 0 {
        listing_poll(client, ctx, metrics, config.listing_limit).await;
    }
    sleep(config.iteration_pause).await;
}

async fn single_publish(
    client: &AggregatorClient,
    generator: &mut EventGenerator,
    ctx: &WorkerContext,
    metrics: &MetricsCollector,
) {
    let event = generator.generate(ctx, true);
    let started = Instant::now();
    let result = client.publish(&event).await;
    let latency = started.elapsed();
    metrics.record(MetricSample::Request { latency });
    metrics.record(MetricSample::PublishLatency { latency });

    match result {
        Ok(response) => {
            // Checks: HTTP 200, then the accepted marker in the body.
            record_check(metrics, true);
            record_check(metrics, response.status == "accepted");
        }
        Err(err) => {
            log_failure(ctx, "single publish", &err);
            record_failed_checks(metrics, 2);
        }
    }
}

async fn batch_publish(
    client: &AggregatorClient,
    generator: &mut EventGenerator,
    ctx: &WorkerContext,
    metrics: &MetricsCollector,
    batch_size: usize,
) {
    let batch = generator.generate_batch(ctx, batch_size);
    let started = Instant::now();
    let result = client.publish(&batch).await;
    metrics.record(MetricSample::Request {
        latency: started.elapsed(),
    });

    match result {
        Ok(response) => {
            record_check(metrics, true);
            record_check(metrics, response.status == "accepted");
            record_check(metrics, response.received == batch_size as u64);
        }
        Err(err) => {
            log_failure(ctx, "batch publish", &err);
            record_failed_checks(metrics, 3);
        }
    }
}

async fn stats_poll(client: &AggregatorClient, ctx: &WorkerContext, metrics: &MetricsCollector) {
    let started = Instant::now();
    let result = client.stats().await;
    metrics.record(MetricSample::Request {
        latency: started.elapsed(),
    });

    match result {
        Ok(stats) => {
            // Decoding proves the three required counters are present and
            // numeric.
            record_check(metrics, true);
            record_check(metrics, true);
            info!(
                worker_id = ctx.worker_id,
                received = stats.received,
                unique_processed = stats.unique_processed,
                duplicate_dropped = stats.duplicate_dropped,
                "aggregator stats"
            );
        }
        Err(err) => {
            log_failure(ctx, "stats poll", &err);
            record_failed_checks(metrics, 2);
        }
    }
}

async fn listing_poll(
    client: &AggregatorClient,
    ctx: &WorkerContext,
    metrics: &MetricsCollector,
    limit: usize,
) {
    let started = Instant::now();
    let result = client.recent_events(limit).await;
    metrics.record(MetricSample::Request {
        latency: started.elapsed(),
    });

    match result {
        Ok(_listing) => {
            // Decoding proves `events` is an array.
            record_check(metrics, true);
            record_check(metrics, true);
        }
        Err(err) => {
            log_failure(ctx, "listing poll", &err);
            record_failed_checks(metrics, 2);
        }
    }
}

fn record_check(metrics: &MetricsCollector, passed: bool) {
    metrics.record(MetricSample::Check { passed });
}

fn record_failed_checks(metrics: &MetricsCollector, count: usize) {
    for _ in 0..count {
        record_check(metrics, false);
    }
}

fn log_failure(ctx: &WorkerContext, step: &str, err: &ClientError) {
    debug!(
        worker_id = ctx.worker_id,
        iteration = ctx.iteration,
        error = %err,
        "{step} failed"
    );
}
