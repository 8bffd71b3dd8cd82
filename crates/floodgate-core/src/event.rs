// Synthetic event generation with controlled duplicate-ID injection
//
// Decision: randomness is an explicit seedable StdRng owned by the generator,
// so duplicate-injection behavior is reproducible in tests. Workers derive
// their generator seed from the run seed plus their worker id.

use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::context::WorkerContext;

/// Topics events are published under, drawn uniformly.
pub const TOPICS: [&str; 5] = ["logs", "metrics", "events", "alerts", "traces"];

/// Probability that an eligible event reuses a pooled duplicate identifier.
pub const DUPLICATE_PROBABILITY: f64 = 0.30;

/// Size of the deterministic duplicate-ID pool (`duplicate-0` .. `duplicate-99`).
pub const DUPLICATE_POOL_SIZE: u32 = 100;

/// Severity level carried in the event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "ERROR")]
    Error,
}

const LEVELS: [Level; 3] = [Level::Info, Level::Warning, Level::Error];

/// One synthetic event in the collaborator's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct SyntheticEvent {
    pub topic: String,
    pub event_id: String,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub source: String,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    pub message: String,
    pub level: Level,
    pub metadata: EventMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventMetadata {
    pub iteration: u64,
    pub worker_id: u32,
    pub timestamp_ms: i64,
}

/// Produces synthetic events, reusing pooled duplicate identifiers for a
/// configured share of eligible events to exercise the collaborator's
/// deduplication path.
#[derive(Debug)]
pub struct EventGenerator {
    rng: StdRng,
}

impl EventGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A practically collision-free identifier: epoch millis plus a random
    /// 32-bit suffix.
    pub fn new_event_id(&mut self) -> String {
        format!(
            "fg-{}-{:08x}",
            Utc::now().timestamp_millis(),
            self.rng.gen::<u32>()
        )
    }

    /// Generate one event for the worker's current iteration.
    ///
    /// When `duplicate_eligible` is set and the worker id is above 1, a 30%
    /// draw replaces the unique id with one of the 100 pooled identifiers
    /// keyed by `worker_id % 100`, so different workers genuinely collide.
    pub fn generate(&mut self, ctx: &WorkerContext, duplicate_eligible: bool) -> SyntheticEvent {
        let event_id = if duplicate_eligible
            && ctx.worker_id > 1
            && self.rng.gen_bool(DUPLICATE_PROBABILITY)
        {
            format!("duplicate-{}", ctx.worker_id % DUPLICATE_POOL_SIZE)
        } else {
            self.new_event_id()
        };

        let now = Utc::now();
        SyntheticEvent {
            topic: TOPICS[self.rng.gen_range(0..TOPICS.len())].to_string(),
            event_id,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            source: format!("fg-worker-{}", ctx.worker_id),
            payload: EventPayload {
                message: format!("Load test event from worker {}", ctx.worker_id),
                level: LEVELS[self.rng.gen_range(0..LEVELS.len())],
                metadata: EventMetadata {
                    iteration: ctx.iteration,
                    worker_id: ctx.worker_id,
                    timestamp_ms: now.timestamp_millis(),
                },
            },
        }
    }

    /// Generate a batch of independently duplicate-eligible events.
    pub fn generate_batch(&mut self, ctx: &WorkerContext, size: usize) -> Vec<SyntheticEvent> {
        (0..size).map(|_| self.generate(ctx, true)).collect()
    }
}
