// In-process stub of the aggregator collaborator
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Default)]
pub struct StubCounters {
    pub publishes: AtomicU64,
    pub stats_polls: AtomicU64,
    pub listing_polls: AtomicU64,
}

impl StubCounters {
    pub fn publishes(&self) -> u64 {
        self.publishes.load(Ordering::Relaxed)
    }

    pub fn stats_polls(&self) -> u64 {
        self.stats_polls.load(Ordering::Relaxed)
    }

    pub fn listing_polls(&self) -> u64 {
        self.listing_polls.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
struct StubState {
    counters: Arc<StubCounters>,
    /// When set, batch publishes report this count instead of the real one.
    batch_received_override: Option<u64>,
}

/// Serve a well-behaved aggregator stub on an ephemeral port. Returns its
/// base URL and the request counters.
pub async fn start_stub(batch_received_override: Option<u64>) -> (String, Arc<StubCounters>) {
    let counters = Arc::new(StubCounters::default());
    let state = StubState {
        counters: counters.clone(),
        batch_received_override,
    };
    let app = Router::new()
        .route("/publish", post(publish))
        .route("/stats", get(stats))
        .route("/events", get(events))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), counters)
}

/// An address nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn publish(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    state.counters.publishes.fetch_add(1, Ordering::Relaxed);
    let received = match body.get("events") {
        Some(Value::Array(events)) => state
            .batch_received_override
            .unwrap_or(events.len() as u64),
        _ => 1,
    };
    Json(json!({ "status": "accepted", "received": received }))
}

async fn stats(State(state): State<StubState>) -> Json<Value> {
    state.counters.stats_polls.fetch_add(1, Ordering::Relaxed);
    Json(json!({
        "received": 100,
        "unique_processed": 70,
        "duplicate_dropped": 30,
    }))
}

async fn events(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.counters.listing_polls.fetch_add(1, Ordering::Relaxed);
    let limit = params
        .get("limit")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(10);
    let events: Vec<Value> = (0..limit.min(3))
        .map(|i| json!({ "event_id": format!("e-{i}") }))
        .collect();
    Json(json!({ "events": events }))
}
