// Wire types for the aggregator's documented responses

use serde::Deserialize;

/// `POST /publish` response. `received` counts the events the aggregator
/// accepted from this request.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishResponse {
    pub status: String,
    pub received: u64,
}

/// `GET /stats` response. Extra fields the aggregator may add are ignored;
/// the three counters below are the required numeric shape.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub received: u64,
    pub unique_processed: u64,
    pub duplicate_dropped: u64,
}

/// `GET /events?limit=N` response.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<serde_json::Value>,
}
