// HTTP client for the pub/sub log aggregator under test
//
// The aggregator is an external collaborator: this crate only speaks its
// documented surface (publish / stats / recent events) and maps transport,
// API, and decode failures into one error type the dispatcher can fold into
// check results.

mod client;
mod types;

pub use client::{AggregatorClient, ClientError};
pub use types::{EventsResponse, PublishResponse, StatsResponse};
