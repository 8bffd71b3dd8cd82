// Core building blocks for the floodgate load harness
//
// This crate holds everything that does not touch the network: the ramp
// profile model, the synthetic event generator, the concurrent metrics
// collector, the threshold evaluator, and the summary reporter. The worker
// crate drives these against the collaborator API.

pub mod context;
pub mod event;
pub mod metrics;
pub mod stage;
pub mod summary;
pub mod threshold;

pub use context::WorkerContext;
pub use event::{EventGenerator, SyntheticEvent};
pub use metrics::{MetricSample, MetricsCollector, MetricsSnapshot};
pub use stage::{RampProfile, Stage};
pub use summary::{RunMeta, RunSummary};
pub use threshold::{Comparison, ThresholdMetric, ThresholdReport, ThresholdSpec};
