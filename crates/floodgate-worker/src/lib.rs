// Worker lifecycle for the floodgate load harness
//
// A run is a set of tokio worker tasks reconciled against a ramp profile by
// the stage scheduler. Each worker repeatedly executes the dispatcher's
// fixed request/check sequence against the aggregator and feeds the shared
// metrics collector.

pub mod dispatcher;
pub mod scheduler;
pub mod worker;

pub use dispatcher::DispatcherConfig;
pub use scheduler::{RunReport, SchedulerConfig, StageScheduler};
pub use worker::{spawn_worker, WorkerHandle};
