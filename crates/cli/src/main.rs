// Floodgate CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Base URL comes from --base-url or the BASE_URL env var,
// matching how the harness is pointed at an aggregator in CI.
// Design Decision: Threshold failure surfaces as a non-zero exit so the
// invoking harness sees a failed run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use floodgate_client::AggregatorClient;
use floodgate_core::stage::{RampProfile, Stage};
use floodgate_core::summary::RunSummary;
use floodgate_core::threshold::{self, ThresholdSpec};
use floodgate_worker::dispatcher::DispatcherConfig;
use floodgate_worker::scheduler::{SchedulerConfig, StageScheduler};

/// The production ramp profile: up to 200 concurrent workers over 3.5 minutes.
const DEFAULT_STAGES: [&str; 5] = ["30s:50", "1m:100", "30s:200", "1m:200", "30s:0"];

#[derive(Parser)]
#[command(name = "floodgate")]
#[command(about = "Staged load generator for the pub/sub log aggregator")]
#[command(version)]
pub struct Cli {
    /// Aggregator base URL
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Ramp stage as <duration>:<target>, repeatable in order
    #[arg(long = "stage", value_name = "DURATION:TARGET")]
    pub stages: Vec<String>,

    /// Seed for the per-worker event generators
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Where to write the structured summary document
    #[arg(long, default_value = "summary.json")]
    pub summary_out: PathBuf,

    /// Scheduler reconciliation interval in milliseconds
    #[arg(long, default_value_t = 250)]
    pub tick_interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "floodgate=info,floodgate_worker=info,floodgate_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let profile = parse_profile(&cli.stages)?;

    info!(
        base_url = %cli.base_url,
        total_secs = profile.total_duration().as_secs_f64(),
        seed = cli.seed,
        "starting load run"
    );

    let client = AggregatorClient::new(&cli.base_url);
    let scheduler = StageScheduler::new(
        profile,
        SchedulerConfig {
            tick_interval: Duration::from_millis(cli.tick_interval_ms),
            seed: cli.seed,
        },
    );
    let report = scheduler.run(&client, DispatcherConfig::default()).await;

    let summary = RunSummary::build(&report.meta, &report.snapshot);
    println!("{}", summary.render_text());

    let outcome = threshold::evaluate(&ThresholdSpec::defaults(), &report.snapshot);
    for result in &outcome.results {
        println!("threshold: {result}");
    }

    // The archival document is written regardless of the verdict; a write
    // failure is logged but never changes the outcome.
    match summary.to_json() {
        Ok(doc) => match std::fs::write(&cli.summary_out, doc) {
            Ok(()) => info!(path = %cli.summary_out.display(), "summary written"),
            Err(err) => warn!(
                path = %cli.summary_out.display(),
                error = %err,
                "failed to write summary document"
            ),
        },
        Err(err) => warn!(error = %err, "failed to serialize summary document"),
    }

    if !outcome.passed {
        anyhow::bail!("thresholds not met: {}", outcome.failed_metrics().join(", "));
    }
    Ok(())
}

fn parse_profile(stages: &[String]) -> anyhow::Result<RampProfile> {
    let texts: Vec<&str> = if stages.is_empty() {
        DEFAULT_STAGES.to_vec()
    } else {
        stages.iter().map(String::as_str).collect()
    };
    let stages = texts
        .iter()
        .map(|text| {
            text.parse::<Stage>()
                .map_err(|err| anyhow::anyhow!(err))
                .with_context(|| format!("invalid --stage '{text}'"))
        })
        .collect::<anyhow::Result<Vec<Stage>>>()?;
    Ok(RampProfile::new(stages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_matches_the_production_ramp() {
        let profile = parse_profile(&[]).unwrap();
        assert_eq!(profile.stages().len(), 5);
        assert_eq!(profile.total_duration(), Duration::from_secs(210));
        assert_eq!(profile.stages()[2].target, 200);
    }

    #[test]
    fn explicit_stages_override_the_default() {
        let profile = parse_profile(&["10s:5".to_string(), "5s:0".to_string()]).unwrap();
        assert_eq!(profile.stages().len(), 2);
        assert_eq!(profile.total_duration(), Duration::from_secs(15));
    }

    #[test]
    fn invalid_stage_text_is_rejected() {
        assert!(parse_profile(&["nope".to_string()]).is_err());
    }
}
