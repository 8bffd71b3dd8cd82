// Staged ramp profile: piecewise-linear concurrency over wall-clock time

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One ramp segment: concurrency moves linearly from its value at segment
/// start toward `target` over `duration`. `target` equal to the current
/// value yields a flat hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

impl FromStr for Stage {
    type Err = String;

    /// Parses `"<duration>:<target>"`, e.g. `30s:50`, `1m:100`, `500ms:7`.
    /// A bare number is taken as seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (duration, target) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <duration>:<target>, got '{s}'"))?;
        let duration = parse_duration(duration.trim())?;
        let target: u32 = target
            .trim()
            .parse()
            .map_err(|_| format!("invalid stage target '{target}'"))?;
        Ok(Self { duration, target })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.duration.as_millis();
        if ms % 60_000 == 0 {
            write!(f, "{}m:{}", ms / 60_000, self.target)
        } else if ms % 1_000 == 0 {
            write!(f, "{}s:{}", ms / 1_000, self.target)
        } else {
            write!(f, "{}ms:{}", ms, self.target)
        }
    }
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let (number, unit) = match s {
        _ if s.ends_with("ms") => (&s[..s.len() - 2], 1u64),
        _ if s.ends_with('s') => (&s[..s.len() - 1], 1_000),
        _ if s.ends_with('m') => (&s[..s.len() - 1], 60_000),
        _ => (s, 1_000),
    };
    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{s}'"))?;
    Ok(Duration::from_millis(value * unit))
}

/// Ordered stage sequence; immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RampProfile {
    stages: Vec<Stage>,
}

impl RampProfile {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|stage| stage.duration).sum()
    }

    /// Desired concurrency at `elapsed` into the run.
    ///
    /// Within a stage the value is interpolated linearly from the previous
    /// stage's target (0 before the first stage) toward the stage target,
    /// rounded to the nearest integer. Past the end of the profile the final
    /// target holds.
    pub fn concurrency_at(&self, elapsed: Duration) -> u32 {
        let mut start_value = 0u32;
        let mut offset = Duration::ZERO;
        for stage in &self.stages {
            let end = offset + stage.duration;
            if elapsed < end {
                if stage.duration.is_zero() {
                    return stage.target;
                }
                let fraction =
                    (elapsed - offset).as_secs_f64() / stage.duration.as_secs_f64();
                let value = start_value as f64
                    + (stage.target as f64 - start_value as f64) * fraction;
                return value.round() as u32;
            }
            start_value = stage.target;
            offset = end;
        }
        start_value
    }
}
