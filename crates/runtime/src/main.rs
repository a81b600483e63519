#![deny(clippy::all, clippy::pedantic)]
//! # Episode runner
//!
//! Loads an environment configuration, runs a single pole balancing episode
//! against a baseline policy, and prints the resulting fitness. Useful for
//! smoke-testing configurations and for producing CSV traces without an
//! outer optimizer in the loop.
//!
//! Configurations come either as flat `key=value` properties files or as
//! JSON documents, selected by file extension.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use balance::telemetry::TelemetryLog;
use balance::{
    ConstantPolicy, EnvConfig, Evaluation, PlanarBalanceEnv, PoleBalanceEnv, Policy, PolicyError,
};

/// Run one pole balancing episode against a baseline policy.
#[derive(Parser)]
struct Args {
    /// Properties (`key=value`) or JSON configuration file.
    config: PathBuf,

    /// Number of control axes to simulate.
    #[arg(long, default_value_t = 2)]
    axes: usize,

    /// Baseline policy: `centre` holds zero force, `random` samples actions.
    #[arg(long, default_value = "centre")]
    policy: String,

    /// Seed for the random baseline.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Optional per-tick CSV trace file.
    #[arg(long)]
    trace: Option<PathBuf>,
}

/// Baseline that samples every action uniformly from `[0, 1)`.
struct RandomPolicy {
    axes: usize,
}

impl Policy for RandomPolicy {
    fn activate(&mut self, _observation: &[f64]) -> Result<Vec<f64>, PolicyError> {
        Ok((0..self.axes).map(|_| fastrand::f64()).collect())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cfg = load_config(&args.config)?;
    fastrand::seed(args.seed);

    let mut policy: Box<dyn Policy> = match args.policy.as_str() {
        "centre" => Box::new(ConstantPolicy::new(vec![0.5; args.axes])),
        "random" => Box::new(RandomPolicy { axes: args.axes }),
        other => bail!("unknown baseline policy `{other}`"),
    };

    tracing::info!(
        axes = args.axes,
        max_steps = cfg.max_steps,
        policy = %args.policy,
        "starting episode"
    );

    let evaluation = match args.axes {
        1 => run_single(cfg, policy.as_mut(), args.trace.as_deref())?,
        2 => run_planar(cfg, policy.as_mut(), args.trace.as_deref())?,
        other => bail!("unsupported axis count {other}, expected 1 or 2"),
    };

    tracing::info!(
        steps = evaluation.steps,
        outcome = ?evaluation.outcome,
        fitness = evaluation.fitness,
        "episode finished"
    );
    println!("{}", evaluation.fitness);
    Ok(())
}

fn run_single(cfg: EnvConfig, policy: &mut dyn Policy, trace: Option<&Path>) -> Result<Evaluation> {
    let env = PoleBalanceEnv::new(cfg)?;
    match trace {
        Some(path) => {
            let mut log = TelemetryLog::create(path)
                .with_context(|| format!("opening trace file {}", path.display()))?;
            let evaluation = env.evaluate_logged(policy, &mut log)?;
            log.finish()?;
            Ok(evaluation)
        }
        None => Ok(env.evaluate(policy)?),
    }
}

fn run_planar(cfg: EnvConfig, policy: &mut dyn Policy, trace: Option<&Path>) -> Result<Evaluation> {
    let env = PlanarBalanceEnv::new(cfg)?;
    match trace {
        Some(path) => {
            let mut log = TelemetryLog::create(path)
                .with_context(|| format!("opening trace file {}", path.display()))?;
            let evaluation = env.evaluate_logged(policy, &mut log)?;
            log.finish()?;
            Ok(evaluation)
        }
        None => Ok(env.evaluate(policy)?),
    }
}

fn load_config(path: &Path) -> Result<EnvConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        let cfg: EnvConfig = serde_json::from_str(&text).context("parsing JSON configuration")?;
        cfg.validate()?;
        Ok(cfg)
    } else {
        let props = parse_properties(&text);
        Ok(EnvConfig::from_props(&props)?)
    }
}

/// Flat `key=value` lines; `#` and `!` start comments, blank lines are
/// skipped.
fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            props.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::parse_properties;

    #[test]
    fn properties_parsing_skips_comments_and_blanks() {
        let text = "\n# comment\n! also a comment\nfitness.environment.gravity = -9.8\n";
        let props = parse_properties(text);
        assert_eq!(props.len(), 1);
        assert_eq!(
            props.get("fitness.environment.gravity").map(String::as_str),
            Some("-9.8")
        );
    }
}
