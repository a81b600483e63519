//! Error taxonomy: fatal configuration problems and episode aborts.

use std::io;

use thiserror::Error;

/// Fatal problems with the flat key/value configuration. Detected before any
/// episode runs; none of these are recoverable at runtime.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing property `{0}`")]
    Missing(String),

    #[error("property `{key}` has unparseable value `{value}`")]
    Invalid { key: String, value: String },

    #[error("property `{0}` must be strictly positive")]
    NotPositive(String),

    #[error("property `{0}` must not be negative")]
    Negative(String),

    #[error("property `{0}` must lie in [0, 1]")]
    OutsideUnitRange(String),
}

/// Reasons a single episode evaluation aborts. An aborted episode produces
/// no fitness value; it is reported to the caller, never scored as zero.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The policy collaborator failed outright.
    #[error("policy failed at step {step}")]
    Policy {
        step: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The policy returned the wrong number of action values.
    #[error("policy returned {got} action values at step {step}, expected {expected}")]
    ActionArity {
        step: usize,
        expected: usize,
        got: usize,
    },

    /// The policy returned NaN or infinity.
    #[error("policy returned a non-finite action value at step {step}")]
    NonFiniteAction { step: usize },

    /// Telemetry output could not be written.
    #[error("telemetry write failed")]
    Telemetry(#[from] io::Error),
}
