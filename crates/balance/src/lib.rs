#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Pole balancing episode evaluation
//!
//! Scores how long a control policy keeps one or more poles upright and a
//! cart on its track. Each evaluation builds a fresh environment from an
//! [`EnvConfig`], runs a single episode against a [`Policy`], and returns a
//! scalar fitness in `[0, 1]` for an outer optimizer.
//!
//! Two environments exist: [`PoleBalanceEnv`] drives one cart on one track,
//! [`PlanarBalanceEnv`] drives two independent carts, one per horizontal
//! axis, sharing only the pole count and the episode clock. The physics
//! itself lives in the `dynamics` crate; this crate owns the episode loop,
//! observation encoding, termination predicates, and fitness.
//!
//! Evaluations share no mutable state: every cart, pole, and derivative is
//! exclusively owned by one episode, so callers may run evaluations
//! concurrently without synchronization.

pub mod config;
pub mod error;
pub mod jiggle;
pub mod planar;
pub mod policy;
pub mod single;
pub mod telemetry;

pub use config::EnvConfig;
pub use error::{ConfigError, EvalError};
pub use planar::PlanarBalanceEnv;
pub use policy::{ConstantPolicy, Policy, PolicyError};
pub use single::PoleBalanceEnv;

/// Integration step for one RK4 sub-step. Every environment tick advances
/// two of these.
pub const TIME_DELTA: f64 = 0.01;

/// Peak magnitude of the force an action can apply to a cart.
pub const FORCE_MAG: f64 = 10.0;

/// Normalizing divisor for cart velocity observations.
pub(crate) const CART_VELOCITY_SCALE: f64 = 0.75;

/// Ticks in the rolling jiggle window; the stillness term stays zero until
/// the window has filled once.
pub(crate) const JIGGLE_WINDOW: usize = 100;

/// Map an action value to the force applied to a cart: `0.5` is zero force,
/// the extremes of `[0, 1]` are full force either way.
#[must_use]
pub fn action_to_force(action: f64) -> f64 {
    (action - 0.5) * FORCE_MAG * 2.0
}

/// How one episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The step budget ran out with everything still in envelope.
    Balanced,
    /// A cart left the track.
    CartOffTrack,
    /// A pole passed the failure angle.
    PoleFell,
}

/// Result of evaluating one policy for one episode.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// Scalar score handed back to the outer optimizer.
    pub fitness: f64,
    /// Ticks survived before termination or budget exhaustion.
    pub steps: usize,
    /// Which terminal condition ended the episode.
    pub outcome: Outcome,
    /// Terminal cart positions followed by per-pole angles, the same fields
    /// as one telemetry line. Opaque hook for downstream
    /// diversity-preservation mechanisms.
    pub behaviour: Vec<f64>,
}

pub(crate) fn validate_action(
    action: &[f64],
    expected: usize,
    step: usize,
) -> Result<(), EvalError> {
    if action.len() != expected {
        return Err(EvalError::ActionArity {
            step,
            expected,
            got: action.len(),
        });
    }
    if action.iter().any(|a| !a.is_finite()) {
        return Err(EvalError::NonFiniteAction { step });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::action_to_force;

    #[test]
    fn centre_action_applies_no_force() {
        assert_eq!(action_to_force(0.5), 0.0);
    }

    #[test]
    fn extreme_actions_apply_full_force() {
        assert_eq!(action_to_force(1.0), 10.0);
        assert_eq!(action_to_force(0.0), -10.0);
    }
}
