//! Single-axis episode: one cart, one track.

use dynamics::{rk4, Cart};

use crate::config::EnvConfig;
use crate::error::{ConfigError, EvalError};
use crate::jiggle::JiggleBuffer;
use crate::policy::Policy;
use crate::telemetry::TelemetryLog;
use crate::{
    action_to_force, validate_action, Evaluation, Outcome, CART_VELOCITY_SCALE, JIGGLE_WINDOW,
    TIME_DELTA,
};

/// Pole balancing on a single bounded track. The policy sees one position
/// group per tick and answers with one action value.
pub struct PoleBalanceEnv {
    cfg: EnvConfig,
}

impl PoleBalanceEnv {
    /// Build an environment over a validated configuration.
    ///
    /// # Errors
    ///
    /// Fatal configuration problems; no episode runs.
    pub fn new(cfg: EnvConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.cfg
    }

    /// Run one episode of `policy` against a fresh cart.
    ///
    /// # Errors
    ///
    /// Policy failures and malformed action vectors abort the episode.
    pub fn evaluate(&self, policy: &mut dyn Policy) -> Result<Evaluation, EvalError> {
        self.run(policy, None)
    }

    /// Like [`evaluate`](Self::evaluate), tracing every tick to a CSV log.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate), plus telemetry write failures.
    pub fn evaluate_logged(
        &self,
        policy: &mut dyn Policy,
        log: &mut TelemetryLog,
    ) -> Result<Evaluation, EvalError> {
        self.run(policy, Some(log))
    }

    fn run(
        &self,
        policy: &mut dyn Policy,
        mut log: Option<&mut TelemetryLog>,
    ) -> Result<Evaluation, EvalError> {
        let cfg = &self.cfg;
        let mut cart = self.initial_cart();
        let mut step = 0;
        let mut jiggle = (!cfg.include_velocity).then(|| JiggleBuffer::new(JIGGLE_WINDOW));

        let mut failure = self.check(&cart);
        while step < cfg.max_steps && failure.is_none() {
            if let Some(log) = log.as_deref_mut() {
                log.record(&state_line(&cart))?;
            }

            let observation = self.observe(&cart);
            let action = policy
                .activate(&observation)
                .map_err(|source| EvalError::Policy { step, source })?;
            validate_action(&action, 1, step)?;

            self.apply(&mut cart, action[0]);

            if let Some(jiggle) = jiggle.as_mut() {
                jiggle.enqueue(state_magnitude(&cart));
            }

            step += 1;
            failure = self.check(&cart);
        }

        let outcome = failure.unwrap_or(Outcome::Balanced);
        let fitness = self.fitness(step, &cart, jiggle.as_ref());
        tracing::debug!(steps = step, fitness, ?outcome, "episode finished");

        Ok(Evaluation {
            fitness,
            steps: step,
            outcome,
            behaviour: state_line(&cart),
        })
    }

    fn initial_cart(&self) -> Cart {
        let cfg = &self.cfg;
        Cart::new(
            cfg.cart_mass,
            cfg.cart_friction,
            cfg.initial.cart_position[0],
            cfg.initial.cart_velocity[0],
            cfg.initial_poles(),
        )
    }

    fn observe(&self, cart: &Cart) -> Vec<f64> {
        let cfg = &self.cfg;
        let half_track = cfg.track_length * 0.5;
        let position = cart.zero_order();

        if cfg.include_velocity {
            let velocity = cart.first_order();
            let mut observation = Vec::with_capacity(2 + 2 * cart.pole_count());
            observation.push(position.cart / half_track);
            observation.push(velocity.cart / CART_VELOCITY_SCALE);
            for i in 0..cart.pole_count() {
                observation.push(position.poles[i] / cfg.pole_angle_threshold);
                observation.push(velocity.poles[i]);
            }
            observation
        } else {
            let mut observation = Vec::with_capacity(1 + cart.pole_count());
            observation.push(position.cart / half_track);
            for i in 0..cart.pole_count() {
                observation.push(position.poles[i] / cfg.pole_angle_threshold);
            }
            observation
        }
    }

    fn apply(&self, cart: &mut Cart, action: f64) {
        let force = action_to_force(action);
        for _ in 0..2 {
            let first = cart.first_order();
            let second = cart.second_order(force, self.cfg.gravity);
            rk4(force, cart, &first, &second, self.cfg.gravity, TIME_DELTA);
        }
    }

    fn check(&self, cart: &Cart) -> Option<Outcome> {
        let cfg = &self.cfg;
        if !cart.on_track(cfg.track_length) {
            return Some(Outcome::CartOffTrack);
        }
        if cart
            .poles
            .iter()
            .any(|p| !p.upright(cfg.pole_angle_threshold))
        {
            return Some(Outcome::PoleFell);
        }
        None
    }

    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn fitness(&self, steps: usize, cart: &Cart, jiggle: Option<&JiggleBuffer>) -> f64 {
        let cfg = &self.cfg;
        let f1 = steps as f64 / cfg.max_steps as f64;
        if steps >= cfg.max_steps {
            return f1;
        }

        let mut fitness = if cfg.include_velocity {
            f1
        } else {
            let f2 = match jiggle {
                Some(buffer) if steps >= JIGGLE_WINDOW => 0.75 / buffer.total(),
                _ => 0.0,
            };
            cfg.survival_weight * f1 + (1.0 - cfg.survival_weight) * f2
        };

        let factor = steps as f64 / (cfg.max_steps as f64 * 2.0);
        let distance_error = factor * (cart.position / (cfg.track_length * 2.0)).powi(2);
        if distance_error < fitness && fitness != 1.0 {
            fitness -= distance_error;
        }
        fitness
    }
}

fn state_line(cart: &Cart) -> Vec<f64> {
    let mut line = Vec::with_capacity(1 + cart.pole_count());
    line.push(cart.position);
    for pole in &cart.poles {
        line.push(pole.angle);
    }
    line
}

/// Sum of absolute cart position, primary pole angle, cart velocity, and
/// primary pole angular velocity: the per-tick jiggle sample.
fn state_magnitude(cart: &Cart) -> f64 {
    cart.position.abs()
        + cart.poles[0].angle.abs()
        + cart.velocity.abs()
        + cart.poles[0].angular_velocity.abs()
}

#[cfg(test)]
mod tests {
    use super::PoleBalanceEnv;
    use crate::config::{EnvConfig, InitialState};

    fn test_config() -> EnvConfig {
        EnvConfig {
            track_length: 4.8,
            gravity: -9.8,
            max_steps: 500,
            pole_angle_threshold: 0.2094,
            include_velocity: true,
            cart_mass: 1.0,
            cart_friction: 0.0,
            pole_count: 1,
            pole_mass: 0.1,
            pole_length: 0.5,
            pole_friction: 0.0,
            initial: InitialState::default(),
            survival_weight: 0.1,
        }
    }

    #[test]
    fn half_survival_with_centred_cart_scores_half() {
        let env = PoleBalanceEnv::new(test_config()).unwrap();
        let cart = env.initial_cart();
        assert_eq!(env.fitness(250, &cart, None), 0.5);
    }

    #[test]
    fn full_survival_scores_one_regardless_of_position() {
        let env = PoleBalanceEnv::new(test_config()).unwrap();
        let mut cart = env.initial_cart();
        cart.position = 1.9;
        assert_eq!(env.fitness(500, &cart, None), 1.0);
    }

    #[test]
    fn observation_layout_with_velocity() {
        let mut cfg = test_config();
        cfg.initial.cart_position[0] = 1.2;
        cfg.initial.pole_angle = 0.1047;
        let env = PoleBalanceEnv::new(cfg).unwrap();
        let cart = env.initial_cart();

        let observation = env.observe(&cart);
        assert_eq!(observation.len(), 4);
        assert!((observation[0] - 0.5).abs() < 1e-12);
        assert_eq!(observation[1], 0.0);
        assert!((observation[2] - 0.1047 / 0.2094).abs() < 1e-12);
        assert_eq!(observation[3], 0.0);
    }

    #[test]
    fn observation_layout_without_velocity() {
        let mut cfg = test_config();
        cfg.include_velocity = false;
        let env = PoleBalanceEnv::new(cfg).unwrap();
        let cart = env.initial_cart();
        assert_eq!(env.observe(&cart).len(), 2);
    }
}
