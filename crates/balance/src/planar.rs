//! Two-axis episode: two independent track/cart systems, one per horizontal
//! axis, sharing only the pole count and the episode clock.

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

/// The two per-axis sub-systems. Derivatives are computed per axis and the
/// axes never couple; only the observation vector and the episode clock see
/// both.
struct PlanarCart {
    x: Cart,
    y: Cart,
}

impl PlanarCart {
    fn pole_count(&self) -> usize {
        self.x.pole_count()
    }
}

/// Pole balancing over two independent horizontal axes. The policy sees
/// paired X/Y groups per tick and answers with one action value per axis.
pub struct PlanarBalanceEnv {
    cfg: EnvConfig,
}

impl PlanarBalanceEnv {
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

    /// Run one episode of `policy` against a fresh cart pair.
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
            validate_action(&action, 2, step)?;

            self.apply(&mut cart, action[0], action[1]);

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

    /// Both axes start from the same configured pole stack; the initial
    /// angle applies to the primary pole of each axis.
    fn initial_cart(&self) -> PlanarCart {
        let cfg = &self.cfg;
        PlanarCart {
            x: Cart::new(
                cfg.cart_mass,
                cfg.cart_friction,
                cfg.initial.cart_position[0],
                cfg.initial.cart_velocity[0],
                cfg.initial_poles(),
            ),
            y: Cart::new(
                cfg.cart_mass,
                cfg.cart_friction,
                cfg.initial.cart_position[1],
                cfg.initial.cart_velocity[1],
                cfg.initial_poles(),
            ),
        }
    }

    fn observe(&self, cart: &PlanarCart) -> Vec<f64> {
        let cfg = &self.cfg;
        let half_track = cfg.track_length * 0.5;
        let position = [cart.x.zero_order(), cart.y.zero_order()];

        if cfg.include_velocity {
            let velocity = [cart.x.first_order(), cart.y.first_order()];
            let mut observation = Vec::with_capacity(4 + 4 * cart.pole_count());
            observation.push(position[0].cart / half_track);
            observation.push(position[1].cart / half_track);
            observation.push(velocity[0].cart / CART_VELOCITY_SCALE);
            observation.push(velocity[1].cart / CART_VELOCITY_SCALE);
            for i in 0..cart.pole_count() {
                observation.push(position[0].poles[i] / cfg.pole_angle_threshold);
                observation.push(position[1].poles[i] / cfg.pole_angle_threshold);
                observation.push(velocity[0].poles[i]);
                observation.push(velocity[1].poles[i]);
            }
            observation
        } else {
            let mut observation = Vec::with_capacity(2 + 2 * cart.pole_count());
            observation.push(position[0].cart / half_track);
            observation.push(position[1].cart / half_track);
            for i in 0..cart.pole_count() {
                observation.push(position[0].poles[i] / cfg.pole_angle_threshold);
                observation.push(position[1].poles[i] / cfg.pole_angle_threshold);
            }
            observation
        }
    }

    fn apply(&self, cart: &mut PlanarCart, action_x: f64, action_y: f64) {
        let force_x = action_to_force(action_x);
        let force_y = action_to_force(action_y);
        let gravity = self.cfg.gravity;

        for _ in 0..2 {
            let first_x = cart.x.first_order();
            let first_y = cart.y.first_order();
            let second_x = cart.x.second_order(force_x, gravity);
            let second_y = cart.y.second_order(force_y, gravity);
            rk4(force_x, &mut cart.x, &first_x, &second_x, gravity, TIME_DELTA);
            rk4(force_y, &mut cart.y, &first_y, &second_y, gravity, TIME_DELTA);
        }
    }

    fn check(&self, cart: &PlanarCart) -> Option<Outcome> {
        let cfg = &self.cfg;
        if !cart.x.on_track(cfg.track_length) || !cart.y.on_track(cfg.track_length) {
            return Some(Outcome::CartOffTrack);
        }
        let fallen = cart
            .x
            .poles
            .iter()
            .zip(&cart.y.poles)
            .any(|(px, py)| {
                !px.upright(cfg.pole_angle_threshold) || !py.upright(cfg.pole_angle_threshold)
            });
        if fallen {
            return Some(Outcome::PoleFell);
        }
        None
    }

    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn fitness(&self, steps: usize, cart: &PlanarCart, jiggle: Option<&JiggleBuffer>) -> f64 {
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
        let distance_error = factor
            * ((cart.x.position + cart.y.position) / (cfg.track_length * 2.0)).powi(2);
        if distance_error < fitness && fitness != 1.0 {
            fitness -= distance_error;
        }
        fitness
    }
}

fn state_line(cart: &PlanarCart) -> Vec<f64> {
    let mut line = Vec::with_capacity(2 + 2 * cart.pole_count());
    line.push(cart.x.position);
    line.push(cart.y.position);
    for (px, py) in cart.x.poles.iter().zip(&cart.y.poles) {
        line.push(px.angle);
        line.push(py.angle);
    }
    line
}

/// Sum of absolute cart positions, primary pole angles, cart velocities,
/// and primary pole angular velocities over both axes: the per-tick jiggle
/// sample.
fn state_magnitude(cart: &PlanarCart) -> f64 {
    cart.x.position.abs()
        + cart.y.position.abs()
        + cart.x.poles[0].angle.abs()
        + cart.y.poles[0].angle.abs()
        + cart.x.velocity.abs()
        + cart.y.velocity.abs()
        + cart.x.poles[0].angular_velocity.abs()
        + cart.y.poles[0].angular_velocity.abs()
}

#[cfg(test)]
mod tests {
    use super::PlanarBalanceEnv;
    use crate::config::{EnvConfig, InitialState};
    use crate::jiggle::JiggleBuffer;
    use crate::JIGGLE_WINDOW;

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
    fn half_survival_with_centred_carts_scores_half() {
        let env = PlanarBalanceEnv::new(test_config()).unwrap();
        let cart = env.initial_cart();
        assert_eq!(env.fitness(250, &cart, None), 0.5);
    }

    #[test]
    fn off_centre_drift_is_penalized() {
        let env = PlanarBalanceEnv::new(test_config()).unwrap();
        let mut cart = env.initial_cart();
        cart.x.position = 1.0;
        cart.y.position = 1.0;

        let factor = 250.0 / 1000.0;
        let expected_penalty = factor * (2.0 / 9.6_f64).powi(2);
        let fitness = env.fitness(250, &cart, None);
        assert!((fitness - (0.5 - expected_penalty)).abs() < 1e-12);
    }

    #[test]
    fn stillness_term_blends_when_velocity_is_excluded() {
        let mut cfg = test_config();
        cfg.include_velocity = false;
        let env = PlanarBalanceEnv::new(cfg).unwrap();
        let cart = env.initial_cart();

        let mut jiggle = JiggleBuffer::new(JIGGLE_WINDOW);
        for _ in 0..JIGGLE_WINDOW {
            jiggle.enqueue(0.03);
        }

        // f1 = 0.3, f2 = 0.75 / 3.0 = 0.25.
        let fitness = env.fitness(150, &cart, Some(&jiggle));
        assert!((fitness - (0.1 * 0.3 + 0.9 * 0.25)).abs() < 1e-12);
    }

    #[test]
    fn stillness_term_is_zero_before_the_window_fills() {
        let mut cfg = test_config();
        cfg.include_velocity = false;
        let env = PlanarBalanceEnv::new(cfg).unwrap();
        let cart = env.initial_cart();

        let mut jiggle = JiggleBuffer::new(JIGGLE_WINDOW);
        for _ in 0..50 {
            jiggle.enqueue(0.03);
        }

        let fitness = env.fitness(50, &cart, Some(&jiggle));
        assert!((fitness - 0.1 * 0.1).abs() < 1e-12);
    }

    #[test]
    fn observation_interleaves_axes() {
        let mut cfg = test_config();
        cfg.initial.cart_position = [1.2, -1.2];
        cfg.initial.pole_angle = 0.1047;
        let env = PlanarBalanceEnv::new(cfg).unwrap();
        let cart = env.initial_cart();

        let observation = env.observe(&cart);
        assert_eq!(observation.len(), 8);
        assert!((observation[0] - 0.5).abs() < 1e-12);
        assert!((observation[1] + 0.5).abs() < 1e-12);
        assert_eq!(observation[2], 0.0);
        assert_eq!(observation[3], 0.0);
        assert!((observation[4] - 0.1047 / 0.2094).abs() < 1e-12);
        assert!((observation[5] - 0.1047 / 0.2094).abs() < 1e-12);
    }
}
