//! Cart state and the aggregation of pole contributions.

use crate::derivatives::StateDerivative;
use crate::pole::Pole;

/// A cart on a bounded track with an ordered stack of poles hinged to it.
/// Index 0 is the primary pole.
///
/// The cart owns its poles exclusively; `Clone` is a deep copy, so a cloned
/// cart shares no mutable state with the original. The RK4 step relies on
/// this to evaluate trial states without perturbing the caller's cart.
#[derive(Clone, Debug)]
pub struct Cart {
    pub mass: f64,
    pub friction: f64,
    pub position: f64,
    pub velocity: f64,
    pub poles: Vec<Pole>,
}

impl Cart {
    #[must_use]
    pub fn new(mass: f64, friction: f64, position: f64, velocity: f64, poles: Vec<Pole>) -> Self {
        Self {
            mass,
            friction,
            position,
            velocity,
            poles,
        }
    }

    #[must_use]
    pub fn pole_count(&self) -> usize {
        self.poles.len()
    }

    /// Position view: cart position plus every pole angle.
    #[must_use]
    pub fn zero_order(&self) -> StateDerivative {
        StateDerivative::new(self.position, self.poles.iter().map(|p| p.angle).collect())
    }

    /// Velocity view: cart velocity plus every pole angular velocity.
    #[must_use]
    pub fn first_order(&self) -> StateDerivative {
        StateDerivative::new(
            self.velocity,
            self.poles.iter().map(|p| p.angular_velocity).collect(),
        )
    }

    /// Acceleration view under an external force.
    ///
    /// Two passes, in this order: every pole's effective force and mass are
    /// aggregated into the shared cart acceleration, then that acceleration
    /// is distributed back into each pole's angular acceleration.
    #[must_use]
    pub fn second_order(&self, force: f64, gravity: f64) -> StateDerivative {
        let mut effective_force = 0.0;
        let mut effective_mass = 0.0;
        for pole in &self.poles {
            effective_force += pole.effective_force(gravity);
            effective_mass += pole.effective_mass();
        }

        let cart_acceleration = (force + effective_force) / (effective_mass + self.mass);

        let pole_accelerations = self
            .poles
            .iter()
            .map(|p| p.second_order(cart_acceleration, gravity))
            .collect();
        StateDerivative::new(cart_acceleration, pole_accelerations)
    }

    /// Advance the cart and every pole by one explicit step.
    ///
    /// # Panics
    ///
    /// Panics if either derivative is not index-aligned with the poles.
    pub fn advance(
        &mut self,
        first_order: &StateDerivative,
        second_order: &StateDerivative,
        step: f64,
    ) {
        assert_eq!(
            first_order.poles.len(),
            self.poles.len(),
            "derivative pole counts differ"
        );
        assert_eq!(
            second_order.poles.len(),
            self.poles.len(),
            "derivative pole counts differ"
        );

        self.position += first_order.cart * step;
        self.velocity += second_order.cart * step;

        for (i, pole) in self.poles.iter_mut().enumerate() {
            pole.advance(first_order.poles[i], second_order.poles[i], step);
        }
    }

    /// Whether the cart is still strictly inside the track. A position
    /// exactly at half the track length is off the track.
    #[must_use]
    pub fn on_track(&self, track_length: f64) -> bool {
        self.position > -track_length * 0.5 && self.position < track_length * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::Cart;
    use crate::pole::Pole;

    fn single_pole_cart() -> Cart {
        Cart::new(1.0, 0.0, 0.0, 0.0, vec![Pole::new(0.5, 0.1, 0.0, 0.0, 0.0)])
    }

    #[test]
    fn cloned_cart_shares_no_state() {
        let original = single_pole_cart();
        let mut copy = original.clone();
        copy.position = 1.5;
        copy.velocity = -0.5;
        copy.poles[0].angle = 0.3;
        copy.poles[0].angular_velocity = 2.0;

        assert_eq!(original.position, 0.0);
        assert_eq!(original.velocity, 0.0);
        assert_eq!(original.poles[0].angle, 0.0);
        assert_eq!(original.poles[0].angular_velocity, 0.0);
    }

    #[test]
    fn second_order_aggregates_then_distributes() {
        // Upright resting pole: effective force 0, effective mass m/4.
        let cart = single_pole_cart();
        let accel = cart.second_order(1.0, -9.8);

        let expected_cart = 1.0 / (0.025 + 1.0);
        assert!((accel.cart - expected_cart).abs() < 1e-12);
        let expected_pole = -0.75 * expected_cart / 0.5;
        assert!((accel.poles[0] - expected_pole).abs() < 1e-12);
    }

    #[test]
    fn on_track_bounds_are_strict() {
        let mut cart = single_pole_cart();
        cart.position = 2.4;
        assert!(!cart.on_track(4.8));
        cart.position = -2.4;
        assert!(!cart.on_track(4.8));
        cart.position = 2.4 - 1e-9;
        assert!(cart.on_track(4.8));
    }

    #[test]
    fn state_views_are_index_aligned() {
        let mut cart = single_pole_cart();
        cart.position = 0.7;
        cart.velocity = -0.2;
        cart.poles[0].angle = 0.05;
        cart.poles[0].angular_velocity = 1.1;

        let position = cart.zero_order();
        let velocity = cart.first_order();
        assert_eq!(position.cart, 0.7);
        assert_eq!(position.poles, vec![0.05]);
        assert_eq!(velocity.cart, -0.2);
        assert_eq!(velocity.poles, vec![1.1]);
    }
}
