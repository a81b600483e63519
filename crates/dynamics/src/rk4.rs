//! Classical fourth-order Runge-Kutta step for the coupled system.

use crate::cart::Cart;
use crate::derivatives::StateDerivative;

/// Advance `cart` in place by one RK4 step of size `dt` under a constant
/// `force`.
///
/// `first_order` and `second_order` are the stage-one derivatives, evaluated
/// by the caller at the current state. The three remaining stages each run on
/// a scratch copy of the cart: copy, perturb by the previous stage's
/// derivatives, re-derive. Only the final weighted combination touches the
/// caller's cart, so no stage can observe a partially-updated state.
///
/// No randomness, no I/O: identical inputs produce bit-identical results.
pub fn rk4(
    force: f64,
    cart: &mut Cart,
    first_order: &StateDerivative,
    second_order: &StateDerivative,
    gravity: f64,
    dt: f64,
) {
    let half_step = dt * 0.5;
    let sixth_step = dt / 6.0;

    let mut k2 = cart.clone();
    k2.advance(first_order, second_order, half_step);
    let first_k2 = k2.first_order();
    let second_k2 = k2.second_order(force, gravity);

    let mut k3 = cart.clone();
    k3.advance(&first_k2, &second_k2, half_step);
    let first_k3 = k3.first_order();
    let second_k3 = k3.second_order(force, gravity);

    let mut k4 = cart.clone();
    k4.advance(&first_k3, &second_k3, dt);
    let first_k4 = k4.first_order();
    let second_k4 = k4.second_order(force, gravity);

    let first_combined = first_order
        .sum(&first_k4)
        .sum(&first_k2.sum(&first_k3).scale(2.0));
    let second_combined = second_order
        .sum(&second_k4)
        .sum(&second_k2.sum(&second_k3).scale(2.0));

    cart.advance(&first_combined, &second_combined, sixth_step);
}
