#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Cart and pole dynamics
//!
//! The numeric core of the pole balancing task: a cart sliding on a track
//! with one or more hinged, unactuated poles riding on it. Poles feed their
//! effective force and apparent inertia into the shared cart acceleration,
//! and that acceleration in turn drives each pole's angular acceleration.
//!
//! State advances through [`rk4`], a classical fourth-order Runge-Kutta step
//! over the coupled system. The intermediate stages run on scratch copies of
//! the cart; the caller-visible state only changes in the final combination,
//! so a step is deterministic and free of aliasing between the current and
//! trial states.
//!
//! This crate knows nothing about episodes, observations, or fitness; that
//! lives in the `balance` crate.

pub mod cart;
pub mod derivatives;
pub mod pole;
pub mod rk4;

pub use cart::Cart;
pub use derivatives::StateDerivative;
pub use pole::Pole;
pub use rk4::rk4;
