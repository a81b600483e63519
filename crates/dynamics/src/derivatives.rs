//! Elementwise algebra over the cart-plus-poles state vector.

/// One scalar per degree of freedom of a cart system: the cart itself plus
/// one entry per attached pole, index-aligned with the cart's pole order.
///
/// The same shape serves as position, velocity, and acceleration view.
/// Every combination produces a fresh value; nothing is mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct StateDerivative {
    pub cart: f64,
    pub poles: Vec<f64>,
}

impl StateDerivative {
    #[must_use]
    pub fn new(cart: f64, poles: Vec<f64>) -> Self {
        Self { cart, poles }
    }

    /// Elementwise sum.
    ///
    /// # Panics
    ///
    /// Panics if the pole entries of `self` and `other` differ in length;
    /// combining derivatives of different cart systems is a programming
    /// error.
    #[must_use]
    pub fn sum(&self, other: &Self) -> Self {
        assert_eq!(
            self.poles.len(),
            other.poles.len(),
            "derivative pole counts differ"
        );
        Self {
            cart: self.cart + other.cart,
            poles: self
                .poles
                .iter()
                .zip(&other.poles)
                .map(|(a, b)| a + b)
                .collect(),
        }
    }

    /// Elementwise product.
    ///
    /// # Panics
    ///
    /// Panics if the pole entries of `self` and `other` differ in length.
    #[must_use]
    pub fn product(&self, other: &Self) -> Self {
        assert_eq!(
            self.poles.len(),
            other.poles.len(),
            "derivative pole counts differ"
        );
        Self {
            cart: self.cart * other.cart,
            poles: self
                .poles
                .iter()
                .zip(&other.poles)
                .map(|(a, b)| a * b)
                .collect(),
        }
    }

    /// Scalar multiplication.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            cart: self.cart * factor,
            poles: self.poles.iter().map(|p| p * factor).collect(),
        }
    }
}
