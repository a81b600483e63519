//! Control policy interface: observation in, action out.

/// Boxed error a policy may surface. The episode aborts and reports it; a
/// failing policy is never silently scored.
pub type PolicyError = Box<dyn std::error::Error + Send + Sync>;

/// A black-box controller queried once per environment tick.
///
/// The environment imposes no statefulness contract; a policy is free to
/// keep internal state between calls, and a fresh episode does not reset it.
pub trait Policy {
    /// Produce one action value per control axis for the given observation.
    /// Action values near `0.5` mean little applied force; `0.0` and `1.0`
    /// are full force in either direction.
    ///
    /// # Errors
    ///
    /// Any error aborts the current episode.
    fn activate(&mut self, observation: &[f64]) -> Result<Vec<f64>, PolicyError>;
}

/// Policy that ignores its input and always answers the same action values.
/// With all entries at `0.5` this is the do-nothing baseline.
pub struct ConstantPolicy {
    action: Vec<f64>,
}

impl ConstantPolicy {
    #[must_use]
    pub fn new(action: Vec<f64>) -> Self {
        Self { action }
    }
}

impl Policy for ConstantPolicy {
    fn activate(&mut self, _observation: &[f64]) -> Result<Vec<f64>, PolicyError> {
        Ok(self.action.clone())
    }
}
