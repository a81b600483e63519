//! Environment configuration from a flat key/value property set.
//!
//! Key names follow the flat experiment-properties convention
//! (`fitness.environment.*`, `fitness.simulation.*`, `fitness.agent.*`).
//! The same structure also deserializes from JSON for callers that prefer a
//! structured document over a properties file.

use std::collections::HashMap;

use dynamics::Pole;
use serde::Deserialize;

use crate::error::ConfigError;

/// Initial cart and primary-pole state, one entry per axis where relevant.
/// Single-axis environments use index 0 only. All values default to zero.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct InitialState {
    #[serde(default)]
    pub cart_position: [f64; 2],
    #[serde(default)]
    pub cart_velocity: [f64; 2],
    #[serde(default)]
    pub pole_angle: f64,
    #[serde(default)]
    pub pole_velocity: f64,
}

/// Everything an environment needs for one episode. Immutable once built;
/// every episode constructs fresh carts from it.
#[derive(Clone, Debug, Deserialize)]
pub struct EnvConfig {
    pub track_length: f64,
    pub gravity: f64,
    pub max_steps: usize,
    pub pole_angle_threshold: f64,
    /// Whether cart and pole velocities appear in the observation vector.
    pub include_velocity: bool,
    pub cart_mass: f64,
    pub cart_friction: f64,
    pub pole_count: usize,
    pub pole_mass: f64,
    pub pole_length: f64,
    pub pole_friction: f64,
    #[serde(default)]
    pub initial: InitialState,
    /// Weight on the survival fraction when blending with the stillness term
    /// (no-velocity observations only). The known experiment variants use
    /// 0.1 and 0.5.
    #[serde(default = "default_survival_weight")]
    pub survival_weight: f64,
}

fn default_survival_weight() -> f64 {
    0.1
}

impl EnvConfig {
    /// Build and validate a configuration from a flat property map.
    ///
    /// # Errors
    ///
    /// Any missing or unparseable required key, or a physically invalid
    /// value, is fatal.
    pub fn from_props(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let cfg = Self {
            track_length: require_f64(props, "fitness.environment.trackLength")?,
            gravity: require_f64(props, "fitness.environment.gravity")?,
            max_steps: require_usize(props, "fitness.simulation.maxTimeSteps")?,
            pole_angle_threshold: require_f64(props, "fitness.simulation.poleAngleThreshold")?,
            include_velocity: require_bool(props, "fitness.simulation.includeVelocity")?,
            cart_mass: require_f64(props, "fitness.agent.cartMass")?,
            cart_friction: require_f64(props, "fitness.agent.cartFriction")?,
            pole_count: require_usize(props, "fitness.agent.poleCount")?,
            pole_mass: require_f64(props, "fitness.agent.poleMass")?,
            pole_length: require_f64(props, "fitness.agent.poleLength")?,
            pole_friction: require_f64(props, "fitness.agent.poleFriction")?,
            initial: InitialState {
                cart_position: [
                    optional_f64(props, "fitness.agent.initial.cartPositionX")?,
                    optional_f64(props, "fitness.agent.initial.cartPositionY")?,
                ],
                cart_velocity: [
                    optional_f64(props, "fitness.agent.initial.cartVelocityX")?,
                    optional_f64(props, "fitness.agent.initial.cartVelocityY")?,
                ],
                pole_angle: optional_f64(props, "fitness.agent.initial.poleAngle")?,
                pole_velocity: optional_f64(props, "fitness.agent.initial.poleVelocity")?,
            },
            survival_weight: match props.get("fitness.simulation.survivalWeight") {
                Some(value) => parse_f64("fitness.simulation.survivalWeight", value)?,
                None => default_survival_weight(),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the physical parameters. Construction paths call this; callers
    /// deserializing from JSON should call it before building an
    /// environment.
    ///
    /// # Errors
    ///
    /// Non-positive masses, lengths, or thresholds, negative frictions, a
    /// zero step budget or pole count, or a blend weight outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("fitness.environment.trackLength", self.track_length),
            ("fitness.simulation.poleAngleThreshold", self.pole_angle_threshold),
            ("fitness.agent.cartMass", self.cart_mass),
            ("fitness.agent.poleMass", self.pole_mass),
            ("fitness.agent.poleLength", self.pole_length),
        ];
        for (key, value) in positive {
            if value <= 0.0 || value.is_nan() {
                return Err(ConfigError::NotPositive(key.to_string()));
            }
        }

        let non_negative = [
            ("fitness.agent.cartFriction", self.cart_friction),
            ("fitness.agent.poleFriction", self.pole_friction),
        ];
        for (key, value) in non_negative {
            if value < 0.0 || value.is_nan() {
                return Err(ConfigError::Negative(key.to_string()));
            }
        }

        if self.max_steps == 0 {
            return Err(ConfigError::NotPositive(
                "fitness.simulation.maxTimeSteps".to_string(),
            ));
        }
        if self.pole_count == 0 {
            return Err(ConfigError::NotPositive(
                "fitness.agent.poleCount".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.survival_weight) {
            return Err(ConfigError::OutsideUnitRange(
                "fitness.simulation.survivalWeight".to_string(),
            ));
        }
        Ok(())
    }

    /// Pole stack for one axis. The configured angle and spin apply to the
    /// primary pole only; each further pole starts upright and at rest with
    /// length and mass scaled down by a factor of ten per index.
    #[must_use]
    pub fn initial_poles(&self) -> Vec<Pole> {
        let scaling: f64 = 0.1;
        let mut poles = Vec::with_capacity(self.pole_count);
        poles.push(Pole::new(
            self.pole_length,
            self.pole_mass,
            self.pole_friction,
            self.initial.pole_angle,
            self.initial.pole_velocity,
        ));
        let mut c = 1.0;
        for _ in 1..self.pole_count {
            c *= scaling;
            poles.push(Pole::new(
                self.pole_length * c,
                self.pole_mass * c,
                self.pole_friction,
                0.0,
                0.0,
            ));
        }
        poles
    }
}

fn require<'p>(props: &'p HashMap<String, String>, key: &str) -> Result<&'p str, ConfigError> {
    props
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn require_f64(props: &HashMap<String, String>, key: &str) -> Result<f64, ConfigError> {
    parse_f64(key, require(props, key)?)
}

fn require_usize(props: &HashMap<String, String>, key: &str) -> Result<usize, ConfigError> {
    let value = require(props, key)?;
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn require_bool(props: &HashMap<String, String>, key: &str) -> Result<bool, ConfigError> {
    let value = require(props, key)?;
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn optional_f64(props: &HashMap<String, String>, key: &str) -> Result<f64, ConfigError> {
    match props.get(key) {
        Some(value) => parse_f64(key, value),
        None => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::EnvConfig;
    use crate::error::ConfigError;

    fn base_props() -> HashMap<String, String> {
        let entries = [
            ("fitness.environment.trackLength", "4.8"),
            ("fitness.environment.gravity", "-9.8"),
            ("fitness.simulation.maxTimeSteps", "1000"),
            ("fitness.simulation.poleAngleThreshold", "0.2094"),
            ("fitness.simulation.includeVelocity", "true"),
            ("fitness.agent.cartMass", "1.0"),
            ("fitness.agent.cartFriction", "0.0"),
            ("fitness.agent.poleCount", "1"),
            ("fitness.agent.poleMass", "0.1"),
            ("fitness.agent.poleLength", "0.5"),
            ("fitness.agent.poleFriction", "0.0"),
            ("fitness.agent.initial.poleAngle", "0.01"),
        ];
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_a_complete_property_set() {
        let cfg = EnvConfig::from_props(&base_props()).unwrap();
        assert_eq!(cfg.max_steps, 1000);
        assert_eq!(cfg.initial.pole_angle, 0.01);
        assert_eq!(cfg.initial.cart_position, [0.0, 0.0]);
        assert_eq!(cfg.survival_weight, 0.1);
    }

    #[test]
    fn missing_key_is_fatal() {
        let mut props = base_props();
        props.remove("fitness.environment.gravity");
        assert!(matches!(
            EnvConfig::from_props(&props),
            Err(ConfigError::Missing(key)) if key == "fitness.environment.gravity"
        ));
    }

    #[test]
    fn unparseable_value_is_fatal() {
        let mut props = base_props();
        props.insert("fitness.agent.poleMass".to_string(), "heavy".to_string());
        assert!(matches!(
            EnvConfig::from_props(&props),
            Err(ConfigError::Invalid { key, .. }) if key == "fitness.agent.poleMass"
        ));
    }

    #[test]
    fn zero_pole_length_is_fatal() {
        let mut props = base_props();
        props.insert("fitness.agent.poleLength".to_string(), "0.0".to_string());
        assert!(matches!(
            EnvConfig::from_props(&props),
            Err(ConfigError::NotPositive(key)) if key == "fitness.agent.poleLength"
        ));
    }

    #[test]
    fn secondary_poles_are_scaled_down_and_upright() {
        let mut props = base_props();
        props.insert("fitness.agent.poleCount".to_string(), "2".to_string());
        let cfg = EnvConfig::from_props(&props).unwrap();

        let poles = cfg.initial_poles();
        assert_eq!(poles.len(), 2);
        assert_eq!(poles[0].angle, 0.01);
        assert!((poles[1].length - 0.05).abs() < 1e-12);
        assert!((poles[1].mass - 0.01).abs() < 1e-12);
        assert_eq!(poles[1].angle, 0.0);
        assert_eq!(poles[1].angular_velocity, 0.0);
    }
}
