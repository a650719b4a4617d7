//! Fixed demographic constants of the owl population model.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("{name} must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("p_s must be strictly below 1 (the equilibrium relation divides by 1 - p_s), got {0}")]
    PairSurvivalSaturated(f64),
    #[error("fecundity f must be non-negative and finite, got {0}")]
    InvalidFecundity(f64),
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveCapacity { name: &'static str, value: f64 },
    #[error("search-effort exponent {name} must be at least 1")]
    ZeroExponent { name: &'static str },
    #[error("failed to parse parameters: {0}")]
    Parse(String),
    #[error("failed to read parameter file: {0}")]
    Io(String),
}

/// Survival/reproduction rates and habitat-capacity exponents.
///
/// `t_prime` is the mate-search scale `T'`. Missing keys in a TOML file fall
/// back to the published values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// Survival of single birds.
    pub s_s: f64,
    /// Juvenile survival.
    pub s_j: f64,
    /// Pair survives and stays together.
    pub p_s: f64,
    /// Pair survives and splits.
    pub p_b: f64,
    /// Offspring per pair.
    pub f: f64,
    /// Dispersal search exponent.
    pub m: i32,
    /// Mate search exponent.
    pub n: i32,
    /// Dispersal scale.
    pub t: f64,
    /// Mate-search scale.
    pub t_prime: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            s_s: 0.71,
            s_j: 0.60,
            p_s: 0.88,
            p_b: 0.056,
            f: 0.66,
            m: 20,
            n: 20,
            t: 1000.0,
            t_prime: 1000.0,
        }
    }
}

impl ModelParameters {
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [("s_s", self.s_s), ("s_J", self.s_j), ("p_b", self.p_b)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParameterError::RateOutOfRange { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.p_s) {
            return Err(ParameterError::RateOutOfRange {
                name: "p_s",
                value: self.p_s,
            });
        }
        if self.p_s >= 1.0 {
            return Err(ParameterError::PairSurvivalSaturated(self.p_s));
        }
        if !self.f.is_finite() || self.f < 0.0 {
            return Err(ParameterError::InvalidFecundity(self.f));
        }
        for (name, value) in [("T", self.t), ("T'", self.t_prime)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParameterError::NonPositiveCapacity { name, value });
            }
        }
        if self.m < 1 {
            return Err(ParameterError::ZeroExponent { name: "m" });
        }
        if self.n < 1 {
            return Err(ParameterError::ZeroExponent { name: "n" });
        }
        Ok(())
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ParameterError> {
        let params: Self =
            toml::from_str(source).map_err(|e| ParameterError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParameterError> {
        let source = fs::read_to_string(path.as_ref()).map_err(|e| {
            ParameterError::Io(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelParameters, ParameterError};

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ModelParameters::default().validate(), Ok(()));
    }

    #[test]
    fn saturated_pair_survival_is_rejected() {
        let params = ModelParameters {
            p_s: 1.0,
            ..ModelParameters::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParameterError::PairSurvivalSaturated(1.0))
        );
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let params = ModelParameters {
            t_prime: 0.0,
            ..ModelParameters::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::NonPositiveCapacity { name: "T'", .. })
        ));
    }

    #[test]
    fn partial_toml_overrides_only_named_constants() {
        let params = ModelParameters::from_toml_str("p_b = 0.07\nn = 10\n")
            .expect("partial file should parse");
        assert_eq!(params.p_b, 0.07);
        assert_eq!(params.n, 10);
        assert_eq!(params.s_s, ModelParameters::default().s_s);
        assert_eq!(params.m, 20);
    }

    #[test]
    fn invalid_toml_values_fail_validation() {
        let err = ModelParameters::from_toml_str("s_s = 1.5").expect_err("rate above one");
        assert_eq!(
            err,
            ParameterError::RateOutOfRange {
                name: "s_s",
                value: 1.5
            }
        );
    }

    #[test]
    fn bundled_config_matches_defaults() {
        let params = ModelParameters::from_toml_str(include_str!("../../../configs/book.toml"))
            .expect("bundled config should parse");
        assert_eq!(params, ModelParameters::default());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ModelParameters::from_toml_str("s_s = \"high\"").expect_err("wrong type");
        assert!(matches!(err, ParameterError::Parse(_)));
    }
}
