//! Linearized stability of a fixed point of a discrete map.
//!
//! A fixed point is locally asymptotically stable iff the spectral radius of
//! the Jacobian there is strictly below one.

use nalgebra::Matrix2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityLabel {
    Stable,
    Unstable,
}

impl StabilityLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            StabilityLabel::Stable => "stable",
            StabilityLabel::Unstable => "unstable",
        }
    }
}

impl fmt::Display for StabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub eigenvalues: [Complex64; 2],
    pub magnitudes: [f64; 2],
    pub spectral_radius: f64,
    pub label: StabilityLabel,
}

impl Spectrum {
    pub fn from_eigenvalues(eigenvalues: [Complex64; 2]) -> Self {
        let magnitudes = [eigenvalues[0].norm(), eigenvalues[1].norm()];
        let spectral_radius = magnitudes[0].max(magnitudes[1]);
        Self {
            eigenvalues,
            magnitudes,
            spectral_radius,
            label: classify_radius(spectral_radius),
        }
    }
}

/// Eigenvalues through nalgebra's real Schur decomposition.
pub fn eigenvalues(jacobian: &Matrix2<f64>) -> [Complex64; 2] {
    let values = jacobian.complex_eigenvalues();
    [values[0], values[1]]
}

/// Eigenvalues as roots of `λ² - tr·λ + det`, independent of the Schur path.
pub fn characteristic_eigenvalues(jacobian: &Matrix2<f64>) -> [Complex64; 2] {
    let trace = jacobian.trace();
    let det = jacobian[(0, 0)] * jacobian[(1, 1)] - jacobian[(0, 1)] * jacobian[(1, 0)];
    let root = Complex64::new(trace * trace - 4.0 * det, 0.0).sqrt();
    let half_trace = Complex64::new(0.5 * trace, 0.0);
    [half_trace + 0.5 * root, half_trace - 0.5 * root]
}

pub fn spectral_radius(eigenvalues: &[Complex64]) -> f64 {
    eigenvalues.iter().map(|l| l.norm()).fold(0.0, f64::max)
}

pub fn classify(eigenvalues: &[Complex64]) -> StabilityLabel {
    classify_radius(spectral_radius(eigenvalues))
}

fn classify_radius(radius: f64) -> StabilityLabel {
    if radius < 1.0 {
        StabilityLabel::Stable
    } else {
        StabilityLabel::Unstable
    }
}

pub fn analyze(jacobian: &Matrix2<f64>) -> Spectrum {
    Spectrum::from_eigenvalues(eigenvalues(jacobian))
}
