use crate::model::OwlModel;
use anyhow::{bail, Result};
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JacobianSettings {
    /// Central-difference step. Trades truncation error against cancellation.
    pub step: f64,
}

impl Default for JacobianSettings {
    fn default() -> Self {
        Self { step: 1e-4 }
    }
}

impl JacobianSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.step.is_finite() || self.step <= 0.0 {
            bail!(
                "Finite-difference step must be positive and finite, got {}.",
                self.step
            );
        }
        Ok(())
    }
}

/// Jacobian of `(F, G)` with respect to `(P, S_m)` by central differences.
///
/// Row 0 holds the partials of `F`, row 1 those of `G`; column 0 is `∂/∂P`.
pub fn jacobian(
    model: &OwlModel,
    pairs: f64,
    single_males: f64,
    settings: JacobianSettings,
) -> Matrix2<f64> {
    let h = settings.step;
    let two_h = 2.0 * h;
    let (p, s_m) = (pairs, single_males);

    let f_p = (model.next_pairs(p + h, s_m) - model.next_pairs(p - h, s_m)) / two_h;
    let f_s = (model.next_pairs(p, s_m + h) - model.next_pairs(p, s_m - h)) / two_h;

    let g_p = (model.next_single_males(p + h, s_m) - model.next_single_males(p - h, s_m)) / two_h;
    let g_s = (model.next_single_males(p, s_m + h) - model.next_single_males(p, s_m - h)) / two_h;

    Matrix2::new(f_p, f_s, g_p, g_s)
}
