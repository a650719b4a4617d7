use crate::{
    jacobian::{jacobian, JacobianSettings},
    model::OwlModel,
    params::ModelParameters,
    roots::RootFinder,
    stability::{self, StabilityLabel},
};
use anyhow::{bail, Context, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Habitat capacities analysed when the caller supplies none.
pub const DEFAULT_HABITATS: [f64; 4] = [100.0, 150.0, 200.0, 250.0];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub roots: RootFinder,
    pub jacobian: JacobianSettings,
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        self.roots.validate()?;
        self.jacobian.validate()?;
        Ok(())
    }
}

/// One row of the stability table: a single equilibrium at a single `U`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityResult {
    pub habitat: f64,
    /// 1-based position of the equilibrium among the roots found for `habitat`.
    pub equilibrium_index: usize,
    pub pairs: f64,
    pub single_males: f64,
    pub eigenvalue_1: Complex64,
    pub eigenvalue_2: Complex64,
    pub magnitude_1: f64,
    pub magnitude_2: f64,
    pub spectral_radius: f64,
    pub stability: StabilityLabel,
}

/// Linearizes the map at the equilibrium with single-male count `single_males`.
pub fn analyze_equilibrium(
    model: &OwlModel,
    equilibrium_index: usize,
    single_males: f64,
    settings: JacobianSettings,
) -> StabilityResult {
    let pairs = model.pairs_at_equilibrium(single_males);
    let jac = jacobian(model, pairs, single_males, settings);
    let spectrum = stability::analyze(&jac);

    StabilityResult {
        habitat: model.habitat,
        equilibrium_index,
        pairs,
        single_males,
        eigenvalue_1: spectrum.eigenvalues[0],
        eigenvalue_2: spectrum.eigenvalues[1],
        magnitude_1: spectrum.magnitudes[0],
        magnitude_2: spectrum.magnitudes[1],
        spectral_radius: spectrum.spectral_radius,
        stability: spectrum.label,
    }
}

/// All positive equilibria for one habitat capacity, in ascending `S_m`.
pub fn analyze_habitat(model: &OwlModel, settings: &AnalysisSettings) -> Vec<StabilityResult> {
    let roots = settings.roots.positive_equilibria(model);
    debug!(
        habitat = model.habitat,
        strategy = ?settings.roots.strategy,
        equilibria = roots.len(),
        "located positive equilibria"
    );

    roots
        .into_iter()
        .enumerate()
        .map(|(idx, s_m)| analyze_equilibrium(model, idx + 1, s_m, settings.jacobian))
        .collect()
}

/// Runs the full pipeline for every habitat capacity, preserving the caller's order.
pub fn run_analysis(
    params: &ModelParameters,
    habitats: &[f64],
    settings: &AnalysisSettings,
) -> Result<Vec<StabilityResult>> {
    params.validate().context("Invalid model parameters.")?;
    settings.validate().context("Invalid analysis settings.")?;
    if let Some(bad) = habitats.iter().find(|u| !u.is_finite()) {
        bail!("Habitat capacity must be finite, got {}.", bad);
    }

    let mut rows = Vec::new();
    for &habitat in habitats {
        let model = OwlModel::new(*params, habitat);
        rows.extend(analyze_habitat(&model, settings));
    }

    info!(
        habitats = habitats.len(),
        equilibria = rows.len(),
        "stability analysis complete"
    );
    Ok(rows)
}
