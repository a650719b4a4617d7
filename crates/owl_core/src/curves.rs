//! Data behind the two diagnostic plots: the equilibrium residual as a
//! function of `S_m`, and phase-plane orbits of the map.

use crate::{
    model::OwlModel,
    solvers::DiscreteMap,
    traits::{DynamicalSystem, Steppable},
};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Initial `(P, S_m)` states of the reference phase portrait.
pub const DEFAULT_INITIAL_STATES: [(f64, f64); 4] =
    [(5.0, 5.0), (20.0, 5.0), (5.0, 20.0), (30.0, 20.0)];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualSample {
    pub habitat: f64,
    pub single_males: f64,
    pub residual: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub step: usize,
    pub pairs: f64,
    pub single_males: f64,
}

/// Evaluates `p(S_m; U)` at `count` evenly spaced points of `[start, end]`, endpoints included.
pub fn sample_polynomial(
    model: &OwlModel,
    start: f64,
    end: f64,
    count: usize,
) -> Result<Vec<ResidualSample>> {
    if count < 2 {
        bail!("Sampling needs at least two points, got {}.", count);
    }
    if !start.is_finite() || !end.is_finite() || end <= start {
        bail!("Sampling range [{}, {}] is empty or not finite.", start, end);
    }

    let width = (end - start) / (count - 1) as f64;
    Ok((0..count)
        .map(|i| {
            let single_males = if i + 1 == count {
                end
            } else {
                start + i as f64 * width
            };
            ResidualSample {
                habitat: model.habitat,
                single_males,
                residual: model.equilibrium_residual(single_males),
            }
        })
        .collect())
}

/// Iterates the map `steps` times from `(pairs, single_males)`.
/// The returned orbit holds `steps + 1` states, starting with the initial one.
pub fn simulate_trajectory(
    model: &OwlModel,
    pairs: f64,
    single_males: f64,
    steps: usize,
) -> Result<Vec<TrajectoryPoint>> {
    if !pairs.is_finite() || !single_males.is_finite() {
        bail!(
            "Initial state ({}, {}) must be finite.",
            pairs,
            single_males
        );
    }

    let mut stepper = DiscreteMap::<f64>::new(DynamicalSystem::<f64>::dimension(model));
    let mut state = [pairs, single_males];
    let mut t = 0usize;
    let capacity = match steps.checked_add(1) {
        Some(capacity) => capacity,
        None => bail!("Trajectory of {} steps is too long.", steps),
    };
    let mut orbit = Vec::with_capacity(capacity);
    orbit.push(TrajectoryPoint {
        step: t,
        pairs,
        single_males,
    });

    for _ in 0..steps {
        stepper.step(model, &mut t, &mut state[..]);
        orbit.push(TrajectoryPoint {
            step: t,
            pairs: state[0],
            single_males: state[1],
        });
    }
    Ok(orbit)
}

#[cfg(test)]
mod tests {
    use super::{sample_polynomial, simulate_trajectory, DEFAULT_INITIAL_STATES};
    use crate::analysis::{run_analysis, AnalysisSettings};
    use crate::model::OwlModel;
    use crate::params::ModelParameters;
    use crate::stability::StabilityLabel;
    use approx::assert_abs_diff_eq;

    fn model(habitat: f64) -> OwlModel {
        OwlModel::new(ModelParameters::default(), habitat)
    }

    #[test]
    fn samples_include_both_endpoints() {
        let samples = sample_polynomial(&model(150.0), 0.0, 40.0, 400).expect("valid range");
        assert_eq!(samples.len(), 400);
        assert_eq!(samples[0].single_males, 0.0);
        assert_eq!(samples[399].single_males, 40.0);
        assert_eq!(samples[0].residual, 0.0);
        assert!(samples.iter().all(|s| s.habitat == 150.0));
    }

    #[test]
    fn samples_change_sign_between_equilibria() {
        let samples = sample_polynomial(&model(250.0), 0.0, 40.0, 400).expect("valid range");
        let sign_changes = samples
            .windows(2)
            .filter(|w| w[0].residual * w[1].residual < 0.0)
            .count();
        assert_eq!(sign_changes, 2);
    }

    #[test]
    fn degenerate_sampling_requests_fail() {
        assert!(sample_polynomial(&model(250.0), 0.0, 40.0, 1).is_err());
        assert!(sample_polynomial(&model(250.0), 10.0, 10.0, 5).is_err());
        assert!(sample_polynomial(&model(250.0), 0.0, f64::INFINITY, 5).is_err());
    }

    #[test]
    fn trajectory_keeps_initial_state_and_step_count() {
        let orbit = simulate_trajectory(&model(250.0), 5.0, 20.0, 80).expect("finite start");
        assert_eq!(orbit.len(), 81);
        assert_eq!((orbit[0].pairs, orbit[0].single_males), (5.0, 20.0));
        assert_eq!(orbit[80].step, 80);
    }

    #[test]
    fn oversized_step_count_is_rejected() {
        assert!(simulate_trajectory(&model(250.0), 5.0, 5.0, usize::MAX).is_err());
    }

    #[test]
    fn trajectory_from_equilibrium_stays_put() {
        let rows = run_analysis(
            &ModelParameters::default(),
            &[250.0],
            &AnalysisSettings::default(),
        )
        .expect("run should succeed");
        let row = rows.last().expect("U = 250 has equilibria");
        let orbit = simulate_trajectory(&model(250.0), row.pairs, row.single_males, 5)
            .expect("finite start");
        for point in &orbit {
            assert_abs_diff_eq!(point.pairs, row.pairs, epsilon = 1e-5);
            assert_abs_diff_eq!(point.single_males, row.single_males, epsilon = 1e-5);
        }
    }

    #[test]
    fn orbits_approach_the_stable_equilibrium() {
        let rows = run_analysis(
            &ModelParameters::default(),
            &[250.0],
            &AnalysisSettings::default(),
        )
        .expect("run should succeed");
        let stable = rows
            .iter()
            .find(|r| r.stability == StabilityLabel::Stable)
            .expect("U = 250 has a stable equilibrium");
        let (p0, s0) = DEFAULT_INITIAL_STATES[3];
        let orbit = simulate_trajectory(&model(250.0), p0, s0, 2000).expect("finite start");
        let last = orbit.last().expect("non-empty orbit");
        assert_abs_diff_eq!(last.pairs, stable.pairs, epsilon = 1e-3);
        assert_abs_diff_eq!(last.single_males, stable.single_males, epsilon = 1e-3);
    }

    #[test]
    fn sparse_populations_collapse() {
        let (p0, s0) = DEFAULT_INITIAL_STATES[0];
        let orbit = simulate_trajectory(&model(250.0), p0, s0, 2000).expect("finite start");
        let last = orbit.last().expect("non-empty orbit");
        assert!(last.pairs < 1e-6 && last.single_males < 1e-6, "{last:?}");
    }
}
