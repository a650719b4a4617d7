//! Positive roots of the equilibrium residual `p(S_m; U)`.
//!
//! The residual has several positive roots and no closed form for their
//! number or location, so roots are collected from many local solves and
//! merged. Both strategies share [`merge_roots`], which owns the positivity,
//! duplicate and ordering rules.

use crate::model::OwlModel;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Roots at or below this value are treated as the trivial equilibrium.
pub const MIN_POSITIVE_ROOT: f64 = 1e-6;
/// Roots closer than this to an already accepted root are duplicates.
pub const DUPLICATE_TOLERANCE: f64 = 1e-3;

/// Outcome of a single local solve that did not produce a root.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RootError {
    #[error("secant iteration did not converge in {steps} steps (last step {last_step})")]
    NoConvergence { steps: usize, last_step: f64 },
    #[error("residual is not finite at x = {0}")]
    NonFinite(f64),
    #[error("secant slope vanished at x = {0}")]
    FlatSecant(f64),
    #[error("iteration settled at x = {x} but |p(x)| = {residual} exceeds the residual tolerance")]
    Residual { x: f64, residual: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecantSettings {
    pub max_steps: usize,
    /// Relative step size below which the iteration is considered settled.
    pub step_tolerance: f64,
    /// Largest |p(x)| accepted at the settled point.
    pub residual_tolerance: f64,
    /// Distance from the guess to the second secant point.
    pub initial_offset: f64,
}

impl Default for SecantSettings {
    fn default() -> Self {
        Self {
            max_steps: 50,
            step_tolerance: 1e-12,
            residual_tolerance: 1e-7,
            initial_offset: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketSettings {
    pub lower: f64,
    /// Upper end of the scan. `None` scans up to `max(U, T'/2)`; past `U` the
    /// dispersal term vanishes.
    pub upper: Option<f64>,
    pub intervals: usize,
    pub tolerance: f64,
    pub max_bisections: usize,
}

impl Default for BracketSettings {
    fn default() -> Self {
        Self {
            lower: 1e-3,
            upper: None,
            intervals: 5000,
            tolerance: 1e-12,
            max_bisections: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootStrategy {
    /// Secant solves from a fixed list of guesses.
    MultiStart,
    /// Sign-change scan over a uniform grid, refined by bisection.
    Bracketing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootFinder {
    pub strategy: RootStrategy,
    pub guesses: Vec<f64>,
    pub secant: SecantSettings,
    pub bracket: BracketSettings,
}

impl Default for RootFinder {
    fn default() -> Self {
        Self {
            strategy: RootStrategy::MultiStart,
            guesses: default_guesses(),
            secant: SecantSettings::default(),
            bracket: BracketSettings::default(),
        }
    }
}

/// `5, 10, ..., 200`.
pub fn default_guesses() -> Vec<f64> {
    (1..=40).map(|k| 5.0 * k as f64).collect()
}

impl RootFinder {
    pub fn with_strategy(strategy: RootStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.strategy {
            RootStrategy::MultiStart => {
                if self.guesses.is_empty() {
                    bail!("Multi-start search needs at least one initial guess.");
                }
                if let Some(bad) = self.guesses.iter().find(|g| !g.is_finite()) {
                    bail!("Initial guess {} is not finite.", bad);
                }
                if self.secant.max_steps == 0 {
                    bail!("max_steps must be greater than zero.");
                }
                if self.secant.step_tolerance <= 0.0 || self.secant.residual_tolerance <= 0.0 {
                    bail!("Secant tolerances must be positive.");
                }
                if self.secant.initial_offset == 0.0 || !self.secant.initial_offset.is_finite() {
                    bail!("initial_offset must be finite and non-zero.");
                }
            }
            RootStrategy::Bracketing => {
                if self.bracket.intervals == 0 {
                    bail!("Bracketing scan needs at least one interval.");
                }
                if self.bracket.tolerance <= 0.0 {
                    bail!("Bisection tolerance must be positive.");
                }
                if self.bracket.max_bisections == 0 {
                    bail!("max_bisections must be greater than zero.");
                }
                if let Some(upper) = self.bracket.upper {
                    if !(upper > self.bracket.lower) {
                        bail!(
                            "Scan range is empty: upper {} must exceed lower {}.",
                            upper,
                            self.bracket.lower
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Sorted, de-duplicated positive roots of `p(S_m; U)` for the model's habitat.
    ///
    /// An empty list is a normal outcome (no interior equilibrium exists).
    pub fn positive_equilibria(&self, model: &OwlModel) -> Vec<f64> {
        let residual = |s_m: f64| model.equilibrium_residual(s_m);
        match self.strategy {
            RootStrategy::MultiStart => merge_roots(
                self.guesses
                    .iter()
                    .filter_map(|&guess| secant(residual, guess, &self.secant).ok()),
            ),
            RootStrategy::Bracketing => {
                let upper = self
                    .bracket
                    .upper
                    .unwrap_or_else(|| model.habitat.max(0.5 * model.params.t_prime));
                merge_roots(bracketed_roots(
                    residual,
                    self.bracket.lower,
                    upper,
                    &self.bracket,
                ))
            }
        }
    }
}

/// Secant iteration on `f` starting from `guess` and `guess + initial_offset`.
pub fn secant<F>(f: F, guess: f64, settings: &SecantSettings) -> Result<f64, RootError>
where
    F: Fn(f64) -> f64,
{
    let mut x0 = guess;
    let mut x1 = guess + settings.initial_offset;
    let mut f0 = finite(&f, x0)?;
    let mut f1 = finite(&f, x1)?;
    let mut last_step = f64::INFINITY;

    if f0 == 0.0 {
        return Ok(x0);
    }

    for _ in 0..settings.max_steps {
        if f1 == 0.0 {
            return Ok(x1);
        }
        let slope = (f1 - f0) / (x1 - x0);
        if slope == 0.0 || !slope.is_finite() {
            return verify(x1, f1, settings).map_err(|_| RootError::FlatSecant(x1));
        }

        let x2 = x1 - f1 / slope;
        last_step = (x2 - x1).abs();
        x0 = x1;
        f0 = f1;
        x1 = x2;
        f1 = finite(&f, x1)?;

        if last_step <= settings.step_tolerance * x1.abs().max(1.0) {
            return verify(x1, f1, settings);
        }
    }

    Err(RootError::NoConvergence {
        steps: settings.max_steps,
        last_step,
    })
}

fn finite<F: Fn(f64) -> f64>(f: &F, x: f64) -> Result<f64, RootError> {
    if !x.is_finite() {
        return Err(RootError::NonFinite(x));
    }
    let value = f(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RootError::NonFinite(x))
    }
}

fn verify(x: f64, fx: f64, settings: &SecantSettings) -> Result<f64, RootError> {
    if fx.abs() <= settings.residual_tolerance {
        Ok(x)
    } else {
        Err(RootError::Residual {
            x,
            residual: fx.abs(),
        })
    }
}

/// Scans `[lower, upper]` for sign changes and refines each by bisection.
/// Candidates are returned in ascending order.
pub fn bracketed_roots<F>(
    f: F,
    lower: f64,
    upper: f64,
    settings: &BracketSettings,
) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    let mut roots = Vec::new();
    if !(upper > lower) || settings.intervals == 0 {
        return roots;
    }

    let width = (upper - lower) / settings.intervals as f64;
    let mut a = lower;
    let mut fa = f(a);
    if fa == 0.0 {
        roots.push(a);
    }

    for i in 1..=settings.intervals {
        let b = if i == settings.intervals {
            upper
        } else {
            lower + i as f64 * width
        };
        let fb = f(b);
        if fb == 0.0 {
            roots.push(b);
        } else if fa.is_finite() && fb.is_finite() && fa * fb < 0.0 {
            roots.push(bisect(&f, a, fa, b, settings));
        }
        a = b;
        fa = fb;
    }
    roots
}

fn bisect<F: Fn(f64) -> f64>(
    f: &F,
    mut a: f64,
    mut fa: f64,
    mut b: f64,
    settings: &BracketSettings,
) -> f64 {
    for _ in 0..settings.max_bisections {
        let mid = 0.5 * (a + b);
        if (b - a).abs() <= settings.tolerance {
            return mid;
        }
        let fm = f(mid);
        if fm == 0.0 {
            return mid;
        }
        if fa * fm < 0.0 {
            b = mid;
        } else {
            a = mid;
            fa = fm;
        }
    }
    0.5 * (a + b)
}

/// Keeps candidates above [`MIN_POSITIVE_ROOT`] that differ from every
/// previously kept root by more than [`DUPLICATE_TOLERANCE`], then sorts.
///
/// The first candidate of a cluster wins, so callers must feed candidates
/// in a deterministic order.
pub fn merge_roots<I>(candidates: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut roots: Vec<f64> = Vec::new();
    for root in candidates {
        if !root.is_finite() || root <= MIN_POSITIVE_ROOT {
            continue;
        }
        if roots
            .iter()
            .all(|kept| (root - kept).abs() > DUPLICATE_TOLERANCE)
        {
            roots.push(root);
        }
    }
    roots.sort_by(f64::total_cmp);
    roots
}
