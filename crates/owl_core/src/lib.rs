pub mod analysis;
pub mod curves;
pub mod jacobian;
pub mod model;
pub mod params;
pub mod roots;
pub mod solvers;
pub mod stability;
/// The `owl_core` crate locates and classifies the equilibria of a two-stage
/// owl population map (paired birds `P`, single males `S_m`) as the habitat
/// capacity `U` varies.
///
/// Key components:
/// - **Model**: `OwlModel` with the mate-finding and dispersal terms and the
///   scalar equilibrium residual.
/// - **Roots**: multi-start secant search (or grid bracketing) for the
///   positive equilibria.
/// - **Jacobian / Stability**: central-difference linearization and
///   spectral-radius classification.
/// - **Analysis**: the per-`U` pipeline producing `StabilityResult` rows.
/// - **Curves**: residual sampling and phase-plane trajectories.
pub mod traits;

pub use analysis::{run_analysis, AnalysisSettings, StabilityResult, DEFAULT_HABITATS};
pub use model::OwlModel;
pub use params::{ModelParameters, ParameterError};
pub use roots::{RootFinder, RootStrategy};
pub use stability::StabilityLabel;
