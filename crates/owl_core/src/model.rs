//! The coupled recurrence for paired birds `P` and single males `S_m`.
//!
//! ```text
//! P_{t+1}   = F(P_t, S_m,t)    = p_s·P + s_s·S_m·M(S_m)
//! S_m,t+1   = G(P_t, S_m,t; U) = ½·f·s_J·D(P, S_m; U)·P + s_s·S_m·(1 - M(S_m)) + p_b·P
//! ```
//!
//! Every term is generic over [`Scalar`]; the analysis runs in `f64`.

use crate::params::ModelParameters;
use crate::traits::{DynamicalSystem, Scalar};

/// The population map under one parameterization and one habitat capacity `U`.
///
/// Construct with validated parameters: the equilibrium relation divides by
/// `1 - p_s` and is undefined for `p_s = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwlModel {
    pub params: ModelParameters,
    pub habitat: f64,
}

impl OwlModel {
    pub fn new(params: ModelParameters, habitat: f64) -> Self {
        Self { params, habitat }
    }

    /// Mate-finding success `M(S_m) = 1 - (1 - min(T', 2·S_m)/T')^n`.
    ///
    /// Only the upper end is capped; negative `S_m` is passed through as-is.
    pub fn mate_finding<T: Scalar>(&self, s_m: T) -> T {
        let t_prime = T::constant(self.params.t_prime);
        let frac = t_prime.min(T::constant(2.0) * s_m) / t_prime;
        T::one() - (T::one() - frac).powi(self.params.n)
    }

    /// Paired count at equilibrium, `P = s_s·S_m·M(S_m) / (1 - p_s)`.
    pub fn pairs_at_equilibrium<T: Scalar>(&self, s_m: T) -> T {
        let s_s = T::constant(self.params.s_s);
        let p_s = T::constant(self.params.p_s);
        s_s * s_m * self.mate_finding(s_m) / (T::one() - p_s)
    }

    /// Dispersal success `D(P, S_m; U) = 1 - (1 - clamp((U - P - S_m)/T, 0, 1))^m`.
    pub fn dispersal_success<T: Scalar>(&self, p: T, s_m: T) -> T {
        let habitat = T::constant(self.habitat);
        let scale = T::constant(self.params.t);
        let frac = ((habitat - p - s_m) / scale).max(T::zero()).min(T::one());
        T::one() - (T::one() - frac).powi(self.params.m)
    }

    /// `F(P, S_m)`: next-step paired count.
    pub fn next_pairs<T: Scalar>(&self, p: T, s_m: T) -> T {
        let p_s = T::constant(self.params.p_s);
        let s_s = T::constant(self.params.s_s);
        p_s * p + s_s * s_m * self.mate_finding(s_m)
    }

    /// `G(P, S_m; U)`: next-step single-male count.
    pub fn next_single_males<T: Scalar>(&self, p: T, s_m: T) -> T {
        let half = T::constant(0.5);
        let f = T::constant(self.params.f);
        let s_j = T::constant(self.params.s_j);
        let s_s = T::constant(self.params.s_s);
        let p_b = T::constant(self.params.p_b);

        let offspring = half * f * s_j * self.dispersal_success(p, s_m) * p;
        let unpaired = s_s * s_m * (T::one() - self.mate_finding(s_m));
        offspring + unpaired + p_b * p
    }

    /// Residual `p(S_m; U)` of the scalar equilibrium condition.
    ///
    /// Its roots are exactly the fixed points of the map once `P` is
    /// recovered through [`OwlModel::pairs_at_equilibrium`].
    pub fn equilibrium_residual<T: Scalar>(&self, s_m: T) -> T {
        let half = T::constant(0.5);
        let f = T::constant(self.params.f);
        let s_j = T::constant(self.params.s_j);
        let s_s = T::constant(self.params.s_s);
        let p_s = T::constant(self.params.p_s);
        let p_b = T::constant(self.params.p_b);

        let pairs = self.pairs_at_equilibrium(s_m);
        let mating = self.mate_finding(s_m);
        let dispersal = self.dispersal_success(pairs, s_m);

        -s_m + (half * f * s_j * dispersal + p_b) * (s_s * s_m * mating) / (T::one() - p_s)
            + s_s * s_m * (T::one() - mating)
    }
}

impl<T: Scalar> DynamicalSystem<T> for OwlModel {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, x: &[T], out: &mut [T]) {
        let (p, s_m) = (x[0], x[1]);
        out[0] = self.next_pairs(p, s_m);
        out[1] = self.next_single_males(p, s_m);
    }
}

#[cfg(test)]
mod tests {
    use super::OwlModel;
    use crate::params::ModelParameters;
    use crate::traits::DynamicalSystem;
    use approx::assert_relative_eq;

    fn model(habitat: f64) -> OwlModel {
        OwlModel::new(ModelParameters::default(), habitat)
    }

    #[test]
    fn mate_finding_starts_at_zero_and_saturates() {
        let model = model(250.0);
        assert_eq!(model.mate_finding(0.0), 0.0);
        assert_eq!(model.mate_finding(500.0), 1.0);
        assert_eq!(model.mate_finding(900.0), 1.0);
    }

    #[test]
    fn mate_finding_is_non_decreasing_up_to_half_scale() {
        let model = model(250.0);
        let mut previous = model.mate_finding(0.0);
        for k in 1..=1000 {
            let s_m = 0.5 * k as f64;
            let value = model.mate_finding(s_m);
            assert!(value >= previous, "M decreased at S_m = {s_m}");
            assert!((0.0..=1.0).contains(&value));
            previous = value;
        }
    }

    #[test]
    fn dispersal_is_clamped_when_habitat_is_overfull() {
        // U - P - S_m < 0
        let model = model(10.0);
        let value = model.dispersal_success(50.0, 30.0);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn dispersal_is_clamped_when_habitat_exceeds_scale() {
        // (U - P - S_m) / T > 1
        let model = model(5000.0);
        let value = model.dispersal_success(1.0, 1.0);
        assert_eq!(value, 1.0);
    }

    #[test]
    fn dispersal_stays_a_probability_across_states() {
        for habitat in [0.0, 50.0, 250.0, 1500.0, 4000.0] {
            let model = model(habitat);
            for p in [0.0, 10.0, 200.0, 3000.0] {
                for s_m in [0.0, 5.0, 400.0] {
                    let value = model.dispersal_success(p, s_m);
                    assert!(
                        (0.0..=1.0).contains(&value),
                        "D({p}, {s_m}; {habitat}) = {value}"
                    );
                }
            }
        }
    }

    #[test]
    fn equilibrium_pairs_are_a_fixed_point_of_the_pair_equation() {
        let model = model(250.0);
        let s_m = 20.0;
        let pairs = model.pairs_at_equilibrium(s_m);
        assert_relative_eq!(model.next_pairs(pairs, s_m), pairs, max_relative = 1e-12);
    }

    #[test]
    fn residual_matches_single_male_update_on_equilibrium_manifold() {
        let model = model(200.0);
        for s_m in [3.0, 12.5, 28.0, 60.0] {
            let pairs = model.pairs_at_equilibrium(s_m);
            let expected = model.next_single_males(pairs, s_m) - s_m;
            assert_relative_eq!(
                model.equilibrium_residual(s_m),
                expected,
                epsilon = 1e-10,
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn residual_vanishes_at_the_trivial_equilibrium() {
        assert_eq!(model(250.0).equilibrium_residual(0.0), 0.0);
    }

    #[test]
    fn map_applies_both_updates() {
        let model = model(250.0);
        let mut out = [0.0; 2];
        DynamicalSystem::<f64>::apply(&model, &[30.0, 12.0], &mut out);
        assert_eq!(out[0], model.next_pairs(30.0, 12.0));
        assert_eq!(out[1], model.next_single_males(30.0, 12.0));
    }

    #[test]
    fn single_precision_tracks_double_precision() {
        let model = model(250.0);
        let wide: f64 = model.equilibrium_residual(20.0);
        let narrow: f32 = model.equilibrium_residual(20.0f32);
        assert_relative_eq!(narrow as f64, wide, max_relative = 1e-4);
    }
}
