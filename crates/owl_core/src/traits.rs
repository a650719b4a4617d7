use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in the population map.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {
    /// Lifts a model constant into the scalar type.
    /// Constants that do not fit the target type become NaN rather than panicking.
    fn constant(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Represents a discrete-time dynamical system x_{t+1} = f(x_t).
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the map.
    /// x: current state
    /// out: buffer to write x_{t+1}
    fn apply(&self, x: &[T], out: &mut [T]);
}

/// A trait for steppers that advance a system by one iteration.
pub trait Steppable<T: Scalar> {
    /// Performs one iteration.
    /// t: iteration counter (incremented after step)
    /// state: current state (updated after step)
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut usize, state: &mut [T]);
}
