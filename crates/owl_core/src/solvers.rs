use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Discrete Map Stepper
/// Evaluates x_{t+1} = f(x_t) into a scratch buffer and copies it back,
/// so the map always sees the full previous state.
pub struct DiscreteMap<T: Scalar> {
    tmp: Vec<T>,
}

impl<T: Scalar> DiscreteMap<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for DiscreteMap<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut usize, state: &mut [T]) {
        system.apply(state, &mut self.tmp);
        state.copy_from_slice(&self.tmp);
        *t += 1;
    }
}
