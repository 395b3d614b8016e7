use crate::error::NumericsError;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in the steppers.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// The derivative function of an ODE, `dy/dt = f(t, y)`.
///
/// Implementors write `f(t, x)` into `out`, which always has `dimension()` entries.
/// `x` is read-only; the steppers rely on it being left untouched.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A trait for fixed-step solvers that advance a system by one step.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (advanced by dt after the step)
    /// state: current state (updated in place)
    /// dt: step size
    ///
    /// Dimension checks happen before the first derivative evaluation, so on error
    /// neither `t` nor `state` has been touched.
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), NumericsError>;
}
