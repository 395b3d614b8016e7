use crate::traits::{DynamicalSystem, Scalar};
use std::marker::PhantomData;

/// Closure-backed ODE right-hand side with a typed parameter block.
///
/// The parameters are handed to the closure by reference on every evaluation and
/// are never inspected here.
pub struct Ode<T, F, P = ()> {
    dim: usize,
    params: P,
    func: F,
    _scalar: PhantomData<fn(T)>,
}

impl<T, F> Ode<T, F, ()>
where
    T: Scalar,
    F: Fn(T, &[T], &(), &mut [T]),
{
    /// Builds a system whose closure ignores its parameter block.
    pub fn new(dim: usize, func: F) -> Self {
        Self::with_params(dim, (), func)
    }
}

impl<T, F, P> Ode<T, F, P>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
{
    pub fn with_params(dim: usize, params: P, func: F) -> Self {
        Self {
            dim,
            params,
            func,
            _scalar: PhantomData,
        }
    }

    pub fn params(&self) -> &P {
        &self.params
    }
}

impl<T, F, P> DynamicalSystem<T> for Ode<T, F, P>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
{
    fn dimension(&self) -> usize {
        self.dim
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        (self.func)(t, x, &self.params, out)
    }
}
