use crate::error::{NumericsError, Result};
use crate::traits::{DynamicalSystem, Scalar, Steppable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn two<T: Scalar>() -> T {
    T::one() + T::one()
}

fn half<T: Scalar>() -> T {
    T::one() / two::<T>()
}

/// Shared precondition of every stepper: the state, the system and the scratch
/// buffers all agree on a positive dimension.
fn check_dimensions<T: Scalar>(
    system: &impl DynamicalSystem<T>,
    state: &[T],
    scratch_dim: usize,
) -> Result<()> {
    if state.is_empty() {
        return Err(NumericsError::invalid("state vector must not be empty"));
    }
    if system.dimension() != state.len() {
        return Err(NumericsError::invalid(format!(
            "system dimension {} does not match state length {}",
            system.dimension(),
            state.len()
        )));
    }
    if scratch_dim != state.len() {
        return Err(NumericsError::invalid(format!(
            "stepper was built for dimension {} but the state has length {}",
            scratch_dim,
            state.len()
        )));
    }
    Ok(())
}

/// Explicit (forward) Euler: `y ← y + dt·f(t, y)`.
pub struct Euler<T: Scalar> {
    deriv: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            deriv: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<()> {
        check_dimensions(system, state, self.deriv.len())?;
        let t0 = *t;

        system.apply(t0, state, &mut self.deriv);
        for (y, f) in state.iter_mut().zip(&self.deriv) {
            *y = *y + dt * *f;
        }

        *t = t0 + dt;
        Ok(())
    }
}

/// Explicit midpoint Runge-Kutta, second order.
pub struct RK2<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    support: Vec<T>,
}

impl<T: Scalar> RK2<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            support: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK2<T> {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<()> {
        check_dimensions(system, state, self.k1.len())?;
        let half = half::<T>();
        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.support[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.support, &mut self.k2);

        // y_next = y + dt*k2
        for i in 0..state.len() {
            state[i] = state[i] + dt * self.k2[i];
        }

        *t = t0 + dt;
        Ok(())
    }
}

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<()> {
        check_dimensions(system, state, self.k1.len())?;
        let half = half::<T>();
        let two = two::<T>();
        let sixth = T::one() / (two + two + two);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
        Ok(())
    }
}

/// Velocity Verlet (leapfrog).
///
/// The state is split in halves: positions in `[0, N)` and their velocities in
/// `[N, 2N)`. Only the second half of each derivative evaluation is used, as the
/// acceleration of the matching position.
pub struct Verlet<T: Scalar> {
    a1: Vec<T>,
    a2: Vec<T>,
}

impl<T: Scalar> Verlet<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            a1: vec![T::zero(); dim],
            a2: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Verlet<T> {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<()> {
        check_dimensions(system, state, self.a1.len())?;
        if state.len() % 2 != 0 {
            return Err(NumericsError::invalid(format!(
                "Verlet needs an even dimension (positions then velocities), got {}",
                state.len()
            )));
        }
        let n = state.len() / 2;
        let half = half::<T>();
        let t0 = *t;

        // a1 = f(t, y); positions move with the old velocity and acceleration
        system.apply(t0, state, &mut self.a1);
        for i in 0..n {
            state[i] = state[i] + self.a1[i] * dt + self.a1[i + n] * dt * dt * half;
        }

        // a2 = f(t + dt, y) at the new positions; velocities use the mean acceleration
        system.apply(t0 + dt, state, &mut self.a2);
        for i in 0..n {
            state[i + n] = state[i + n] + (self.a1[i + n] + self.a2[i + n]) * dt * half;
        }

        *t = t0 + dt;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepperKind {
    Euler,
    Rk2,
    Rk4,
    Verlet,
}

impl StepperKind {
    pub fn build<T: Scalar>(self, dim: usize) -> Stepper<T> {
        match self {
            StepperKind::Euler => Stepper::Euler(Euler::new(dim)),
            StepperKind::Rk2 => Stepper::Rk2(RK2::new(dim)),
            StepperKind::Rk4 => Stepper::Rk4(RK4::new(dim)),
            StepperKind::Verlet => Stepper::Verlet(Verlet::new(dim)),
        }
    }

    /// Derivative evaluations per step.
    pub fn evaluations(self) -> usize {
        match self {
            StepperKind::Euler => 1,
            StepperKind::Rk2 | StepperKind::Verlet => 2,
            StepperKind::Rk4 => 4,
        }
    }
}

impl fmt::Display for StepperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepperKind::Euler => "euler",
            StepperKind::Rk2 => "rk2",
            StepperKind::Rk4 => "rk4",
            StepperKind::Verlet => "verlet",
        };
        f.write_str(name)
    }
}

impl FromStr for StepperKind {
    type Err = NumericsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(StepperKind::Euler),
            "rk2" | "midpoint" => Ok(StepperKind::Rk2),
            "rk4" => Ok(StepperKind::Rk4),
            "verlet" | "leapfrog" => Ok(StepperKind::Verlet),
            other => Err(NumericsError::invalid(format!("unknown stepper '{other}'"))),
        }
    }
}

/// Runtime-selected stepper.
pub enum Stepper<T: Scalar> {
    Euler(Euler<T>),
    Rk2(RK2<T>),
    Rk4(RK4<T>),
    Verlet(Verlet<T>),
}

impl<T: Scalar> Stepper<T> {
    pub fn kind(&self) -> StepperKind {
        match self {
            Stepper::Euler(_) => StepperKind::Euler,
            Stepper::Rk2(_) => StepperKind::Rk2,
            Stepper::Rk4(_) => StepperKind::Rk4,
            Stepper::Verlet(_) => StepperKind::Verlet,
        }
    }
}

impl<T: Scalar> Steppable<T> for Stepper<T> {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<()> {
        match self {
            Stepper::Euler(s) => s.step(system, t, state, dt),
            Stepper::Rk2(s) => s.step(system, t, state, dt),
            Stepper::Rk4(s) => s.step(system, t, state, dt),
            Stepper::Verlet(s) => s.step(system, t, state, dt),
        }
    }
}

/// Adapts a borrowed parameter block and a plain function to `DynamicalSystem`.
struct ParamFn<'a, F, P: ?Sized> {
    dim: usize,
    func: F,
    params: &'a P,
}

impl<T, F, P> DynamicalSystem<T> for ParamFn<'_, F, P>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
    P: ?Sized,
{
    fn dimension(&self) -> usize {
        self.dim
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        (self.func)(t, x, self.params, out)
    }
}

fn one_shot<T, F, P, S>(
    mut stepper: S,
    t: T,
    dt: T,
    state: &mut [T],
    func: F,
    dimension: usize,
    params: &P,
) -> Result<()>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
    P: ?Sized,
    S: Steppable<T>,
{
    if dimension != state.len() {
        return Err(NumericsError::invalid(format!(
            "declared dimension {} does not match state length {}",
            dimension,
            state.len()
        )));
    }
    let system = ParamFn {
        dim: dimension,
        func,
        params,
    };
    let mut time = t;
    stepper.step(&system, &mut time, state, dt)
}

/// One explicit Euler step on `state`, allocating its scratch on the spot.
/// Prefer [`Euler`] inside loops.
pub fn euler_step<T, F, P>(
    t: T,
    dt: T,
    state: &mut [T],
    func: F,
    dimension: usize,
    params: &P,
) -> Result<()>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
    P: ?Sized,
{
    one_shot(Euler::new(dimension), t, dt, state, func, dimension, params)
}

pub fn rk2_step<T, F, P>(
    t: T,
    dt: T,
    state: &mut [T],
    func: F,
    dimension: usize,
    params: &P,
) -> Result<()>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
    P: ?Sized,
{
    one_shot(RK2::new(dimension), t, dt, state, func, dimension, params)
}

pub fn rk4_step<T, F, P>(
    t: T,
    dt: T,
    state: &mut [T],
    func: F,
    dimension: usize,
    params: &P,
) -> Result<()>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
    P: ?Sized,
{
    one_shot(RK4::new(dimension), t, dt, state, func, dimension, params)
}

pub fn verlet_step<T, F, P>(
    t: T,
    dt: T,
    state: &mut [T],
    func: F,
    dimension: usize,
    params: &P,
) -> Result<()>
where
    T: Scalar,
    F: Fn(T, &[T], &P, &mut [T]),
    P: ?Sized,
{
    one_shot(Verlet::new(dimension), t, dt, state, func, dimension, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::Ode;
    use std::cell::Cell;

    struct Counting<'a> {
        dim: usize,
        calls: &'a Cell<usize>,
    }

    impl DynamicalSystem<f64> for Counting<'_> {
        fn dimension(&self) -> usize {
            self.dim
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            self.calls.set(self.calls.get() + 1);
            for (o, v) in out.iter_mut().zip(x) {
                *o = -v;
            }
        }
    }

    fn decay() -> Ode<f64, impl Fn(f64, &[f64], &(), &mut [f64]), ()> {
        Ode::new(1, |_t: f64, y: &[f64], _p: &(), out: &mut [f64]| out[0] = -y[0])
    }

    #[test]
    fn steppers_use_documented_evaluation_counts() {
        for kind in [
            StepperKind::Euler,
            StepperKind::Rk2,
            StepperKind::Rk4,
            StepperKind::Verlet,
        ] {
            let calls = Cell::new(0);
            let system = Counting { dim: 4, calls: &calls };
            let mut stepper = kind.build::<f64>(4);
            let mut state = vec![1.0, 2.0, 3.0, 4.0];
            let mut t = 0.0;
            stepper
                .step(&system, &mut t, &mut state, 0.1)
                .expect("step should succeed");
            assert_eq!(calls.get(), kind.evaluations(), "{kind}");
            assert_eq!(state.len(), 4);
            assert!((t - 0.1).abs() < 1e-15);
        }
    }

    #[test]
    fn euler_step_matches_formula() {
        let mut state = [2.0];
        let mut t = 0.0;
        Euler::new(1)
            .step(&decay(), &mut t, &mut state, 0.1)
            .unwrap();
        assert!((state[0] - 1.8).abs() < 1e-15);
    }

    #[test]
    fn rk2_step_matches_taylor_to_second_order() {
        let mut state = [1.0];
        let mut t = 0.0;
        RK2::new(1).step(&decay(), &mut t, &mut state, 0.1).unwrap();
        // 1 - h + h^2/2
        assert!((state[0] - 0.905).abs() < 1e-15);
    }

    #[test]
    fn rk4_step_matches_taylor_to_fourth_order() {
        let h: f64 = 0.1;
        let mut state = [1.0];
        let mut t = 0.0;
        RK4::new(1).step(&decay(), &mut t, &mut state, h).unwrap();
        let taylor = 1.0 - h + h * h / 2.0 - h.powi(3) / 6.0 + h.powi(4) / 24.0;
        assert!((state[0] - taylor).abs() < 1e-15);
    }

    #[test]
    fn rk4_passes_stage_times() {
        // y' = t integrates exactly with RK4 through its stage times
        let system = Ode::new(1, |t: f64, _y: &[f64], _p: &(), out: &mut [f64]| out[0] = t * t);
        let mut state = [0.0];
        let mut t = 1.0;
        RK4::new(1).step(&system, &mut t, &mut state, 1.0).unwrap();
        assert!((state[0] - 7.0 / 3.0).abs() < 1e-14);
        assert_eq!(t, 2.0);
    }

    #[test]
    fn verlet_uniform_acceleration_is_exact() {
        // free fall: x'' = -g
        let g = 9.81;
        let system = Ode::with_params(2, g, |_t: f64, y: &[f64], g: &f64, out: &mut [f64]| {
            out[0] = y[1];
            out[1] = -g;
        });
        let mut state = [0.0, 5.0];
        let mut t = 0.0;
        let mut verlet = Verlet::new(2);
        for _ in 0..10 {
            verlet.step(&system, &mut t, &mut state, 0.1).unwrap();
        }
        assert!((state[0] - (5.0 - 0.5 * g)).abs() < 1e-12);
        assert!((state[1] - (5.0 - g)).abs() < 1e-12);
    }

    #[test]
    fn verlet_rejects_odd_dimension() {
        let calls = Cell::new(0);
        let system = Counting { dim: 3, calls: &calls };
        let mut state = vec![1.0, 2.0, 3.0];
        let mut t = 0.0;
        let err = Verlet::new(3)
            .step(&system, &mut t, &mut state, 0.1)
            .expect_err("odd dimension");
        assert!(err.is_invalid_argument());
        assert_eq!(calls.get(), 0);
        assert_eq!(state, vec![1.0, 2.0, 3.0]);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn steppers_reject_dimension_mismatch() {
        let calls = Cell::new(0);
        let system = Counting { dim: 3, calls: &calls };
        let mut t = 0.0;

        let mut state = vec![1.0, 2.0];
        let err = RK4::new(2).step(&system, &mut t, &mut state, 0.1).unwrap_err();
        assert!(err.to_string().contains("system dimension 3"));

        let mut state = vec![1.0, 2.0, 3.0];
        let err = Euler::new(2).step(&system, &mut t, &mut state, 0.1).unwrap_err();
        assert!(err.to_string().contains("built for dimension 2"));

        let empty = Counting { dim: 0, calls: &calls };
        let err = RK2::new(0).step(&empty, &mut t, &mut [], 0.1).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(calls.get(), 0);
    }

    struct Spring {
        k: f64,
    }

    fn spring(_t: f64, y: &[f64], p: &Spring, out: &mut [f64]) {
        out[0] = y[1];
        out[1] = -p.k * y[0];
    }

    #[test]
    fn free_functions_thread_params() {
        let params = Spring { k: 4.0 };
        let mut a = [1.0, 0.0];
        let mut b = [1.0, 0.0];
        rk4_step(0.0, 0.01, &mut a, spring, 2, &params).unwrap();

        let system = Ode::with_params(2, Spring { k: 4.0 }, spring);
        let mut t = 0.0;
        RK4::new(2).step(&system, &mut t, &mut b, 0.01).unwrap();
        assert_eq!(a, b);

        euler_step(0.0, 0.01, &mut a, spring, 2, &params).unwrap();
        rk2_step(0.0, 0.01, &mut a, spring, 2, &params).unwrap();
        verlet_step(0.0, 0.01, &mut a, spring, 2, &params).unwrap();
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn free_functions_accept_slice_params() {
        let params = [10.0, 28.0, 8.0 / 3.0];
        let lorenz = |_t: f64, y: &[f64], p: &[f64], out: &mut [f64]| {
            out[0] = p[0] * (y[1] - y[0]);
            out[1] = y[0] * (p[1] - y[2]) - y[1];
            out[2] = y[0] * y[1] - p[2] * y[2];
        };
        let mut state = [1.0, 1.0, 1.0];
        rk4_step(0.0, 1e-3, &mut state, lorenz, 3, &params[..]).unwrap();
        assert!(state[0] > 1.0 - 1e-3 && state[1] > 1.0);
    }

    #[test]
    fn free_functions_check_declared_dimension() {
        let params = Spring { k: 1.0 };
        let mut state = [1.0, 0.0];
        let err = euler_step(0.0, 0.1, &mut state, spring, 3, &params).unwrap_err();
        assert!(err.is_invalid_argument());
        let mut odd = [1.0, 0.0, 0.0];
        let odd_fn = |_t: f64, _y: &[f64], _p: &(), out: &mut [f64]| out.fill(0.0);
        assert!(verlet_step(0.0, 0.1, &mut odd, odd_fn, 3, &())
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn stepper_kind_parses_and_prints() {
        assert_eq!("rk4".parse::<StepperKind>().unwrap(), StepperKind::Rk4);
        assert_eq!(" Leapfrog ".parse::<StepperKind>().unwrap(), StepperKind::Verlet);
        assert_eq!(StepperKind::Rk2.to_string(), "rk2");
        assert!("tsit5".parse::<StepperKind>().is_err());
        assert_eq!(StepperKind::Euler.build::<f64>(2).kind(), StepperKind::Euler);
    }

    #[test]
    fn steppers_work_with_f32() {
        let system = Ode::new(1, |_t: f32, y: &[f32], _p: &(), out: &mut [f32]| out[0] = -y[0]);
        let mut state = [1.0f32];
        let mut t = 0.0f32;
        RK4::new(1).step(&system, &mut t, &mut state, 0.1).unwrap();
        assert!((state[0] - (-0.1f32).exp()).abs() < 1e-6);
    }
}
