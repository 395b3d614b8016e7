use crate::error::{NumericsError, Result};
use crate::traits::{DynamicalSystem, Steppable};
use log::debug;
use serde::Serialize;

/// Advances `state` by `steps` fixed steps of size `dt`, calling `observer` with the
/// new time and state after every step. Returns the final time.
pub fn integrate<S, D>(
    stepper: &mut S,
    system: &D,
    t0: f64,
    state: &mut [f64],
    dt: f64,
    steps: usize,
    mut observer: impl FnMut(f64, &[f64]),
) -> Result<f64>
where
    S: Steppable<f64>,
    D: DynamicalSystem<f64>,
{
    if !dt.is_finite() || dt == 0.0 {
        return Err(NumericsError::invalid(format!(
            "step size must be finite and non-zero, got {dt}"
        )));
    }

    debug!(
        "integrating {} steps of dt = {} from t = {} (dimension {})",
        steps,
        dt,
        t0,
        state.len()
    );
    let mut t = t0;
    for _ in 0..steps {
        stepper.step(system, &mut t, state, dt)?;
        observer(t, &*state);
    }
    debug!("integration finished at t = {t}");
    Ok(t)
}

/// Sampled solution of an integration run.
///
/// `states` is flattened row-major: sample `i` occupies
/// `states[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trajectory {
    pub dimension: usize,
    pub times: Vec<f64>,
    pub states: Vec<f64>,
}

impl Trajectory {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            times: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn push(&mut self, t: f64, state: &[f64]) {
        debug_assert_eq!(state.len(), self.dimension);
        self.times.push(t);
        self.states.extend_from_slice(state);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn sample(&self, index: usize) -> Option<(f64, &[f64])> {
        let t = *self.times.get(index)?;
        let start = index * self.dimension;
        Some((t, &self.states[start..start + self.dimension]))
    }

    pub fn last(&self) -> Option<(f64, &[f64])> {
        self.len().checked_sub(1).and_then(|i| self.sample(i))
    }

    /// Integrates like [`integrate`] and keeps the initial state plus every
    /// `stride`-th step.
    pub fn record<S, D>(
        stepper: &mut S,
        system: &D,
        t0: f64,
        state: &mut [f64],
        dt: f64,
        steps: usize,
        stride: usize,
    ) -> Result<Self>
    where
        S: Steppable<f64>,
        D: DynamicalSystem<f64>,
    {
        if stride == 0 {
            return Err(NumericsError::invalid("stride must be at least 1"));
        }
        let mut trajectory = Trajectory::new(state.len());
        trajectory.push(t0, state);
        let mut counter = 0usize;
        integrate(stepper, system, t0, state, dt, steps, |t, y| {
            counter += 1;
            if counter % stride == 0 {
                trajectory.push(t, y);
            }
        })?;
        Ok(trajectory)
    }
}
