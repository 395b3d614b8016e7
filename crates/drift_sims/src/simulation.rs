use anyhow::{bail, Context, Result};
use drift_core::solvers::{Stepper, StepperKind};
use drift_core::traits::{DynamicalSystem, Steppable};
use drift_core::trajectory::{integrate, Trajectory};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub stepper: StepperKind,
    pub dt: f64,
    pub steps: usize,
    /// Record every `stride`-th step.
    pub stride: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stepper: StepperKind::Rk4,
            dt: 1e-3,
            steps: 10_000,
            stride: 1,
        }
    }
}

impl SimulationConfig {
    /// Default settings with the stepper picked by name (`euler`, `rk2`, `rk4`, `verlet`).
    pub fn with_stepper(name: &str) -> Result<Self> {
        let stepper = name
            .parse::<StepperKind>()
            .with_context(|| format!("Failed to select stepper \"{name}\"."))?;
        Ok(Self {
            stepper,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt == 0.0 {
            bail!("Step size dt must be finite and non-zero.");
        }
        if self.steps == 0 {
            bail!("Simulation requires at least one integration step.");
        }
        if self.stride == 0 {
            bail!("stride must be at least 1.");
        }
        Ok(())
    }
}

/// A system, its current state and time, and the stepper that advances them.
pub struct Simulation<S: DynamicalSystem<f64>> {
    system: S,
    state: Vec<f64>,
    t: f64,
    stepper: Stepper<f64>,
    config: SimulationConfig,
}

impl<S: DynamicalSystem<f64>> Simulation<S> {
    pub fn new(
        system: S,
        initial_state: &[f64],
        initial_time: f64,
        config: SimulationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let dim = system.dimension();
        if dim == 0 {
            bail!("System has zero dimension.");
        }
        if initial_state.len() != dim {
            bail!(
                "Initial state dimension mismatch. Expected {}, got {}.",
                dim,
                initial_state.len()
            );
        }
        if config.stepper == StepperKind::Verlet && dim % 2 != 0 {
            bail!(
                "Verlet needs positions and velocities in equal halves; dimension {} is odd.",
                dim
            );
        }

        debug!(
            "new simulation: dimension {}, stepper {}, dt {}",
            dim, config.stepper, config.dt
        );
        Ok(Self {
            system,
            state: initial_state.to_vec(),
            t: initial_time,
            stepper: config.stepper.build(dim),
            config,
        })
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<()> {
        if state.len() != self.state.len() {
            bail!(
                "State dimension mismatch. Expected {}, got {}.",
                self.state.len(),
                state.len()
            );
        }
        self.state.copy_from_slice(state);
        Ok(())
    }

    pub fn set_time(&mut self, t: f64) {
        self.t = t;
    }

    /// Advances by a single step of the configured size.
    pub fn step(&mut self) -> Result<()> {
        let t = self.t;
        self.stepper
            .step(&self.system, &mut self.t, &mut self.state, self.config.dt)
            .with_context(|| format!("{} step failed at t = {}", self.config.stepper, t))
    }

    /// Runs the configured number of steps from the current state and returns the
    /// recorded samples, starting with the current state.
    pub fn run(&mut self) -> Result<Trajectory> {
        let stride = self.config.stride;
        let mut trajectory = Trajectory::new(self.state.len());
        trajectory.push(self.t, &self.state);

        let mut counter = 0usize;
        let t_end = integrate(
            &mut self.stepper,
            &self.system,
            self.t,
            &mut self.state,
            self.config.dt,
            self.config.steps,
            |t, y| {
                counter += 1;
                if counter % stride == 0 {
                    trajectory.push(t, y);
                }
            },
        )
        .with_context(|| format!("Simulation run from t = {} failed.", self.t))?;

        debug!(
            "simulation recorded {} samples up to t = {}",
            trajectory.len(),
            t_end
        );
        self.t = t_end;
        Ok(trajectory)
    }
}
