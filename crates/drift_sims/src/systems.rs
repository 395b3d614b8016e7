use drift_core::traits::DynamicalSystem;
use drift_core::vector::norm_3d;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const EARTH_GRAVITY: f64 = 9.81;

/// Several independent Lorenz trajectories packed as `[x1, y1, z1, x2, y2, z2, ...]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lorenz {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
    pub trajectories: usize,
}

impl Default for Lorenz {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
            trajectories: 1,
        }
    }
}

impl DynamicalSystem<f64> for Lorenz {
    fn dimension(&self) -> usize {
        3 * self.trajectories
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        for (p, f) in x.chunks_exact(3).zip(out.chunks_exact_mut(3)) {
            f[0] = self.sigma * (p[1] - p[0]);
            f[1] = self.rho * p[0] - p[1] - p[0] * p[2];
            f[2] = p[0] * p[1] - self.beta * p[2];
        }
    }
}

/// Damped pendulum under a periodic drive, state `[theta, theta_v]`:
/// `theta'' = -(g/l) sin(theta) - gamma theta' + A cos(omega t)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DrivenDampedPendulum {
    pub length: f64,
    pub amplitude: f64,
    pub omega: f64,
    pub gamma: f64,
}

impl Default for DrivenDampedPendulum {
    fn default() -> Self {
        Self {
            length: 1.0,
            amplitude: 1.2,
            omega: 2.0 / 3.0,
            gamma: 0.5,
        }
    }
}

impl DrivenDampedPendulum {
    /// Mechanical energy per unit mass, with the pivot as zero of the potential.
    pub fn energy(&self, state: &[f64]) -> f64 {
        0.5 * self.length * self.length * state[1] * state[1]
            - EARTH_GRAVITY * self.length * state[0].cos()
    }
}

impl DynamicalSystem<f64> for DrivenDampedPendulum {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = x[1];
        out[1] = -EARTH_GRAVITY / self.length * x[0].sin() - self.gamma * x[1]
            + self.amplitude * (self.omega * t).cos();
    }
}

/// Three gravitating bodies, state `[r1, r2, r3, v1, v2, v3]` (18 components) so that
/// Verlet sees positions first and velocities second.
///
/// Distances are softened by `smoothing` to keep close encounters finite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThreeBody {
    pub masses: [f64; 3],
    pub g: f64,
    pub smoothing: f64,
}

impl Default for ThreeBody {
    fn default() -> Self {
        Self {
            masses: [10.0, 10.0, 20.0],
            // astronomical units, years and solar masses
            g: 4.0 * PI * PI,
            smoothing: 1.0,
        }
    }
}

impl ThreeBody {
    pub const DIMENSION: usize = 18;

    fn position(state: &[f64], body: usize) -> [f64; 3] {
        [state[3 * body], state[3 * body + 1], state[3 * body + 2]]
    }

    pub fn center_of_mass(&self, state: &[f64]) -> [f64; 3] {
        let total: f64 = self.masses.iter().sum();
        let mut com = [0.0; 3];
        for (body, m) in self.masses.iter().enumerate() {
            let r = Self::position(state, body);
            for axis in 0..3 {
                com[axis] += m * r[axis] / total;
            }
        }
        com
    }

    /// Positions of the bodies relative to the center of mass, `[x1, y1, z1, ..., z3]`.
    pub fn relative_positions(&self, state: &[f64]) -> [f64; 9] {
        let com = self.center_of_mass(state);
        let mut out = [0.0; 9];
        for (i, value) in out.iter_mut().enumerate() {
            *value = state[i] - com[i % 3];
        }
        out
    }

    pub fn total_momentum(&self, state: &[f64]) -> [f64; 3] {
        let mut p = [0.0; 3];
        for (body, m) in self.masses.iter().enumerate() {
            for axis in 0..3 {
                p[axis] += m * state[9 + 3 * body + axis];
            }
        }
        p
    }
}

impl DynamicalSystem<f64> for ThreeBody {
    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[..9].copy_from_slice(&x[9..]);
        out[9..].fill(0.0);

        for i in 0..3 {
            for j in (i + 1)..3 {
                let ri = Self::position(x, i);
                let rj = Self::position(x, j);
                let r = norm_3d(ri[0] - rj[0], ri[1] - rj[1], ri[2] - rj[2]) + self.smoothing;
                let scale = self.g / (r * r * r);
                for axis in 0..3 {
                    let d = ri[axis] - rj[axis];
                    out[9 + 3 * i + axis] -= scale * self.masses[j] * d;
                    out[9 + 3 * j + axis] += scale * self.masses[i] * d;
                }
            }
        }
    }
}
