//! Statistics, Monte-Carlo integration and an Euler-Maruyama stepper.
//!
//! Nothing in here owns a hidden generator: every routine draws from an `Rng`
//! supplied by the caller, so runs are reproducible from a seed.

use crate::error::{NumericsError, Result};
use rand::Rng;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(NumericsError::invalid("mean of an empty sample"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Result<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// Two independent standard normal samples (Marsaglia polar method).
pub fn gaussian_pair<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    loop {
        let u = rng.gen::<f64>() * 2.0 - 1.0;
        let v = rng.gen::<f64>() * 2.0 - 1.0;
        let r = u * u + v * v;
        if r > 0.0 && r < 1.0 {
            let m = (-2.0 * r.ln() / r).sqrt();
            return (u * m, v * m);
        }
    }
}

/// Volume of the axis-aligned box given as `(min, max)` per dimension.
pub fn domain_volume(bounds: &[(f64, f64)]) -> f64 {
    bounds.iter().map(|(lo, hi)| hi - lo).product()
}

fn check_samples(samples: usize) -> Result<()> {
    if samples == 0 {
        return Err(NumericsError::invalid("sample count must be greater than zero"));
    }
    Ok(())
}

/// Plain Monte-Carlo estimate of the integral of `integrand` over a box.
pub fn mc_integrate<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: &[(f64, f64)],
    samples: usize,
    integrand: impl Fn(&[f64]) -> f64,
) -> Result<f64> {
    check_samples(samples)?;
    if bounds.is_empty() {
        return Err(NumericsError::invalid("integration domain has no dimensions"));
    }
    if bounds.iter().any(|(lo, hi)| !(lo.is_finite() && hi.is_finite())) {
        return Err(NumericsError::invalid("integration domain must be finite"));
    }

    let mut x = vec![0.0; bounds.len()];
    let mut sum = 0.0;
    for _ in 0..samples {
        for (xi, (lo, hi)) in x.iter_mut().zip(bounds) {
            *xi = lo + rng.gen::<f64>() * (hi - lo);
        }
        sum += integrand(&x);
    }
    Ok(domain_volume(bounds) * sum / samples as f64)
}

/// Monte-Carlo integral of `f` over the part of a rectangle selected by `region`.
pub fn mc_integrate_2d<R: Rng + ?Sized>(
    rng: &mut R,
    region: impl Fn(f64, f64) -> bool,
    x: (f64, f64),
    y: (f64, f64),
    samples: usize,
    f: impl Fn(f64, f64) -> f64,
) -> Result<f64> {
    check_samples(samples)?;
    let area = (x.1 - x.0) * (y.1 - y.0);
    if !area.is_finite() {
        return Err(NumericsError::invalid("integration domain must be finite"));
    }
    let mut sum = 0.0;
    for _ in 0..samples {
        let px = x.0 + rng.gen::<f64>() * (x.1 - x.0);
        let py = y.0 + rng.gen::<f64>() * (y.1 - y.0);
        if region(px, py) {
            sum += f(px, py);
        }
    }
    Ok(area * sum / samples as f64)
}

/// Right-hand side of an Itô SDE `dy = f(t, y) dt + g(t, y) dW`.
pub trait StochasticSystem {
    fn dimension(&self) -> usize;

    /// Writes the drift `f(t, y)`.
    fn drift(&self, t: f64, y: &[f64], out: &mut [f64]);

    /// Writes the diffusion matrix `g(t, y)`, row-major `dimension × dimension`.
    fn diffusion(&self, t: f64, y: &[f64], out: &mut [f64]);
}

/// Euler-Maruyama stepper that draws its Wiener increments from an owned `Rng`.
pub struct EulerMaruyama<R: Rng> {
    rng: R,
    drift: Vec<f64>,
    diffusion: Vec<f64>,
    dw: Vec<f64>,
}

impl<R: Rng> EulerMaruyama<R> {
    pub fn new(dim: usize, rng: R) -> Self {
        Self {
            rng,
            drift: vec![0.0; dim],
            diffusion: vec![0.0; dim * dim],
            dw: vec![0.0; dim],
        }
    }

    pub fn into_rng(self) -> R {
        self.rng
    }

    /// `y ← y + f dt + g dW` with `dW ~ N(0, dt)` per component; `t` advances by `dt`.
    pub fn step(
        &mut self,
        system: &impl StochasticSystem,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<()> {
        let dim = state.len();
        if dim == 0 {
            return Err(NumericsError::invalid("state vector must not be empty"));
        }
        if system.dimension() != dim || self.drift.len() != dim {
            return Err(NumericsError::invalid(format!(
                "state length {} does not match system dimension {} / stepper dimension {}",
                dim,
                system.dimension(),
                self.drift.len()
            )));
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(NumericsError::invalid(format!(
                "Euler-Maruyama needs a positive step, got {dt}"
            )));
        }

        let t0 = *t;
        system.drift(t0, state, &mut self.drift);
        system.diffusion(t0, state, &mut self.diffusion);

        let scale = dt.sqrt();
        for w in self.dw.iter_mut() {
            *w = gaussian_pair(&mut self.rng).0 * scale;
        }
        for i in 0..dim {
            let row = &self.diffusion[i * dim..(i + 1) * dim];
            let noise: f64 = row.iter().zip(&self.dw).map(|(g, w)| g * w).sum();
            state[i] += self.drift[i] * dt + noise;
        }

        *t = t0 + dt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mean_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values).unwrap(), 5.0);
        assert_eq!(std_dev(&values).unwrap(), 2.0);
        assert!(mean(&[]).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn gaussian_pair_has_unit_moments() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<f64> = (0..20_000)
            .flat_map(|_| {
                let (a, b) = gaussian_pair(&mut rng);
                [a, b]
            })
            .collect();
        assert_abs_diff_eq!(mean(&samples).unwrap(), 0.0, epsilon = 0.03);
        assert_abs_diff_eq!(std_dev(&samples).unwrap(), 1.0, epsilon = 0.03);
    }

    #[test]
    fn seeded_runs_repeat() {
        let run = |seed| {
            mc_integrate(&mut StdRng::seed_from_u64(seed), &[(0.0, 1.0)], 100, |x| x[0]).unwrap()
        };
        assert_eq!(run(1), run(1));
        assert_ne!(run(1), run(2));
    }

    #[test]
    fn mc_integrate_unit_cube_polynomial() {
        let mut rng = StdRng::seed_from_u64(42);
        // mean of x + y + z is 2 over a box of volume 2
        let value = mc_integrate(
            &mut rng,
            &[(0.0, 1.0), (0.0, 2.0), (0.0, 1.0)],
            200_000,
            |x| x[0] + x[1] + x[2],
        )
        .unwrap();
        assert_abs_diff_eq!(value, 4.0, epsilon = 0.05);
        assert_eq!(domain_volume(&[(0.0, 1.0), (0.0, 2.0), (0.0, 1.0)]), 2.0);
    }

    #[test]
    fn mc_integrate_2d_estimates_pi() {
        let mut rng = StdRng::seed_from_u64(3);
        let area = mc_integrate_2d(
            &mut rng,
            |x, y| x * x + y * y <= 1.0,
            (-1.0, 1.0),
            (-1.0, 1.0),
            200_000,
            |_, _| 1.0,
        )
        .unwrap();
        assert_abs_diff_eq!(area, std::f64::consts::PI, epsilon = 0.03);
    }

    #[test]
    fn mc_rejects_bad_inputs() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(mc_integrate(&mut rng, &[(0.0, 1.0)], 0, |_| 1.0).is_err());
        assert!(mc_integrate(&mut rng, &[], 10, |_| 1.0).is_err());
        let unbounded = (0.0, f64::INFINITY);
        let result = mc_integrate_2d(&mut rng, |_, _| true, unbounded, (0.0, 1.0), 10, |_, _| 1.0);
        assert!(result.is_err());
    }

    struct Ou {
        theta: f64,
        sigma: f64,
    }

    impl StochasticSystem for Ou {
        fn dimension(&self) -> usize {
            1
        }

        fn drift(&self, _t: f64, y: &[f64], out: &mut [f64]) {
            out[0] = -self.theta * y[0];
        }

        fn diffusion(&self, _t: f64, _y: &[f64], out: &mut [f64]) {
            out[0] = self.sigma;
        }
    }

    #[test]
    fn euler_maruyama_without_noise_is_euler() {
        let system = Ou { theta: 1.0, sigma: 0.0 };
        let mut stepper = EulerMaruyama::new(1, StdRng::seed_from_u64(5));
        let mut state = [1.0];
        let mut t = 0.0;
        stepper.step(&system, &mut t, &mut state, 0.1).unwrap();
        assert!((state[0] - 0.9).abs() < 1e-15);
        assert!((t - 0.1).abs() < 1e-15);
    }

    #[test]
    fn euler_maruyama_ou_stationary_variance() {
        // stationary variance of dX = -θX dt + σ dW is σ²/(2θ)
        let system = Ou { theta: 1.0, sigma: 1.0 };
        let mut stepper = EulerMaruyama::new(1, StdRng::seed_from_u64(11));
        let mut state = [0.0];
        let mut t = 0.0;
        let mut samples = Vec::new();
        for i in 0..1_000_000 {
            stepper.step(&system, &mut t, &mut state, 0.01).unwrap();
            if i > 1_000 && i % 10 == 0 {
                samples.push(state[0]);
            }
        }
        let sd = std_dev(&samples).unwrap();
        assert_abs_diff_eq!(sd * sd, 0.5, epsilon = 0.05);
    }

    #[test]
    fn euler_maruyama_checks_dimensions() {
        let system = Ou { theta: 1.0, sigma: 1.0 };
        let mut stepper = EulerMaruyama::new(2, StdRng::seed_from_u64(0));
        let mut state = [0.0];
        let mut t = 0.0;
        assert!(stepper
            .step(&system, &mut t, &mut state, 0.1)
            .unwrap_err()
            .is_invalid_argument());
    }
}
