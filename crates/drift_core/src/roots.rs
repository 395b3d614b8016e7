use crate::differentiate::{central_difference, check_delta};
use crate::error::{NumericsError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// A converged root together with the number of iterations spent on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub root: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BisectionSettings {
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for BisectionSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iter: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewtonSettings {
    /// Step of the central-difference derivative.
    pub delta: f64,
    pub rel_tol: f64,
    pub max_iter: usize,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            delta: 1e-6,
            rel_tol: 1e-10,
            max_iter: 50,
        }
    }
}

pub fn bisect(
    f: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    settings: &BisectionSettings,
) -> Result<Root> {
    find_root_bisection(f, a, b, settings.tolerance, settings.max_iter)
}

pub fn newton(f: impl Fn(f64) -> f64, x0: f64, settings: &NewtonSettings) -> Result<Root> {
    find_root_newton_raphson(f, x0, settings.delta, settings.rel_tol, settings.max_iter)
}

/// Bisection on the bracket `[a, b]`.
///
/// Requires a sign change between `f(a)` and `f(b)`. Stops once both bracket ends
/// evaluate below `epsilon` in magnitude (or the midpoint hits an exact zero) and
/// returns the last midpoint.
pub fn find_root_bisection(
    f: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    epsilon: f64,
    max_iter: usize,
) -> Result<Root> {
    if !(a.is_finite() && b.is_finite()) {
        return Err(NumericsError::invalid("bracket bounds must be finite"));
    }
    if a == b {
        return Err(NumericsError::invalid(format!(
            "bracket [{a}, {b}] has zero length"
        )));
    }
    if !(epsilon > 0.0) {
        return Err(NumericsError::invalid("epsilon must be positive"));
    }
    if max_iter == 0 {
        return Err(NumericsError::invalid("max_iter must be greater than zero"));
    }

    let (mut a, mut b) = (a, b);
    let (mut f_a, mut f_b) = (f(a), f(b));
    if f_a == 0.0 {
        return Ok(Root { root: a, iterations: 0 });
    }
    if f_b == 0.0 {
        return Ok(Root { root: b, iterations: 0 });
    }
    if f_a.is_nan() || f_b.is_nan() || (f_a < 0.0) == (f_b < 0.0) {
        return Err(NumericsError::degenerate(format!(
            "no sign change on [{a}, {b}] (f(a) = {f_a}, f(b) = {f_b})"
        )));
    }

    let mut mid = 0.5 * (a + b);
    for iteration in 1..=max_iter {
        mid = 0.5 * (a + b);
        let f_mid = f(mid);
        if f_mid == 0.0 {
            debug!("bisection hit exact root {mid} after {iteration} iterations");
            return Ok(Root {
                root: mid,
                iterations: iteration,
            });
        }
        if (f_mid < 0.0) != (f_b < 0.0) {
            a = mid;
            f_a = f_mid;
        } else {
            b = mid;
            f_b = f_mid;
        }
        if f_a.abs() < epsilon && f_b.abs() < epsilon {
            debug!("bisection converged to {mid} after {iteration} iterations");
            return Ok(Root {
                root: mid,
                iterations: iteration,
            });
        }
    }

    warn!("bisection exhausted {max_iter} iterations at {mid}");
    Err(NumericsError::NonConvergence {
        method: "bisection",
        iterations: max_iter,
        estimate: mid,
    })
}

/// Newton-Raphson iteration `x ← x - f(x)/f'(x)` with a central-difference `f'`.
///
/// Converges when the relative change of `x` drops below `rel_tol` (absolute change
/// when `x` lands on zero).
pub fn find_root_newton_raphson(
    f: impl Fn(f64) -> f64,
    x0: f64,
    delta: f64,
    rel_tol: f64,
    max_iter: usize,
) -> Result<Root> {
    check_delta(delta)?;
    if !x0.is_finite() {
        return Err(NumericsError::invalid("initial guess must be finite"));
    }
    if !(rel_tol > 0.0) {
        return Err(NumericsError::invalid("rel_tol must be positive"));
    }
    if max_iter == 0 {
        return Err(NumericsError::invalid("max_iter must be greater than zero"));
    }

    let mut x = x0;
    for iteration in 1..=max_iter {
        let value = f(x);
        if value == 0.0 {
            return Ok(Root {
                root: x,
                iterations: iteration - 1,
            });
        }
        let slope = central_difference(x, delta, &f)?;
        let correction = value / slope;
        if slope == 0.0 || !correction.is_finite() {
            return Err(NumericsError::degenerate(format!(
                "derivative vanishes near x = {x} (f'(x) = {slope})"
            )));
        }

        let x_old = x;
        x -= correction;
        if !x.is_finite() {
            return Err(NumericsError::degenerate(format!(
                "Newton iterate diverged from x = {x_old}"
            )));
        }

        let change = if x == 0.0 {
            (x - x_old).abs()
        } else {
            (x - x_old).abs() / x.abs()
        };
        if change < rel_tol {
            debug!("newton-raphson converged to {x} after {iteration} iterations");
            return Ok(Root {
                root: x,
                iterations: iteration,
            });
        }
    }

    warn!("newton-raphson exhausted {max_iter} iterations at {x}");
    Err(NumericsError::NonConvergence {
        method: "newton-raphson",
        iterations: max_iter,
        estimate: x,
    })
}

/// Both real roots of `a x² + b x + c`.
///
/// Each root is taken from whichever formula avoids subtracting nearly equal
/// numbers, so small roots keep their precision when `b² ≫ 4ac`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Result<(f64, f64)> {
    if a == 0.0 {
        return Err(NumericsError::invalid("leading coefficient must be non-zero"));
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Err(NumericsError::degenerate(format!(
            "negative discriminant {discriminant}: roots are complex"
        )));
    }
    let sqrt_d = discriminant.sqrt();
    if b > 0.0 {
        let q = -b - sqrt_d;
        Ok((2.0 * c / q, q / (2.0 * a)))
    } else {
        let q = -b + sqrt_d;
        if q == 0.0 {
            // b == 0 and c == 0: double root at the origin
            return Ok((0.0, 0.0));
        }
        Ok((q / (2.0 * a), 2.0 * c / q))
    }
}
