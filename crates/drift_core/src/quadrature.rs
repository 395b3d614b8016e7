use crate::error::{NumericsError, Result};
use std::f64::consts::PI;

fn check_bounds(left: f64, right: f64) -> Result<()> {
    if !(left.is_finite() && right.is_finite()) {
        return Err(NumericsError::invalid(format!(
            "integration bounds must be finite, got [{left}, {right}]"
        )));
    }
    Ok(())
}

fn check_intervals(n: usize) -> Result<()> {
    if n == 0 {
        return Err(NumericsError::invalid(
            "number of subintervals must be greater than zero",
        ));
    }
    Ok(())
}

fn check_width(dx: f64) -> Result<()> {
    if !(dx.is_finite() && dx > 0.0) {
        return Err(NumericsError::invalid(format!(
            "step width must be positive and finite, got {dx}"
        )));
    }
    Ok(())
}

/// Composite trapezoidal rule over `[left, right]` with `n` equal subintervals.
pub fn integrate_trapezoid(f: impl Fn(f64) -> f64, left: f64, right: f64, n: usize) -> Result<f64> {
    check_bounds(left, right)?;
    check_intervals(n)?;

    let h = (right - left) / n as f64;
    let mut sum = 0.0;
    for i in 0..n {
        let x_i = left + i as f64 * h;
        let x_next = left + (i + 1) as f64 * h;
        sum += (f(x_i) + f(x_next)) * h / 2.0;
    }
    Ok(sum)
}

/// Composite Simpson rule over `[0, x_upper]` with `n` panels.
///
/// Every panel is sampled at both ends and its own midpoint, so the rule is exact
/// for polynomials up to degree three for any `n`.
pub fn integrate_simpson(f: impl Fn(f64) -> f64, x_upper: f64, n: usize) -> Result<f64> {
    check_bounds(0.0, x_upper)?;
    check_intervals(n)?;
    Ok(simpson_panels(&f, 0.0, x_upper / n as f64, n))
}

fn simpson_panels(f: &impl Fn(f64) -> f64, left: f64, h: f64, n: usize) -> f64 {
    let mut sum = 0.0;
    for i in 0..n {
        let x_i = left + h * i as f64;
        let m_i = left + h * (i as f64 + 0.5);
        let x_next = left + h * (i + 1) as f64;
        sum += (f(x_i) + 4.0 * f(m_i) + f(x_next)) * h / 6.0;
    }
    sum
}

/// Simpson panels of width `dx` starting at `left`, as many as it takes to cover
/// `right`.
///
/// The final panel is taken whole even when it reaches past `right`, so unless
/// `dx` divides `right - left` the integral runs slightly beyond the upper bound.
/// An empty or reversed interval integrates to zero.
pub fn integrate_simpson_params<P>(
    f: impl Fn(f64, &P) -> f64,
    left: f64,
    right: f64,
    dx: f64,
    params: &P,
) -> Result<f64> {
    check_bounds(left, right)?;
    check_width(dx)?;

    let panels = panel_count(right - left, dx)?;
    let mut sum = 0.0;
    for i in 0..panels {
        let x_i = left + i as f64 * dx;
        let m_i = left + (i as f64 + 0.5) * dx;
        let x_next = left + (i + 1) as f64 * dx;
        sum += (f(x_i, params) + 4.0 * f(m_i, params) + f(x_next, params)) * dx / 6.0;
    }
    Ok(sum)
}

/// Number of `dx`-wide panels needed to cover `span`. A quotient within a few ulps
/// above a whole number counts as that number.
fn panel_count(span: f64, dx: f64) -> Result<usize> {
    if span <= 0.0 {
        return Ok(0);
    }
    let panels = (span / dx * (1.0 - 4.0 * f64::EPSILON)).ceil();
    if !(panels.is_finite() && panels < usize::MAX as f64) {
        return Err(NumericsError::invalid(format!(
            "step width {dx} is too small to cover an interval of length {span}"
        )));
    }
    Ok(panels as usize)
}

/// Midpoint rule on the rectangle `[x.0, x.1] × [y.0, y.1]` with square cells of
/// side `dx`, counting only cells whose centre lies in `region`.
pub fn integrate_midpoint_2d(
    region: impl Fn(f64, f64) -> bool,
    x: (f64, f64),
    y: (f64, f64),
    dx: f64,
    f: impl Fn(f64, f64) -> f64,
) -> Result<f64> {
    check_bounds(x.0, x.1)?;
    check_bounds(y.0, y.1)?;
    check_width(dx)?;

    let n_x = ((x.1 - x.0) / dx).max(0.0) as usize;
    let n_y = ((y.1 - y.0) / dx).max(0.0) as usize;
    let mut sum = 0.0;
    for i_x in 0..n_x {
        let cx = x.0 + (i_x as f64 + 0.5) * dx;
        for i_y in 0..n_y {
            let cy = y.0 + (i_y as f64 + 0.5) * dx;
            if region(cx, cy) {
                sum += f(cx, cy);
            }
        }
    }
    Ok(dx * dx * sum)
}

fn erf_integrand(y: f64) -> f64 {
    2.0 * (-y * y).exp() / PI.sqrt()
}

fn erf_panels(x: f64, dx: f64) -> Result<usize> {
    check_bounds(0.0, x)?;
    check_width(dx)?;
    // at least one panel so that tiny |x| still integrates
    Ok(((x.abs() / dx) as usize).max(1))
}

/// `erf(x)` by Simpson quadrature with panels of roughly `dx`.
pub fn erf_simpson(x: f64, dx: f64) -> Result<f64> {
    let n = erf_panels(x, dx)?;
    if x == 0.0 {
        return Ok(0.0);
    }
    Ok(simpson_panels(&erf_integrand, 0.0, x / n as f64, n))
}

/// `erf(x)` by the midpoint rule with panels of roughly `dx`.
pub fn erf_midpoint(x: f64, dx: f64) -> Result<f64> {
    let n = erf_panels(x, dx)?;
    if x == 0.0 {
        return Ok(0.0);
    }
    let h = x / n as f64;
    Ok((0..n).map(|i| erf_integrand((i as f64 + 0.5) * h) * h).sum())
}
