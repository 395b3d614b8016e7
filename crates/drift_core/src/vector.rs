use nalgebra::Vector3;

/// `x^n` for a natural exponent by repeated multiplication. `x^0 == 1`.
pub fn npow(x: f64, n: u32) -> f64 {
    let mut prod = 1.0;
    for _ in 0..n {
        prod *= x;
    }
    prod
}

/// `n!` accumulated in floating point.
pub fn factorial(n: u32) -> f64 {
    (2..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Returns whichever argument has the smaller magnitude (`a` on ties).
pub fn min_abs(a: f64, b: f64) -> f64 {
    if b.abs() < a.abs() {
        b
    } else {
        a
    }
}

/// Returns whichever argument has the larger magnitude (`a` on ties).
pub fn max_abs(a: f64, b: f64) -> f64 {
    if b.abs() > a.abs() {
        b
    } else {
        a
    }
}

pub fn norm_2d(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

pub fn norm_3d(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

pub fn norm_nd(v: &[f64]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}

/// Vector product `a × b`.
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    let c = Vector3::from(*a).cross(&Vector3::from(*b));
    [c.x, c.y, c.z]
}
