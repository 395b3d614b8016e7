use crate::error::{NumericsError, Result};

/// Central-difference estimate of `f'(x)`: `(f(x + δ) - f(x - δ)) / 2δ`.
pub fn central_difference(x: f64, delta: f64, f: impl Fn(f64) -> f64) -> Result<f64> {
    check_delta(delta)?;
    Ok((f(x + delta) - f(x - delta)) / (2.0 * delta))
}

pub(crate) fn check_delta(delta: f64) -> Result<()> {
    if !(delta.is_finite() && delta > 0.0) {
        return Err(NumericsError::invalid(format!(
            "difference step must be positive and finite, got {delta}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::central_difference;

    #[test]
    fn central_difference_is_exact_for_quadratics() {
        let d = central_difference(3.0, 0.1, |x| x * x - 2.0).expect("derivative");
        assert!((d - 6.0).abs() < 1e-12);
    }

    #[test]
    fn central_difference_of_sine() {
        let d = central_difference(0.3, 1e-5, f64::sin).expect("derivative");
        assert!((d - 0.3f64.cos()).abs() < 1e-9);
    }

    #[test]
    fn central_difference_rejects_zero_step() {
        let err = central_difference(1.0, 0.0, |x| x).expect_err("zero step");
        assert!(err.is_invalid_argument());
        assert!(central_difference(1.0, f64::NAN, |x| x).is_err());
    }
}
