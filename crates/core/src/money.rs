//! Money comparison helpers.
//!
//! Amounts are decimal currency values stored as `f64`. Every balance
//! invariant in the system is stated against a one-cent tolerance, so all
//! equality checks go through [`approx_eq`] rather than `==`.

/// Maximum absolute difference treated as equal (one cent).
pub const TOLERANCE: f64 = 0.01;

/// Absorbs binary representation error right at the tolerance boundary
/// (e.g. `100.01 - 100.00` exceeds 0.01 by ~5e-15).
const EPSILON: f64 = 1e-9;

/// True when two amounts differ by at most [`TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE + EPSILON
}

/// Round to two decimal places (cent precision).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_boundary_is_inclusive() {
        assert!(approx_eq(100.00, 100.01));
        assert!(!approx_eq(100.00, 100.011));
    }

    #[test]
    fn round2_rounds_to_cents() {
        assert_eq!(round2(10.016), 10.02);
        assert_eq!(round2(10.004), 10.0);
    }
}
