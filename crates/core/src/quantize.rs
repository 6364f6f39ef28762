//! Per-channel rounding
//!
//! Rounding is half-away-from-zero (`f64::round`), done in f64 and narrowed
//! back to f32. The rounded value is what change detection compares, so this
//! must stay the single place rounding happens.

use can_dash_types::Precision;

/// Round `value` to `precision` decimal places.
///
/// Negative precision rounds to tens, hundreds, ...
pub fn round_to_precision(value: f32, precision: Precision) -> f32 {
    if !value.is_finite() {
        return value;
    }
    let value = f64::from(value);
    let rounded = if precision >= 0 {
        let scale = 10f64.powi(i32::from(precision));
        (value * scale).round() / scale
    } else {
        // Divide rather than multiply by 0.1, 0.01, ... to stay exact on integers
        let factor = 10f64.powi(-i32::from(precision));
        (value / factor).round() * factor
    };
    rounded as f32
}

/// Change-detection equality: exact, except that NaN matches NaN
pub(crate) fn same_reading(a: f32, b: f32) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_precision() {
        assert_eq!(round_to_precision(3.14159, 1), 3.1);
        assert_eq!(round_to_precision(3.14159, 0), 3.0);
        assert_eq!(round_to_precision(3.14159, 2), 3.14);
        assert_eq!(round_to_precision(14.66, 1), 14.7);
    }

    #[test]
    fn test_integer_rounding() {
        assert_eq!(round_to_precision(4999.6, 0), 5000.0);
        assert_eq!(round_to_precision(5000.2, 0), 5000.0);
        assert_eq!(round_to_precision(5000.4, 0), 5000.0);
        assert_eq!(round_to_precision(2.5, 0), 3.0);
        assert_eq!(round_to_precision(-2.5, 0), -3.0);
    }

    #[test]
    fn test_negative_precision() {
        assert_eq!(round_to_precision(1234.0, -1), 1230.0);
        assert_eq!(round_to_precision(1250.0, -2), 1300.0);
        assert_eq!(round_to_precision(5678.9, -3), 6000.0);
    }

    #[test]
    fn test_non_finite_passthrough() {
        assert!(round_to_precision(f32::NAN, 1).is_nan());
        assert_eq!(round_to_precision(f32::INFINITY, 2), f32::INFINITY);
        assert_eq!(round_to_precision(f32::NEG_INFINITY, 0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_same_reading() {
        assert!(same_reading(3.14, 3.14));
        assert!(same_reading(0.0, -0.0));
        assert!(same_reading(f32::NAN, f32::NAN));
        assert!(!same_reading(3.14, 3.15));
        assert!(!same_reading(f32::NAN, 0.0));
    }
}
