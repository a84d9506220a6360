//! Built-in runtime operators.
//!
//! Every script operator lowers to one of these. Comparison and logical
//! operators return 1 or 0 and share [`is_true`] for truthiness.

use crate::math::bool_value;

/// Script truthiness: nonzero and not null.
#[inline]
pub fn is_true(x: f64) -> bool {
    x != 0.0 && !x.is_nan()
}

pub(crate) fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub(crate) fn sub(a: f64, b: f64) -> f64 {
    a - b
}

pub(crate) fn mul(a: f64, b: f64) -> f64 {
    a * b
}

pub(crate) fn div(a: f64, b: f64) -> f64 {
    a / b
}

/// Remainder with the sign of the dividend.
pub(crate) fn rem(a: f64, b: f64) -> f64 {
    a % b
}

pub(crate) fn pow(a: f64, b: f64) -> f64 {
    a.powf(b)
}

pub(crate) fn neg(a: f64) -> f64 {
    -a
}

pub(crate) fn not(a: f64) -> f64 {
    bool_value(!is_true(a))
}

pub(crate) fn truth(a: f64) -> f64 {
    bool_value(is_true(a))
}

pub(crate) fn and(a: f64, b: f64) -> f64 {
    bool_value(is_true(a) && is_true(b))
}

pub(crate) fn or(a: f64, b: f64) -> f64 {
    bool_value(is_true(a) || is_true(b))
}

pub(crate) fn xor(a: f64, b: f64) -> f64 {
    bool_value(is_true(a) != is_true(b))
}

pub(crate) fn eq(a: f64, b: f64) -> f64 {
    bool_value(a == b)
}

pub(crate) fn ne(a: f64, b: f64) -> f64 {
    bool_value(a != b)
}

pub(crate) fn lt(a: f64, b: f64) -> f64 {
    bool_value(a < b)
}

pub(crate) fn le(a: f64, b: f64) -> f64 {
    bool_value(a <= b)
}

pub(crate) fn gt(a: f64, b: f64) -> f64 {
    bool_value(a > b)
}

pub(crate) fn ge(a: f64, b: f64) -> f64 {
    bool_value(a >= b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(is_true(1.0));
        assert!(is_true(-0.5));
        assert!(!is_true(0.0));
        assert!(!is_true(-0.0));
        assert!(!is_true(f64::NAN));
    }

    #[test]
    fn test_logic_uses_truthiness() {
        assert_eq!(and(2.0, f64::NAN), 0.0);
        assert_eq!(or(0.0, 3.0), 1.0);
        assert_eq!(xor(1.0, 1.0), 0.0);
        assert_eq!(xor(1.0, 0.0), 1.0);
        assert_eq!(not(f64::NAN), 1.0);
        assert_eq!(truth(5.0), 1.0);
    }

    #[test]
    fn test_comparisons_with_null_are_false() {
        assert_eq!(eq(f64::NAN, f64::NAN), 0.0);
        assert_eq!(lt(f64::NAN, 1.0), 0.0);
        assert_eq!(ne(f64::NAN, 1.0), 1.0);
    }

    #[test]
    fn test_remainder_keeps_dividend_sign() {
        assert_eq!(rem(7.0, 3.0), 1.0);
        assert_eq!(rem(-7.0, 3.0), -1.0);
    }
}
