//! Math provider implementations.
//!
//! Scalar functions follow IEEE semantics: a NaN (null) argument yields
//! NaN. List reductions ignore null entries and return NaN when nothing
//! is left to reduce.

use smallvec::SmallVec;

pub(crate) fn abs(x: f64) -> f64 {
    x.abs()
}

pub(crate) fn acos(x: f64) -> f64 {
    x.acos()
}

pub(crate) fn asin(x: f64) -> f64 {
    x.asin()
}

pub(crate) fn atan(x: f64) -> f64 {
    x.atan()
}

pub(crate) fn atan2(y: f64, x: f64) -> f64 {
    y.atan2(x)
}

pub(crate) fn ceil(x: f64) -> f64 {
    x.ceil()
}

pub(crate) fn cos(x: f64) -> f64 {
    x.cos()
}

pub(crate) fn deg_to_rad(x: f64) -> f64 {
    x.to_radians()
}

pub(crate) fn exp(x: f64) -> f64 {
    x.exp()
}

pub(crate) fn floor(x: f64) -> f64 {
    x.floor()
}

pub(crate) fn is_inf(x: f64) -> f64 {
    bool_value(x.is_infinite())
}

pub(crate) fn is_nan(x: f64) -> f64 {
    bool_value(x.is_nan())
}

pub(crate) fn ln(x: f64) -> f64 {
    x.ln()
}

pub(crate) fn log_base(x: f64, base: f64) -> f64 {
    x.ln() / base.ln()
}

pub(crate) fn rad_to_deg(x: f64) -> f64 {
    x.to_degrees()
}

/// Round half to even.
pub(crate) fn rint(x: f64) -> f64 {
    x.round_ties_even()
}

/// Round half up, the same rule the identity transform uses.
pub(crate) fn round(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Round half up to `places` decimal places.
pub(crate) fn round_to(x: f64, places: f64) -> f64 {
    let scale = 10f64.powi(places.trunc() as i32);
    (x * scale + 0.5).floor() / scale
}

/// -1, 0 or 1; NaN for NaN.
pub(crate) fn sign(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

pub(crate) fn sin(x: f64) -> f64 {
    x.sin()
}

pub(crate) fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

pub(crate) fn tan(x: f64) -> f64 {
    x.tan()
}

pub(crate) fn null() -> f64 {
    f64::NAN
}

/// Smaller of two values; null if either is null.
pub(crate) fn min2(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

pub(crate) fn max2(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

#[inline]
pub(crate) fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

// ===== List reductions =====

fn valid(values: &[f64]) -> SmallVec<[f64; 16]> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

pub(crate) fn list_min(values: &[f64]) -> f64 {
    valid(values).into_iter().reduce(f64::min).unwrap_or(f64::NAN)
}

pub(crate) fn list_max(values: &[f64]) -> f64 {
    valid(values).into_iter().reduce(f64::max).unwrap_or(f64::NAN)
}

pub(crate) fn sum(values: &[f64]) -> f64 {
    let values = valid(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    let values = valid(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn median(values: &[f64]) -> f64 {
    let mut values = valid(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Most frequent value; the smallest one on ties.
pub(crate) fn mode(values: &[f64]) -> f64 {
    let mut values = valid(values);
    values.sort_by(f64::total_cmp);
    let mut best = f64::NAN;
    let mut best_count = 0usize;
    let mut i = 0;
    while i < values.len() {
        let run = values[i..].iter().take_while(|v| **v == values[i]).count();
        if run > best_count {
            best = values[i];
            best_count = run;
        }
        i += run;
    }
    best
}

pub(crate) fn range(values: &[f64]) -> f64 {
    list_max(values) - list_min(values)
}

/// Sample variance (n - 1 denominator); null for fewer than two values.
pub(crate) fn variance(values: &[f64]) -> f64 {
    let values = valid(values);
    if values.len() < 2 {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)
}

pub(crate) fn sdev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Number of items, nulls included.
pub(crate) fn length(values: &[f64]) -> f64 {
    values.len() as f64
}
