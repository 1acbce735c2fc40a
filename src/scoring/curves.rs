//! Shaping curves that map unbounded raw counts into `[0, 1]`

use std::f64::consts::LN_2;

/// Linear saturation: `v / ceiling`, reaching exactly 1 at the ceiling.
pub fn clamped_ratio(value: f64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 || value <= 0.0 {
        return 0.0;
    }
    if value >= ceiling {
        return 1.0;
    }
    value / ceiling
}

/// Diminishing returns: `ln(1+v) / ln(1+ceiling)`, capped at 1.
pub fn log_curve(value: f64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 || value <= 0.0 {
        return 0.0;
    }
    ((1.0 + value).ln() / (1.0 + ceiling).ln()).min(1.0)
}

/// Freshness with a half-life: 1.0 at `v = 0`, 0.5 at `v = half_life`.
pub fn exp_decay(value: f64, half_life: f64) -> f64 {
    if half_life <= 0.0 {
        return 0.0;
    }
    if value <= 0.0 {
        return 1.0;
    }
    (-value * LN_2 / half_life).exp()
}

// Far above f64 error on scores in [0, 1], far below one rounding step
const ROUNDING_EPSILON: f64 = 1e-9;

/// Round to `precision` decimals, half away from zero.
///
/// Decimal halves that f64 stores just below the midpoint (`0.285` scales to
/// `28.4999…`) still round away from zero.
pub fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    let scaled = value * factor;
    (scaled + scaled.signum() * ROUNDING_EPSILON).round() / factor
}
