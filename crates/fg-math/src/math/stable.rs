//! Numerically stable primitives for log-domain factor math.
//!
//! Long products of small potentials underflow quickly in linear space; these
//! helpers let callers move a table into log space, reduce it there, and come
//! back out with a distribution that still sums to one.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Turn log-weights into probabilities that sum to one.
///
/// Returns None when every weight is -inf (no support) or any is NaN.
pub fn log_normalize(log_weights: &[f64]) -> Option<Vec<f64>> {
    let log_z = log_sum_exp(log_weights);
    if !log_z.is_finite() {
        return None;
    }
    Some(log_weights.iter().map(|w| (w - log_z).exp()).collect())
}

/// Natural log of a non-negative weight, mapping zero to -inf.
pub fn ln_weight(w: f64) -> f64 {
    if w <= 0.0 {
        f64::NEG_INFINITY
    } else {
        w.ln()
    }
}
