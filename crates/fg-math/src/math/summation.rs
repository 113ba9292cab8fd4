//! Compensated summation and tolerance-aware comparison.
//!
//! Marginalisation sums many small products. A Neumaier accumulator keeps the
//! rounding error of those sums independent of table size, while still adding
//! terms in exactly the order the caller supplies them.

/// Neumaier (improved Kahan) running sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one term.
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Compensated total so far.
    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for NeumaierSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl FromIterator<f64> for NeumaierSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = NeumaierSum::new();
        acc.extend(iter);
        acc
    }
}

/// Compensated sum of an iterator, in iteration order.
pub fn stable_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().collect::<NeumaierSum>().total()
}

/// Approximate equality with a tolerance that is absolute near zero and
/// relative for large magnitudes.
///
/// NaN never compares equal; infinities compare equal only to the same
/// signed infinity.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}
