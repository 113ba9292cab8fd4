//! Discrete random variables.
//!
//! A variable is an id, an ordered finite domain, and a marginal
//! distribution over that domain. The marginal is evaluated once at
//! construction into a table aligned with the domain, so a variable is an
//! immutable value afterwards.
//!
//! Marginals are expected to sum to one but this is not enforced here;
//! [`Model::unnormalized_marginals`](crate::Model::unnormalized_marginals)
//! reports drift against the configured tolerance.

use crate::error::{Error, Result};
use crate::id::VarId;
use crate::value::Value;
use fg_math::stable_sum;
use serde::Serialize;
use std::collections::HashSet;

/// Default tolerance for [`RandomVariable::marginal_sums_to_one`] checks.
pub const MARGINAL_TOLERANCE: f64 = 1e-6;

/// A discrete random variable with an enumerable outcome domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomVariable {
    id: VarId,
    domain: Vec<Value>,
    marginal: Vec<f64>,
}

impl RandomVariable {
    /// Create a variable, evaluating `marginal` on every outcome.
    ///
    /// Fails with `InvalidVariable` if the domain is empty, repeats an
    /// outcome, or the marginal yields a negative or non-finite value.
    pub fn new(
        id: impl Into<VarId>,
        domain: Vec<Value>,
        marginal: impl Fn(&Value) -> f64,
    ) -> Result<Self> {
        let table = domain.iter().map(&marginal).collect();
        Self::with_table(id, domain, table)
    }

    /// Create a variable from a marginal table aligned with `domain`.
    pub fn with_table(id: impl Into<VarId>, domain: Vec<Value>, marginal: Vec<f64>) -> Result<Self> {
        let id = id.into();
        let invalid = |reason: String| Error::InvalidVariable {
            id: id.to_string(),
            reason,
        };

        if domain.is_empty() {
            return Err(invalid("domain is empty".into()));
        }
        if marginal.len() != domain.len() {
            return Err(invalid(format!(
                "marginal has {} entries for a domain of {}",
                marginal.len(),
                domain.len()
            )));
        }
        let mut seen = HashSet::with_capacity(domain.len());
        for v in &domain {
            if !seen.insert(v) {
                return Err(invalid(format!("outcome {v} appears more than once")));
            }
        }
        for (v, p) in domain.iter().zip(&marginal) {
            if !p.is_finite() || *p < 0.0 {
                return Err(invalid(format!("marginal of {v} is {p}")));
            }
        }

        Ok(Self {
            id,
            domain,
            marginal,
        })
    }

    /// Variable with a uniform marginal.
    pub fn uniform(id: impl Into<VarId>, domain: Vec<Value>) -> Result<Self> {
        let n = domain.len().max(1) as f64;
        let table = vec![1.0 / n; domain.len()];
        Self::with_table(id, domain, table)
    }

    /// Boolean variable with `P(true) = p_true`, domain order `[true, false]`.
    pub fn boolean(id: impl Into<VarId>, p_true: f64) -> Result<Self> {
        Self::with_table(
            id,
            vec![Value::Bool(true), Value::Bool(false)],
            vec![p_true, 1.0 - p_true],
        )
    }

    pub fn id(&self) -> &VarId {
        &self.id
    }

    /// Outcomes in their defined order.
    pub fn domain(&self) -> &[Value] {
        &self.domain
    }

    /// Number of outcomes.
    pub fn cardinality(&self) -> usize {
        self.domain.len()
    }

    /// Position of `value` in the domain.
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.domain.iter().position(|v| v == value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.index_of(value).is_some()
    }

    /// Domain outcome written as `token`, as typed on a command line.
    ///
    /// An outcome whose display form equals `token` wins, so `"1"` names a
    /// text outcome `"1"` in a text domain and the integer `1` in an integer
    /// domain. Two outcomes displaying the same way make the token
    /// ambiguous. Without a match the token is read by
    /// [`Value::parse_token`], which accepts aliases such as `T`.
    pub fn resolve_token(&self, token: &str) -> Result<Value> {
        let mut matches = self.domain.iter().filter(|v| v.to_string() == token);
        match (matches.next(), matches.next()) {
            (Some(v), None) => Ok(v.clone()),
            (Some(_), Some(_)) => Err(Error::InvalidQuery(format!(
                "value '{token}' is ambiguous in the domain of {}",
                self.id
            ))),
            (None, _) => Ok(Value::parse_token(token)),
        }
    }

    /// Marginal probability of an outcome; `None` outside the domain.
    pub fn p(&self, value: &Value) -> Option<f64> {
        self.index_of(value).map(|i| self.marginal[i])
    }

    /// `(outcome, probability)` pairs in domain order.
    pub fn marginal_table(&self) -> impl Iterator<Item = (&Value, f64)> + '_ {
        self.domain.iter().zip(self.marginal.iter().copied())
    }

    pub fn marginal_sum(&self) -> f64 {
        stable_sum(self.marginal.iter().copied())
    }

    pub fn marginal_sums_to_one(&self, tolerance: f64) -> bool {
        (self.marginal_sum() - 1.0).abs() <= tolerance
    }

    /// Expected outcome under the marginal; `None` for non-numeric domains.
    pub fn expected_value(&self) -> Option<f64> {
        let mut terms = Vec::with_capacity(self.domain.len());
        for (v, p) in self.marginal_table() {
            terms.push(v.as_f64()? * p);
        }
        Some(stable_sum(terms))
    }

    /// `E[(X - E[X])^2]`; `None` for non-numeric domains.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.expected_value()?;
        let mut terms = Vec::with_capacity(self.domain.len());
        for (v, p) in self.marginal_table() {
            let d = v.as_f64()? - mean;
            terms.push(d * d * p);
        }
        Some(stable_sum(terms))
    }

    pub fn standard_deviation(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Most probable outcome; the first in domain order on ties.
    pub fn mode(&self) -> &Value {
        let mut best = 0;
        for (i, p) in self.marginal.iter().enumerate() {
            if *p > self.marginal[best] {
                best = i;
            }
        }
        &self.domain[best]
    }
}
