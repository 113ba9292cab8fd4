//! Discrete factors and factor algebra.
//!
//! A factor maps every joint outcome of its scope to a non-negative real.
//! It is stored as a dense table:
//!
//! ```text
//! scope  = [a, b, c]            sorted by variable id
//! values = row-major over domain order, last scope variable fastest
//! index(a=i, b=j, c=k) = i*|b||c| + j*|c| + k
//! ```
//!
//! Factors are immutable. Reduction, product, and marginalisation return new
//! factors with fresh ids and never touch their inputs, which is what makes
//! concurrent queries over one model safe without locking.
//!
//! Sums run over each variable's domain in its defined order with
//! compensated summation, so results are bit-reproducible for a fixed
//! elimination order.

use crate::assignment::Assignment;
use crate::error::{Error, Result};
use crate::id::{FactorId, VarId};
use crate::variable::RandomVariable;
use crate::value::Value;
use fg_math::{approx_eq, ln_weight, log_sum_exp, NeumaierSum};
use std::sync::Arc;

/// A non-negative function over the joint outcomes of a set of variables.
#[derive(Debug, Clone)]
pub struct Factor {
    id: FactorId,
    scope: Vec<Arc<RandomVariable>>,
    values: Vec<f64>,
}

/// Mixed-radix counter over a scope's domains, last digit fastest.
struct Odometer {
    cards: Vec<usize>,
    digits: Vec<usize>,
}

impl Odometer {
    fn new(cards: Vec<usize>) -> Self {
        let digits = vec![0; cards.len()];
        Self { cards, digits }
    }

    fn digits(&self) -> &[usize] {
        &self.digits
    }

    /// Step to the next combination; false once every one has been seen.
    fn advance(&mut self) -> bool {
        for i in (0..self.cards.len()).rev() {
            self.digits[i] += 1;
            if self.digits[i] < self.cards[i] {
                return true;
            }
            self.digits[i] = 0;
        }
        false
    }
}

fn cards_of(scope: &[Arc<RandomVariable>]) -> Vec<usize> {
    scope.iter().map(|v| v.cardinality()).collect()
}

/// Largest table a factor may hold.
pub const MAX_TABLE_LEN: usize = 1 << 26;

/// Strides of a scope whose table length has already passed
/// [`table_len`], so no product here can exceed [`MAX_TABLE_LEN`].
fn strides_of(scope: &[Arc<RandomVariable>]) -> Vec<usize> {
    let mut strides = vec![1usize; scope.len()];
    for i in (0..scope.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1].saturating_mul(scope[i + 1].cardinality());
    }
    strides
}

/// Number of joint outcomes of `scope`, or `None` past [`MAX_TABLE_LEN`].
fn table_len(scope: &[Arc<RandomVariable>]) -> Option<usize> {
    scope
        .iter()
        .try_fold(1usize, |acc, v| acc.checked_mul(v.cardinality()))
        .filter(|len| *len <= MAX_TABLE_LEN)
}

fn assignment_of(scope: &[Arc<RandomVariable>], digits: &[usize]) -> Assignment {
    scope
        .iter()
        .zip(digits)
        .map(|(var, &d)| (var.id().clone(), var.domain()[d].clone()))
        .collect()
}

fn domain_index(var: &RandomVariable, value: &Value) -> Result<usize> {
    var.index_of(value).ok_or_else(|| {
        Error::scope(format!(
            "value {value} is outside the domain of {}",
            var.id()
        ))
    })
}

impl Factor {
    /// Sort a scope by id and reject repeated variables.
    fn canonical_scope(id: &FactorId, mut scope: Vec<Arc<RandomVariable>>) -> Result<Vec<Arc<RandomVariable>>> {
        scope.sort_by(|a, b| a.id().cmp(b.id()));
        for pair in scope.windows(2) {
            if pair[0].id() == pair[1].id() {
                return Err(Error::InvalidFactor {
                    id: id.to_string(),
                    reason: format!("variable {} appears twice in scope", pair[0].id()),
                });
            }
        }
        Ok(scope)
    }

    fn checked_len(id: &FactorId, scope: &[Arc<RandomVariable>]) -> Result<usize> {
        table_len(scope).ok_or_else(|| Error::InvalidFactor {
            id: id.to_string(),
            reason: format!(
                "scope of {} variables needs more than {MAX_TABLE_LEN} table entries",
                scope.len()
            ),
        })
    }

    fn check_values(id: &FactorId, scope: &[Arc<RandomVariable>], values: &[f64]) -> Result<()> {
        for (i, v) in values.iter().enumerate() {
            if !v.is_finite() || *v < 0.0 {
                let mut digits = vec![0; scope.len()];
                let mut rest = i;
                for (slot, stride) in digits.iter_mut().zip(strides_of(scope)) {
                    *slot = rest / stride;
                    rest %= stride;
                }
                return Err(Error::InvalidFactor {
                    id: id.to_string(),
                    reason: format!("value {v} at {} is not a finite non-negative real", assignment_of(scope, &digits)),
                });
            }
        }
        Ok(())
    }

    /// Build a factor by evaluating `f` on every joint outcome of `scope`.
    ///
    /// `f` receives a full assignment over the scope. It must return a
    /// finite non-negative value everywhere, otherwise `InvalidFactor`.
    pub fn from_fn<F>(id: impl Into<FactorId>, scope: Vec<Arc<RandomVariable>>, f: F) -> Result<Self>
    where
        F: Fn(&Assignment) -> f64,
    {
        let id = id.into();
        let scope = Self::canonical_scope(&id, scope)?;
        let mut values = Vec::with_capacity(Self::checked_len(&id, &scope)?);
        let mut odo = Odometer::new(cards_of(&scope));
        loop {
            values.push(f(&assignment_of(&scope, odo.digits())));
            if !odo.advance() {
                break;
            }
        }
        Self::check_values(&id, &scope, &values)?;
        Ok(Self { id, scope, values })
    }

    /// Build a factor from a table already in canonical order.
    ///
    /// The scope is sorted by id first; `values` must follow that sorted
    /// order with the last variable varying fastest.
    pub fn from_table(id: impl Into<FactorId>, scope: Vec<Arc<RandomVariable>>, values: Vec<f64>) -> Result<Self> {
        let id = id.into();
        let scope = Self::canonical_scope(&id, scope)?;
        let expected = Self::checked_len(&id, &scope)?;
        if values.len() != expected {
            return Err(Error::InvalidFactor {
                id: id.to_string(),
                reason: format!("table has {} entries, scope needs {expected}", values.len()),
            });
        }
        Self::check_values(&id, &scope, &values)?;
        Ok(Self { id, scope, values })
    }

    /// Build a factor from explicit `(assignment, value)` rows.
    ///
    /// Rows must cover every joint outcome exactly once.
    pub fn from_rows<I>(id: impl Into<FactorId>, scope: Vec<Arc<RandomVariable>>, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Assignment, f64)>,
    {
        let id = id.into();
        let scope = Self::canonical_scope(&id, scope)?;
        let mut slots: Vec<Option<f64>> = vec![None; Self::checked_len(&id, &scope)?];
        let probe = Self {
            id: id.clone(),
            scope,
            values: Vec::new(),
        };
        for (assignment, value) in rows {
            let idx = probe.index_of(&assignment)?;
            if slots[idx].replace(value).is_some() {
                return Err(Error::InvalidFactor {
                    id: id.to_string(),
                    reason: format!("row {assignment} given more than once"),
                });
            }
        }
        let mut values = Vec::with_capacity(slots.len());
        for (i, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(v) => values.push(v),
                None => {
                    return Err(Error::InvalidFactor {
                        id: id.to_string(),
                        reason: format!("no row for {}", probe.assignment_at(i)),
                    })
                }
            }
        }
        Self::check_values(&id, &probe.scope, &values)?;
        Ok(Self {
            id,
            scope: probe.scope,
            values,
        })
    }

    /// Factor equal to the product of its scope variables' marginals.
    ///
    /// This is the default potential for an edge when no explicit factor
    /// is supplied.
    pub fn from_joint_vars(scope: Vec<Arc<RandomVariable>>) -> Result<Self> {
        let vars = scope.clone();
        Self::from_fn(FactorId::generate(), scope, move |a| {
            vars.iter()
                .map(|v| a.get(v.id()).and_then(|value| v.p(value)).unwrap_or(0.0))
                .product()
        })
    }

    /// Factor with an empty scope holding a single value.
    pub fn constant(value: f64) -> Result<Self> {
        Self::from_table(FactorId::generate(), Vec::new(), vec![value])
    }

    /// The multiplicative identity.
    pub fn unit() -> Self {
        Self {
            id: FactorId::generate(),
            scope: Vec::new(),
            values: vec![1.0],
        }
    }

    /// All-ones factor over `scope`.
    pub fn ones(scope: Vec<Arc<RandomVariable>>) -> Result<Self> {
        Self::from_fn(FactorId::generate(), scope, |_| 1.0)
    }

    pub fn id(&self) -> &FactorId {
        &self.id
    }

    /// Scope variables, sorted by id.
    pub fn scope(&self) -> &[Arc<RandomVariable>] {
        &self.scope
    }

    pub fn scope_ids(&self) -> impl Iterator<Item = &VarId> + '_ {
        self.scope.iter().map(|v| v.id())
    }

    pub fn contains(&self, var: &VarId) -> bool {
        self.position(var).is_some()
    }

    /// True for an empty scope.
    pub fn is_constant(&self) -> bool {
        self.scope.is_empty()
    }

    /// Number of table entries.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Raw table in canonical order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn position(&self, var: &VarId) -> Option<usize> {
        self.scope.binary_search_by(|v| v.id().cmp(var)).ok()
    }

    fn index_of(&self, assignment: &Assignment) -> Result<usize> {
        if assignment.len() != self.scope.len() {
            return Err(Error::scope(format!(
                "assignment {assignment} does not match the scope of factor {}",
                self.id
            )));
        }
        let strides = strides_of(&self.scope);
        let mut idx = 0;
        for (var, stride) in self.scope.iter().zip(strides) {
            let value = assignment.get(var.id()).ok_or_else(|| {
                Error::scope(format!(
                    "assignment {assignment} does not match the scope of factor {}",
                    self.id
                ))
            })?;
            idx += domain_index(var, value)? * stride;
        }
        Ok(idx)
    }

    fn assignment_at(&self, index: usize) -> Assignment {
        let mut digits = Vec::with_capacity(self.scope.len());
        let mut rest = index;
        for stride in strides_of(&self.scope) {
            digits.push(rest / stride);
            rest %= stride;
        }
        assignment_of(&self.scope, &digits)
    }

    /// Evaluate on an assignment naming exactly the scope variables.
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        Ok(self.values[self.index_of(assignment)?])
    }

    /// Evaluate on any assignment that covers the scope, ignoring extra
    /// variables.
    pub fn value_restricted(&self, assignment: &Assignment) -> Result<f64> {
        self.value(&assignment.restrict(|v| self.contains(v)))
    }

    /// `(assignment, value)` rows in canonical order.
    pub fn rows(&self) -> impl Iterator<Item = (Assignment, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (self.assignment_at(i), *v))
    }

    /// Fix the evidence variables present in the scope and drop them.
    ///
    /// Evidence on variables outside the scope is ignored. Fails with a
    /// scope error if evidence gives a scope variable a value outside its
    /// domain.
    pub fn reduce_by_evidence(&self, evidence: &Assignment) -> Result<Factor> {
        let strides = strides_of(&self.scope);
        let mut base = 0;
        let mut kept = Vec::with_capacity(self.scope.len());
        let mut kept_strides = Vec::with_capacity(self.scope.len());
        for (var, stride) in self.scope.iter().zip(&strides) {
            match evidence.get(var.id()) {
                Some(value) => base += domain_index(var, value)? * stride,
                None => {
                    kept.push(Arc::clone(var));
                    kept_strides.push(*stride);
                }
            }
        }
        if kept.len() == self.scope.len() {
            return Ok(Factor {
                id: FactorId::generate(),
                scope: self.scope.clone(),
                values: self.values.clone(),
            });
        }

        let mut values = Vec::with_capacity(table_len(&kept).unwrap_or(0));
        let mut odo = Odometer::new(cards_of(&kept));
        loop {
            let offset: usize = odo
                .digits()
                .iter()
                .zip(&kept_strides)
                .map(|(d, s)| d * s)
                .sum();
            values.push(self.values[base + offset]);
            if !odo.advance() {
                break;
            }
        }
        Ok(Factor {
            id: FactorId::generate(),
            scope: kept,
            values,
        })
    }

    /// Pointwise product over the union of both scopes.
    ///
    /// Shared variables must be the same variable (same domain); a
    /// mismatch is a scope error.
    pub fn product(&self, other: &Factor) -> Result<Factor> {
        let mut scope: Vec<Arc<RandomVariable>> = Vec::with_capacity(self.scope.len() + other.scope.len());
        let (mut i, mut j) = (0, 0);
        while i < self.scope.len() || j < other.scope.len() {
            match (self.scope.get(i), other.scope.get(j)) {
                (Some(a), Some(b)) if a.id() == b.id() => {
                    if a.domain() != b.domain() {
                        return Err(Error::scope(format!(
                            "variable {} has different domains in factors {} and {}",
                            a.id(),
                            self.id,
                            other.id
                        )));
                    }
                    scope.push(Arc::clone(a));
                    i += 1;
                    j += 1;
                }
                (Some(a), Some(b)) if a.id() < b.id() => {
                    scope.push(Arc::clone(a));
                    i += 1;
                }
                (Some(a), None) => {
                    scope.push(Arc::clone(a));
                    i += 1;
                }
                (_, Some(b)) => {
                    scope.push(Arc::clone(b));
                    j += 1;
                }
                (None, None) => break,
            }
        }

        let self_strides = self.strides_within(&scope);
        let other_strides = other.strides_within(&scope);
        let len = table_len(&scope).ok_or_else(|| {
            Error::scope(format!(
                "product of factors {} and {} needs more than {MAX_TABLE_LEN} table entries",
                self.id, other.id
            ))
        })?;
        let mut values = Vec::with_capacity(len);
        let mut odo = Odometer::new(cards_of(&scope));
        loop {
            let (mut si, mut oi) = (0, 0);
            for (k, d) in odo.digits().iter().enumerate() {
                si += d * self_strides[k];
                oi += d * other_strides[k];
            }
            values.push(self.values[si] * other.values[oi]);
            if !odo.advance() {
                break;
            }
        }
        Ok(Factor {
            id: FactorId::generate(),
            scope,
            values,
        })
    }

    /// This factor's stride for each variable of a superset scope (0 when
    /// the variable is absent).
    fn strides_within(&self, superset: &[Arc<RandomVariable>]) -> Vec<usize> {
        let own = strides_of(&self.scope);
        superset
            .iter()
            .map(|v| self.position(v.id()).map_or(0, |p| own[p]))
            .collect()
    }

    /// Remove `var` from the scope by combining its entries with `reduce`,
    /// visiting them in domain order.
    fn marginalize<R>(&self, var: &VarId, mut reduce: R) -> Result<Factor>
    where
        R: FnMut(&mut dyn Iterator<Item = f64>) -> f64,
    {
        let pos = self.position(var).ok_or_else(|| {
            Error::scope(format!("variable {var} is not in the scope of factor {}", self.id))
        })?;
        let strides = strides_of(&self.scope);
        let stride = strides[pos];
        let card = self.scope[pos].cardinality();

        let mut kept = self.scope.clone();
        kept.remove(pos);
        let mut kept_strides = strides;
        kept_strides.remove(pos);

        let mut values = Vec::with_capacity(table_len(&kept).unwrap_or(0));
        let mut odo = Odometer::new(cards_of(&kept));
        loop {
            let base: usize = odo
                .digits()
                .iter()
                .zip(&kept_strides)
                .map(|(d, s)| d * s)
                .sum();
            let mut column = (0..card).map(|k| self.values[base + k * stride]);
            values.push(reduce(&mut column));
            if !odo.advance() {
                break;
            }
        }
        Ok(Factor {
            id: FactorId::generate(),
            scope: kept,
            values,
        })
    }

    /// Sum `var` out of the factor.
    pub fn sum_out(&self, var: &VarId) -> Result<Factor> {
        self.marginalize(var, |column| column.collect::<NeumaierSum>().total())
    }

    /// Maximise `var` out of the factor (max-product elimination).
    pub fn max_out(&self, var: &VarId) -> Result<Factor> {
        self.marginalize(var, |column| column.fold(f64::NEG_INFINITY, f64::max))
    }

    /// Sum out several variables in the given order.
    pub fn sum_out_all<'a, I>(&self, vars: I) -> Result<Factor>
    where
        I: IntoIterator<Item = &'a VarId>,
    {
        let mut out = self.clone();
        for v in vars {
            out = out.sum_out(v)?;
        }
        Ok(out)
    }

    /// Partition value `Z`: the sum of every table entry.
    pub fn partition(&self) -> f64 {
        self.values.iter().copied().collect::<NeumaierSum>().total()
    }

    /// `ln Z`, computed in log space.
    pub fn log_partition(&self) -> f64 {
        let logs: Vec<f64> = self.values.iter().map(|v| ln_weight(*v)).collect();
        log_sum_exp(&logs)
    }

    /// Probability of a partial assignment under the normalised factor.
    ///
    /// Returns `Σ_{a ⊇ target} φ(a) / Σ_a φ(a)`. `target` may name any
    /// subset of the scope; naming a variable outside it, or a value
    /// outside a domain, is a scope error. A zero denominator fails with
    /// `DegenerateFactor` instead of returning NaN.
    pub fn normalize(&self, target: &Assignment) -> Result<f64> {
        self.normalize_with_tolerance(target, 0.0)
    }

    /// [`Factor::normalize`] treating any denominator `<= tolerance` as zero.
    pub fn normalize_with_tolerance(&self, target: &Assignment, tolerance: f64) -> Result<f64> {
        let strides = strides_of(&self.scope);
        let mut fixed: Vec<Option<usize>> = vec![None; self.scope.len()];
        for (var, value) in target {
            let pos = self.position(var).ok_or_else(|| {
                Error::scope(format!("variable {var} is not in the scope of factor {}", self.id))
            })?;
            fixed[pos] = Some(domain_index(&self.scope[pos], value)?);
        }

        let denominator = self.partition();
        if denominator <= tolerance {
            return Err(Error::DegenerateFactor {
                factor: self.id.to_string(),
                denominator,
            });
        }

        let mut numerator = NeumaierSum::new();
        for (i, v) in self.values.iter().enumerate() {
            let matches = fixed
                .iter()
                .zip(&strides)
                .zip(&self.scope)
                .all(|((want, stride), var)| want.map_or(true, |w| (i / stride) % var.cardinality() == w));
            if matches {
                numerator.add(*v);
            }
        }
        Ok(numerator.total() / denominator)
    }

    /// The factor divided by its partition value.
    pub fn normalized(&self) -> Result<Factor> {
        let z = self.partition();
        if z <= 0.0 {
            return Err(Error::DegenerateFactor {
                factor: self.id.to_string(),
                denominator: z,
            });
        }
        Ok(Factor {
            id: FactorId::generate(),
            scope: self.scope.clone(),
            values: self.values.iter().map(|v| v / z).collect(),
        })
    }

    /// Highest-valued assignment; the first in canonical order on ties.
    pub fn argmax(&self) -> (Assignment, f64) {
        let mut best = 0;
        for (i, v) in self.values.iter().enumerate() {
            if *v > self.values[best] {
                best = i;
            }
        }
        (self.assignment_at(best), self.values[best])
    }

    /// Same scope and every entry within `tol`.
    pub fn approx_eq(&self, other: &Factor, tol: f64) -> bool {
        self.scope.len() == other.scope.len()
            && self
                .scope
                .iter()
                .zip(&other.scope)
                .all(|(a, b)| a.id() == b.id() && a.domain() == b.domain())
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| approx_eq(*a, *b, tol))
    }
}
