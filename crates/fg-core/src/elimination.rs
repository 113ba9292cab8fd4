//! Sum-product variable elimination.
//!
//! Given a model, a set of query variables and evidence, every variable
//! that is neither queried nor observed is summed out of the product of the
//! model's factors. Factors are first reduced by the evidence; then, for
//! each hidden variable in elimination order, the factors mentioning it are
//! multiplied together and the variable is summed out of the product. What
//! remains is multiplied into one factor over the query variables, which is
//! proportional to `P(queries | evidence)`.
//!
//! A hidden variable that no remaining factor mentions contributes nothing
//! and is skipped. It is still reported as eliminated.
//!
//! The engine never mutates the model. Intermediate factors live only for
//! the duration of one call.

use crate::assignment::Assignment;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::id::VarId;
use crate::model::Model;
use crate::ordering::{EliminationOrdering, InteractionGraph};
use fg_math::{ln_weight, log_normalize};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Unnormalised query factor plus elimination diagnostics.
#[derive(Debug, Clone)]
pub struct Inference {
    /// Factor over exactly the query variables.
    pub factor: Factor,
    /// The last hidden variable eliminated, if there were any.
    pub last_eliminated: Option<VarId>,
    /// Elimination order that was used.
    pub order: Vec<VarId>,
}

/// One row of a normalised posterior table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosteriorRow {
    pub assignment: Assignment,
    pub probability: f64,
}

/// Normalised `P(queries | evidence)` as an explicit table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posterior {
    pub variables: Vec<VarId>,
    pub evidence: Assignment,
    pub rows: Vec<PosteriorRow>,
    pub last_eliminated: Option<VarId>,
    pub order: Vec<VarId>,
}

impl Posterior {
    /// Probability of an assignment to every query variable.
    pub fn get(&self, assignment: &Assignment) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| &r.assignment == assignment)
            .map(|r| r.probability)
    }

    /// Most probable row; the first in table order on ties.
    pub fn map_estimate(&self) -> Option<&PosteriorRow> {
        self.rows.iter().fold(None, |best: Option<&PosteriorRow>, row| match best {
            Some(b) if b.probability >= row.probability => Some(b),
            _ => Some(row),
        })
    }
}

/// Variable elimination over a borrowed model.
///
/// ```
/// use fg_core::{Assignment, Factor, Model, RandomVariable, VariableElimination};
/// use std::sync::Arc;
///
/// let rain = Arc::new(RandomVariable::boolean("rain", 0.2).unwrap());
/// let prior = Factor::from_joint_vars(vec![Arc::clone(&rain)]).unwrap();
/// let model = Model::new("m", vec![rain], vec![], vec![prior]).unwrap();
///
/// let engine = VariableElimination::new(&model);
/// let p = engine
///     .probability(&Assignment::new().with("rain", true), &Assignment::new())
///     .unwrap();
/// assert!((p - 0.2).abs() < 1e-12);
/// ```
pub struct VariableElimination<'m> {
    model: &'m Model,
    config: EngineConfig,
    ordering: Option<Box<dyn EliminationOrdering>>,
}

impl<'m> VariableElimination<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            config: EngineConfig::default(),
            ordering: None,
        }
    }

    /// Use `config`; its heuristic applies unless an ordering was set.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the elimination ordering.
    pub fn with_ordering(mut self, ordering: impl EliminationOrdering + 'static) -> Self {
        self.ordering = Some(Box::new(ordering));
        self
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn ordering(&self) -> &dyn EliminationOrdering {
        match &self.ordering {
            Some(o) => o.as_ref(),
            None => &self.config.ordering,
        }
    }

    /// Elimination order for `hidden`, checked to name every hidden
    /// variable exactly once.
    pub(crate) fn elimination_order(&self, graph: &InteractionGraph, hidden: &BTreeSet<VarId>) -> Result<Vec<VarId>> {
        let ordering = self.ordering();
        let order = ordering.order(graph, hidden);
        let distinct: BTreeSet<&VarId> = order.iter().collect();
        let permutation =
            order.len() == hidden.len() && distinct.len() == order.len() && order.iter().all(|v| hidden.contains(v));
        if !permutation {
            return Err(Error::InvalidQuery(format!(
                "ordering {} returned {} variables for {} hidden variables, not a permutation of them",
                ordering.name(),
                order.len(),
                hidden.len()
            )));
        }
        debug!(
            model = self.model.id(),
            ordering = ordering.name(),
            order = ?order.iter().map(VarId::as_str).collect::<Vec<_>>(),
            "elimination order chosen"
        );
        Ok(order)
    }

    /// Factor proportional to `P(queries | evidence)`.
    ///
    /// Fails with `InvalidQuery` if `queries` is empty, names an unknown
    /// variable, or overlaps the evidence, and with a scope error if the
    /// evidence gives a variable a value outside its domain.
    pub fn infer(&self, queries: &BTreeSet<VarId>, evidence: &Assignment) -> Result<Inference> {
        if queries.is_empty() {
            return Err(Error::InvalidQuery("no query variables given".into()));
        }
        for q in queries {
            if !self.model.contains(q) {
                return Err(Error::InvalidQuery(format!("unknown query variable {q}")));
            }
            if evidence.contains_var(q) {
                return Err(Error::InvalidQuery(format!("variable {q} is both queried and observed")));
            }
        }
        self.eliminate(queries, evidence)
    }

    /// Shared body of [`infer`](Self::infer) and
    /// [`partition_function`](Self::partition_function): sums out every
    /// variable outside `keep` and the evidence.
    fn eliminate(&self, keep: &BTreeSet<VarId>, evidence: &Assignment) -> Result<Inference> {
        let observed = check_evidence(self.model, evidence)?;
        let hidden: BTreeSet<VarId> = self
            .model
            .node_ids()
            .filter(|v| !keep.contains(*v) && !observed.contains(*v))
            .cloned()
            .collect();

        let mut working = reduce_roots(self.model, evidence, &observed)?;
        let graph = self.model.interaction_graph(&observed);
        let order = self.elimination_order(&graph, &hidden)?;

        let mut last_eliminated = None;
        for var in &order {
            let touching = take_touching(&mut working, var);
            last_eliminated = Some(var.clone());
            if touching.is_empty() {
                debug!(var = %var, "no factor mentions variable; skipped");
                continue;
            }
            let count = touching.len();
            let summed = product_all(touching)?.sum_out(var)?;
            debug!(var = %var, factors = count, size = summed.size(), "eliminated variable");
            working.push(Cow::Owned(summed));
        }

        let mut factor = product_all(working)?;
        let uncovered: Vec<_> = keep
            .iter()
            .filter(|q| !factor.contains(q))
            .filter_map(|q| self.model.variable(q).map(Arc::clone))
            .collect();
        if !uncovered.is_empty() {
            factor = factor.product(&Factor::ones(uncovered)?)?;
        }

        Ok(Inference {
            factor,
            last_eliminated,
            order,
        })
    }

    /// Normalised posterior table over `queries`.
    pub fn posterior(&self, queries: &BTreeSet<VarId>, evidence: &Assignment) -> Result<Posterior> {
        let inference = self.infer(queries, evidence)?;
        let factor = &inference.factor;
        let z = factor.partition();
        let degenerate = || Error::DegenerateFactor {
            factor: factor.id().to_string(),
            denominator: z,
        };
        if z <= self.config.zero_tolerance {
            return Err(degenerate());
        }

        let logs: Vec<f64> = factor.values().iter().map(|v| ln_weight(*v)).collect();
        let probabilities = log_normalize(&logs).ok_or_else(degenerate)?;
        let rows = factor
            .rows()
            .zip(probabilities)
            .map(|((assignment, _), probability)| PosteriorRow {
                assignment,
                probability,
            })
            .collect();

        Ok(Posterior {
            variables: factor.scope_ids().cloned().collect(),
            evidence: evidence.clone(),
            rows,
            last_eliminated: inference.last_eliminated,
            order: inference.order,
        })
    }

    /// `P(target | evidence)`, where `target` fixes one or more variables.
    pub fn probability(&self, target: &Assignment, evidence: &Assignment) -> Result<f64> {
        let queries: BTreeSet<VarId> = target.vars().cloned().collect();
        let inference = self.infer(&queries, evidence)?;
        inference
            .factor
            .normalize_with_tolerance(target, self.config.zero_tolerance)
    }

    /// Unnormalised mass `Z(e)`: the model's factor product summed over
    /// every assignment consistent with `evidence`.
    pub fn partition_function(&self, evidence: &Assignment) -> Result<f64> {
        Ok(self.eliminate(&BTreeSet::new(), evidence)?.factor.partition())
    }

    /// `Z(e) / Z`, the probability of the evidence under the model.
    pub fn evidence_probability(&self, evidence: &Assignment) -> Result<f64> {
        let total = self.partition_function(&Assignment::new())?;
        if total <= self.config.zero_tolerance {
            return Err(Error::DegenerateFactor {
                factor: format!("{}:joint", self.model.id()),
                denominator: total,
            });
        }
        Ok(self.partition_function(evidence)? / total)
    }
}

/// Eliminate with the default configuration and return the query factor
/// and the last eliminated variable.
pub fn infer(model: &Model, queries: &BTreeSet<VarId>, evidence: &Assignment) -> Result<(Factor, Option<VarId>)> {
    let inference = VariableElimination::new(model).infer(queries, evidence)?;
    Ok((inference.factor, inference.last_eliminated))
}

/// Variables named by `evidence`, after checking each is in the model and
/// observed at a value of its domain.
pub(crate) fn check_evidence(model: &Model, evidence: &Assignment) -> Result<BTreeSet<VarId>> {
    for (var, value) in evidence {
        let known = model
            .variable(var)
            .ok_or_else(|| Error::InvalidQuery(format!("evidence names unknown variable {var}")))?;
        if !known.contains(value) {
            return Err(Error::Scope(format!(
                "evidence value {value} is not in the domain of {var}"
            )));
        }
    }
    Ok(evidence.vars().cloned().collect())
}

/// Root factors with the evidence applied; untouched factors are borrowed.
pub(crate) fn reduce_roots<'a>(
    model: &'a Model,
    evidence: &Assignment,
    observed: &BTreeSet<VarId>,
) -> Result<Vec<Cow<'a, Factor>>> {
    model
        .factors()
        .iter()
        .map(|f| {
            if f.scope_ids().any(|v| observed.contains(v)) {
                let reduced = f.reduce_by_evidence(evidence)?;
                trace!(factor = %f.id(), from = f.size(), to = reduced.size(), "reduced by evidence");
                Ok(Cow::Owned(reduced))
            } else {
                Ok(Cow::Borrowed(f))
            }
        })
        .collect()
}

/// Remove and return the working factors that mention `var`, keeping the
/// relative order of both halves.
pub(crate) fn take_touching<'a>(working: &mut Vec<Cow<'a, Factor>>, var: &VarId) -> Vec<Cow<'a, Factor>> {
    let (touching, rest): (Vec<_>, Vec<_>) = std::mem::take(working).into_iter().partition(|f| f.contains(var));
    *working = rest;
    touching
}

/// Sequential left fold of `product`; the empty product is the unit factor.
pub(crate) fn product_all(factors: Vec<Cow<'_, Factor>>) -> Result<Factor> {
    let mut iter = factors.into_iter();
    let Some(first) = iter.next() else {
        return Ok(Factor::unit());
    };
    iter.try_fold(first.into_owned(), |acc, f| acc.product(&f))
}
