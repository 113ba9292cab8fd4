//! Most probable explanation by max-product variable elimination.
//!
//! Every unobserved variable is eliminated with `max_out` instead of
//! `sum_out`. The product formed at each step is kept; walking those
//! products in reverse elimination order and fixing each variable at its
//! best value given the later ones recovers a maximising assignment.

use crate::assignment::Assignment;
use crate::elimination::{check_evidence, product_all, reduce_roots, take_touching, VariableElimination};
use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::id::VarId;
use crate::model::Model;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use tracing::debug;

/// Maximising joint assignment of the unobserved variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mpe {
    /// Values of every non-evidence variable.
    pub assignment: Assignment,
    /// Unnormalised factor product at the assignment and the evidence.
    pub score: f64,
    /// `score / Z(evidence)`: the assignment's probability given the evidence.
    pub probability: f64,
}

impl<'m> VariableElimination<'m> {
    pub fn most_probable_explanation(&self, evidence: &Assignment) -> Result<Mpe> {
        let model = self.model();
        let observed = check_evidence(model, evidence)?;
        let hidden: BTreeSet<VarId> = model
            .node_ids()
            .filter(|v| !observed.contains(*v))
            .cloned()
            .collect();

        let mut working = reduce_roots(model, evidence, &observed)?;
        let graph = model.interaction_graph(&observed);
        let order = self.elimination_order(&graph, &hidden)?;

        // (variable, product it was maxed out of)
        let mut trail: Vec<(VarId, Option<Factor>)> = Vec::with_capacity(order.len());
        for var in order {
            let touching = take_touching(&mut working, &var);
            if touching.is_empty() {
                trail.push((var, None));
                continue;
            }
            let psi = product_all(touching)?;
            working.push(Cow::Owned(psi.max_out(&var)?));
            trail.push((var, Some(psi)));
        }
        let (_, score) = product_all(working)?.argmax();

        let mut assignment = Assignment::new();
        for (var, psi) in trail.iter().rev() {
            let value = match psi {
                Some(psi) => {
                    let (best, _) = psi.reduce_by_evidence(&assignment)?.argmax();
                    best.get(var).cloned()
                }
                None => model.variable(var).map(|v| v.mode().clone()),
            };
            let value = value.ok_or_else(|| Error::scope(format!("traceback lost variable {var}")))?;
            assignment.insert(var.clone(), value);
        }

        let z = self.partition_function(evidence)?;
        if z <= self.config().zero_tolerance {
            return Err(Error::DegenerateFactor {
                factor: format!("{}:evidence", model.id()),
                denominator: z,
            });
        }
        debug!(score, z, assignment = %assignment, "most probable explanation");
        Ok(Mpe {
            assignment,
            score,
            probability: score / z,
        })
    }
}

/// MPE under the default configuration.
pub fn most_probable_explanation(model: &Model, evidence: &Assignment) -> Result<Mpe> {
    VariableElimination::new(model).most_probable_explanation(evidence)
}
