//! Factor graph model: variables, edges, and factors in one structure.
//!
//! The model owns every variable in an id-keyed arena. Edges and factor
//! scopes refer to variables by id and are checked against the arena at
//! construction, so a model that exists is always consistent.
//!
//! A model is read-only once built. Queries take `&Model` and any number of
//! them can run concurrently.

use crate::assignment::Assignment;
use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::id::VarId;
use crate::ordering::InteractionGraph;
use crate::value::Value;
use crate::variable::RandomVariable;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Model {
    id: String,
    nodes: BTreeMap<VarId, Arc<RandomVariable>>,
    edges: Vec<Edge>,
    factors: Vec<Factor>,
}

impl Model {
    /// Assemble and validate a model.
    ///
    /// Fails with `ModelConsistency` when a node id repeats, an edge is a
    /// self-loop or names an unknown variable, or a factor's scope names a
    /// variable that is unknown or declared with a different domain.
    pub fn new(
        id: impl Into<String>,
        nodes: Vec<Arc<RandomVariable>>,
        edges: Vec<Edge>,
        factors: Vec<Factor>,
    ) -> Result<Self> {
        let id = id.into();
        let mut arena = BTreeMap::new();
        for var in nodes {
            let key = var.id().clone();
            if arena.insert(key.clone(), var).is_some() {
                return Err(Error::inconsistent(&id, format!("variable {key} is declared twice")));
            }
        }

        for edge in &edges {
            if edge.is_self_loop() {
                return Err(Error::inconsistent(
                    &id,
                    format!("edge {} is a self-loop on {}", edge.id, edge.start),
                ));
            }
            for end in [&edge.start, &edge.end] {
                if !arena.contains_key(end) {
                    return Err(Error::inconsistent(
                        &id,
                        format!("edge {} references unknown variable {end}", edge.id),
                    ));
                }
            }
        }

        for factor in &factors {
            for var in factor.scope() {
                match arena.get(var.id()) {
                    None => {
                        return Err(Error::inconsistent(
                            &id,
                            format!("factor {} references unknown variable {}", factor.id(), var.id()),
                        ))
                    }
                    Some(known) if known.domain() != var.domain() => {
                        return Err(Error::inconsistent(
                            &id,
                            format!(
                                "factor {} uses variable {} with a different domain",
                                factor.id(),
                                var.id()
                            ),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        debug!(
            model = %id,
            nodes = arena.len(),
            edges = edges.len(),
            factors = factors.len(),
            "model assembled"
        );
        Ok(Self {
            id,
            nodes: arena,
            edges,
            factors,
        })
    }

    /// Model whose factors are derived from its edges: one factor per edge,
    /// equal to the product of the two endpoint marginals.
    pub fn from_edges(id: impl Into<String>, nodes: Vec<Arc<RandomVariable>>, edges: Vec<Edge>) -> Result<Self> {
        let id = id.into();
        let lookup: BTreeMap<&VarId, &Arc<RandomVariable>> = nodes.iter().map(|v| (v.id(), v)).collect();
        let mut factors = Vec::with_capacity(edges.len());
        for edge in &edges {
            let (Some(start), Some(end)) = (lookup.get(&edge.start), lookup.get(&edge.end)) else {
                return Err(Error::inconsistent(
                    &id,
                    format!("edge {} references an unknown variable", edge.id),
                ));
            };
            if edge.is_self_loop() {
                return Err(Error::inconsistent(
                    &id,
                    format!("edge {} is a self-loop on {}", edge.id, edge.start),
                ));
            }
            factors.push(Factor::from_joint_vars(vec![Arc::clone(start), Arc::clone(end)])?);
        }
        Self::new(id, nodes, edges, factors)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Variables in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<RandomVariable>> + '_ {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &VarId> + '_ {
        self.nodes.keys()
    }

    pub fn variable(&self, id: &VarId) -> Option<&Arc<RandomVariable>> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &VarId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    fn require(&self, var: &VarId) -> Result<&Arc<RandomVariable>> {
        self.nodes
            .get(var)
            .ok_or_else(|| Error::inconsistent(&self.id, format!("unknown variable {var}")))
    }

    /// Variables sharing an edge with `var`, in either direction.
    pub fn neighbors(&self, var: &VarId) -> Result<BTreeSet<VarId>> {
        self.require(var)?;
        Ok(self
            .edges
            .iter()
            .filter_map(|e| e.other(var))
            .cloned()
            .collect())
    }

    /// Markov blanket from the edge structure (Murphy 2012, p. 662).
    pub fn markov_blanket(&self, var: &VarId) -> Result<BTreeSet<VarId>> {
        self.neighbors(var)
    }

    /// `var` together with its Markov blanket.
    pub fn closure_of(&self, var: &VarId) -> Result<BTreeSet<VarId>> {
        let mut out = self.markov_blanket(var)?;
        out.insert(var.clone());
        Ok(out)
    }

    /// Factors whose scope includes `var`.
    pub fn factors_containing(&self, var: &VarId) -> Vec<&Factor> {
        self.factors.iter().filter(|f| f.contains(var)).collect()
    }

    /// Factors whose whole scope lies inside `vars`.
    pub fn scope_subset_factors(&self, vars: &BTreeSet<VarId>) -> Vec<&Factor> {
        self.factors
            .iter()
            .filter(|f| f.scope_ids().all(|v| vars.contains(v)))
            .collect()
    }

    /// Interaction graph over every variable not in `excluded`.
    ///
    /// Two variables are adjacent when an edge joins them or a factor scope
    /// contains both.
    pub fn interaction_graph(&self, excluded: &BTreeSet<VarId>) -> InteractionGraph {
        let mut graph = InteractionGraph::new();
        for (id, var) in &self.nodes {
            if !excluded.contains(id) {
                graph.add_node(id.clone(), var.cardinality());
            }
        }
        for edge in &self.edges {
            graph.add_edge(&edge.start, &edge.end);
        }
        for factor in &self.factors {
            graph.add_clique(factor.scope_ids());
        }
        graph
    }

    /// Product of every factor, extended with all-ones factors so that its
    /// scope is every node. Exponential in the node count; meant for
    /// brute-force cross-checks on small models.
    pub fn joint_factor(&self) -> Result<Factor> {
        let mut joint = Factor::unit();
        for factor in &self.factors {
            joint = joint.product(factor)?;
        }
        let missing: Vec<Arc<RandomVariable>> = self
            .nodes
            .values()
            .filter(|v| !joint.contains(v.id()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            joint = joint.product(&Factor::ones(missing)?)?;
        }
        Ok(joint)
    }

    /// Parse `var=value` evidence tokens against this model's domains.
    ///
    /// See [`RandomVariable::resolve_token`]. Tokens for variables the
    /// model lacks are parsed untyped and rejected later by inference.
    pub fn parse_evidence<S: AsRef<str>>(&self, pairs: &[S]) -> Result<Assignment> {
        Assignment::parse_pairs_with(pairs, |var, token| match self.variable(var) {
            Some(known) => known.resolve_token(token),
            None => Ok(Value::parse_token(token)),
        })
    }

    /// Variables whose marginal misses one by more than `tolerance`,
    /// each logged as a warning.
    pub fn unnormalized_marginals(&self, tolerance: f64) -> Vec<VarId> {
        self.nodes
            .values()
            .filter(|v| !v.marginal_sums_to_one(tolerance))
            .map(|v| {
                warn!(
                    model = %self.id,
                    variable = %v.id(),
                    sum = v.marginal_sum(),
                    "marginal distribution does not sum to 1"
                );
                v.id().clone()
            })
            .collect()
    }
}
