//! JSON model documents.
//!
//! A document lists variables, edges and factors in plain data form and
//! converts into a validated [`Model`]:
//!
//! ```json
//! {
//!   "id": "chain",
//!   "variables": [
//!     { "id": "a", "domain": [true, false], "marginal": [0.6, 0.4] },
//!     { "id": "b", "domain": [true, false] }
//!   ],
//!   "edges": [{ "id": "ab", "kind": "directed", "start": "a", "end": "b" }],
//!   "factors": [
//!     { "id": "p_a", "scope": ["a"], "rows": [
//!         { "assignment": { "a": true }, "value": 0.6 },
//!         { "assignment": { "a": false }, "value": 0.4 } ] }
//!   ]
//! }
//! ```
//!
//! A variable without `marginal` is uniform. A document with edges but no
//! factors gets one marginal-product factor per edge.

use crate::assignment::Assignment;
use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::id::VarId;
use crate::model::Model;
use crate::value::Value;
use crate::variable::RandomVariable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    pub id: VarId,
    pub domain: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorRow {
    pub assignment: Assignment,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorSpec {
    pub id: String,
    pub scope: Vec<VarId>,
    pub rows: Vec<FactorRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    pub id: String,
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub factors: Vec<FactorSpec>,
}

impl ModelDocument {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build and validate the model the document describes.
    pub fn into_model(self) -> Result<Model> {
        let mut vars: BTreeMap<VarId, Arc<RandomVariable>> = BTreeMap::new();
        let mut nodes = Vec::with_capacity(self.variables.len());
        for spec in self.variables {
            let var = match spec.marginal {
                Some(table) => RandomVariable::with_table(spec.id, spec.domain, table)?,
                None => RandomVariable::uniform(spec.id, spec.domain)?,
            };
            let var = Arc::new(var);
            vars.insert(var.id().clone(), Arc::clone(&var));
            nodes.push(var);
        }

        if self.factors.is_empty() && !self.edges.is_empty() {
            return Model::from_edges(self.id, nodes, self.edges);
        }

        let mut factors = Vec::with_capacity(self.factors.len());
        for spec in self.factors {
            let scope = spec
                .scope
                .iter()
                .map(|v| {
                    vars.get(v).cloned().ok_or_else(|| {
                        Error::inconsistent(
                            &self.id,
                            format!("factor {} references unknown variable {v}", spec.id),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let rows = spec.rows.into_iter().map(|r| (r.assignment, r.value));
            factors.push(Factor::from_rows(spec.id, scope, rows)?);
        }
        Model::new(self.id, nodes, self.edges, factors)
    }
}

/// Parse a JSON document straight into a model.
pub fn load_model(path: &Path) -> Result<Model> {
    ModelDocument::from_path(path)?.into_model()
}
