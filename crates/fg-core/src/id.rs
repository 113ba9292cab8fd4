//! Variable and factor identity types.
//!
//! Edges and factors name variables by [`VarId`] rather than by owning
//! pointer; the model owns every variable and resolves ids on demand.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a random variable, unique within a model.
///
/// Ordering is lexicographic; it fixes the canonical scope order of every
/// factor and is the tie-break key of the elimination heuristics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(pub String);

impl VarId {
    pub fn new(id: impl Into<String>) -> Self {
        VarId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VarId {
    fn from(id: &str) -> Self {
        VarId(id.to_string())
    }
}

impl From<String> for VarId {
    fn from(id: String) -> Self {
        VarId(id)
    }
}

impl Borrow<str> for VarId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a factor.
///
/// Root factors carry caller-chosen ids; factors derived during elimination
/// get a fresh `fac-<uuid>` id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorId(pub String);

impl FactorId {
    pub fn new(id: impl Into<String>) -> Self {
        FactorId(id.into())
    }

    /// Fresh id for a derived factor.
    pub fn generate() -> Self {
        FactorId(format!("fac-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FactorId {
    fn from(id: &str) -> Self {
        FactorId(id.to_string())
    }
}

impl From<String> for FactorId {
    fn from(id: String) -> Self {
        FactorId(id)
    }
}
