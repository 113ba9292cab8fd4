//! Typed connections between variables.
//!
//! Edges are the input representation of structure. Inference itself works
//! on factor scopes; edges only feed the adjacency used by the elimination
//! ordering heuristics.

use crate::id::VarId;
use serde::{Deserialize, Serialize};

/// Whether an edge has a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Directed,
    #[default]
    Undirected,
}

/// A connection between two variables, naming them by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(default)]
    pub kind: EdgeKind,
    pub start: VarId,
    pub end: VarId,
}

impl Edge {
    pub fn new(id: impl Into<String>, kind: EdgeKind, start: impl Into<VarId>, end: impl Into<VarId>) -> Self {
        Self {
            id: id.into(),
            kind,
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn undirected(id: impl Into<String>, start: impl Into<VarId>, end: impl Into<VarId>) -> Self {
        Self::new(id, EdgeKind::Undirected, start, end)
    }

    pub fn directed(id: impl Into<String>, start: impl Into<VarId>, end: impl Into<VarId>) -> Self {
        Self::new(id, EdgeKind::Directed, start, end)
    }

    pub fn is_self_loop(&self) -> bool {
        self.start == self.end
    }

    /// The endpoint opposite `var`, if `var` is incident to this edge.
    ///
    /// Direction is ignored: for adjacency a directed edge links both ends.
    pub fn other(&self, var: &VarId) -> Option<&VarId> {
        if &self.start == var {
            Some(&self.end)
        } else if &self.end == var {
            Some(&self.start)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_ignores_direction() {
        let e = Edge::directed("ab", "a", "b");
        assert_eq!(e.other(&"a".into()), Some(&VarId::from("b")));
        assert_eq!(e.other(&"b".into()), Some(&VarId::from("a")));
        assert_eq!(e.other(&"c".into()), None);
    }

    #[test]
    fn detects_self_loop() {
        assert!(Edge::undirected("aa", "a", "a").is_self_loop());
        assert!(!Edge::undirected("ab", "a", "b").is_self_loop());
    }

    #[test]
    fn kind_defaults_to_undirected_in_json() {
        let e: Edge = serde_json::from_str(r#"{"id":"e","start":"a","end":"b"}"#).unwrap();
        assert_eq!(e.kind, EdgeKind::Undirected);
    }
}
