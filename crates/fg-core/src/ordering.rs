//! Elimination ordering heuristics.
//!
//! Any fixed order gives the same distribution up to rounding; the order
//! only decides how large the intermediate factors get. The greedy
//! heuristics here follow Koller & Friedman (2009, §9.4.3): repeatedly pick
//! the cheapest remaining variable in the evolving interaction graph, then
//! connect its neighbours (fill edges) and remove it.
//!
//! Ties break on variable id so every ordering is deterministic.

use crate::id::VarId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Undirected graph of variables that share an edge or a factor scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionGraph {
    adjacency: BTreeMap<VarId, BTreeSet<VarId>>,
    cardinality: BTreeMap<VarId, usize>,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, var: VarId, cardinality: usize) {
        self.adjacency.entry(var.clone()).or_default();
        self.cardinality.insert(var, cardinality);
    }

    /// Connect two known nodes; self-links and unknown nodes are ignored.
    pub fn add_edge(&mut self, a: &VarId, b: &VarId) {
        if a == b || !self.adjacency.contains_key(a) || !self.adjacency.contains_key(b) {
            return;
        }
        if let Some(n) = self.adjacency.get_mut(a) {
            n.insert(b.clone());
        }
        if let Some(n) = self.adjacency.get_mut(b) {
            n.insert(a.clone());
        }
    }

    /// Connect every pair in `vars` (a factor scope becomes a clique).
    pub fn add_clique<'a, I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = &'a VarId>,
    {
        let vars: Vec<&VarId> = vars.into_iter().collect();
        for (i, a) in vars.iter().enumerate() {
            for b in &vars[i + 1..] {
                self.add_edge(a, b);
            }
        }
    }

    pub fn contains(&self, var: &VarId) -> bool {
        self.adjacency.contains_key(var)
    }

    pub fn neighbors(&self, var: &VarId) -> Option<&BTreeSet<VarId>> {
        self.adjacency.get(var)
    }

    pub fn degree(&self, var: &VarId) -> usize {
        self.adjacency.get(var).map_or(0, BTreeSet::len)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Fill edges that eliminating `var` would add.
    pub fn fill_in(&self, var: &VarId) -> usize {
        let Some(neighbors) = self.adjacency.get(var) else {
            return 0;
        };
        let ns: Vec<&VarId> = neighbors.iter().collect();
        let mut missing = 0;
        for (i, a) in ns.iter().enumerate() {
            for b in &ns[i + 1..] {
                if !self.adjacency[*a].contains(*b) {
                    missing += 1;
                }
            }
        }
        missing
    }

    /// Size of the factor created by eliminating `var`: product of the
    /// cardinalities of `var` and its neighbours.
    pub fn weight(&self, var: &VarId) -> u64 {
        let own = self.cardinality.get(var).copied().unwrap_or(1) as u64;
        self.adjacency.get(var).map_or(own, |ns| {
            ns.iter().fold(own, |acc, n| {
                acc.saturating_mul(self.cardinality.get(n).copied().unwrap_or(1) as u64)
            })
        })
    }

    /// Remove `var`, first connecting all of its neighbours pairwise.
    pub fn eliminate(&mut self, var: &VarId) {
        let Some(neighbors) = self.adjacency.remove(var) else {
            return;
        };
        self.cardinality.remove(var);
        for n in &neighbors {
            if let Some(adj) = self.adjacency.get_mut(n) {
                adj.remove(var);
            }
        }
        self.add_clique(neighbors.iter());
    }
}

/// Strategy that decides the order in which hidden variables are summed out.
///
/// Implementations must be deterministic and must return every variable of
/// `hidden` exactly once.
pub trait EliminationOrdering: Send + Sync {
    fn order(&self, graph: &InteractionGraph, hidden: &BTreeSet<VarId>) -> Vec<VarId>;

    fn name(&self) -> &'static str;
}

/// Greedy cost metric for choosing the next variable to eliminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingHeuristic {
    /// Fewest current neighbours ("min-degree").
    #[default]
    MinNeighbors,
    /// Fewest fill edges added.
    MinFill,
    /// Smallest resulting factor table.
    MinWeight,
}

impl OrderingHeuristic {
    fn cost(&self, graph: &InteractionGraph, var: &VarId) -> u64 {
        match self {
            OrderingHeuristic::MinNeighbors => graph.degree(var) as u64,
            OrderingHeuristic::MinFill => graph.fill_in(var) as u64,
            OrderingHeuristic::MinWeight => graph.weight(var),
        }
    }
}

impl EliminationOrdering for OrderingHeuristic {
    fn order(&self, graph: &InteractionGraph, hidden: &BTreeSet<VarId>) -> Vec<VarId> {
        let mut graph = graph.clone();
        let mut remaining = hidden.clone();
        let mut order = Vec::with_capacity(hidden.len());
        while !remaining.is_empty() {
            // BTreeSet iterates in id order, so min_by_key keeps the
            // smallest id among equal costs.
            let next = remaining
                .iter()
                .min_by_key(|v| self.cost(&graph, v))
                .cloned();
            let Some(next) = next else { break };
            graph.eliminate(&next);
            remaining.remove(&next);
            order.push(next);
        }
        order
    }

    fn name(&self) -> &'static str {
        match self {
            OrderingHeuristic::MinNeighbors => "min_neighbors",
            OrderingHeuristic::MinFill => "min_fill",
            OrderingHeuristic::MinWeight => "min_weight",
        }
    }
}

impl std::str::FromStr for OrderingHeuristic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "min_neighbors" | "min_degree" => Ok(OrderingHeuristic::MinNeighbors),
            "min_fill" => Ok(OrderingHeuristic::MinFill),
            "min_weight" => Ok(OrderingHeuristic::MinWeight),
            _ => Err(format!("unknown ordering heuristic: {}", s)),
        }
    }
}

impl std::fmt::Display for OrderingHeuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Caller-supplied order.
///
/// Listed variables that are not hidden are skipped; hidden variables the
/// list omits are appended in id order, so the result is always complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedOrder(pub Vec<VarId>);

impl EliminationOrdering for FixedOrder {
    fn order(&self, _graph: &InteractionGraph, hidden: &BTreeSet<VarId>) -> Vec<VarId> {
        let mut seen = BTreeSet::new();
        let mut order: Vec<VarId> = self
            .0
            .iter()
            .filter(|v| hidden.contains(*v) && seen.insert((*v).clone()))
            .cloned()
            .collect();
        order.extend(hidden.iter().filter(|v| !seen.contains(*v)).cloned());
        order
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> BTreeSet<VarId> {
        names.iter().map(|n| VarId::from(*n)).collect()
    }

    /// Star: hub connected to leaves l1..l3, plus a chain l3 - t.
    fn star() -> InteractionGraph {
        let mut g = InteractionGraph::new();
        for n in ["hub", "l1", "l2", "l3", "t"] {
            g.add_node(n.into(), 2);
        }
        for leaf in ["l1", "l2", "l3"] {
            g.add_edge(&"hub".into(), &leaf.into());
        }
        g.add_edge(&"l3".into(), &"t".into());
        g
    }

    #[test]
    fn eliminate_adds_fill_edges() {
        let mut g = star();
        assert_eq!(g.fill_in(&"hub".into()), 3);
        g.eliminate(&"hub".into());
        assert!(!g.contains(&"hub".into()));
        assert_eq!(g.degree(&"l1".into()), 2);
        assert!(g.neighbors(&"l1".into()).unwrap().contains(&VarId::from("l2")));
    }

    #[test]
    fn min_neighbors_picks_leaves_first_with_id_tiebreak() {
        let g = star();
        let order = OrderingHeuristic::MinNeighbors.order(&g, &ids(&["hub", "l1", "l2", "l3", "t"]));
        let names: Vec<&str> = order.iter().map(|v| v.as_str()).collect();
        assert_eq!(names[0], "l1");
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn min_fill_avoids_hub() {
        let g = star();
        let order = OrderingHeuristic::MinFill.order(&g, &ids(&["hub", "l1", "l2", "l3", "t"]));
        assert_eq!(order[0].as_str(), "l1");
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn min_weight_uses_cardinalities() {
        let mut g = InteractionGraph::new();
        g.add_node("big".into(), 10);
        g.add_node("small".into(), 2);
        g.add_node("mid".into(), 3);
        g.add_edge(&"big".into(), &"mid".into());
        g.add_edge(&"small".into(), &"mid".into());
        assert_eq!(g.weight(&"small".into()), 6);
        assert_eq!(g.weight(&"big".into()), 30);
        let order = OrderingHeuristic::MinWeight.order(&g, &ids(&["big", "small"]));
        assert_eq!(order[0].as_str(), "small");
    }

    #[test]
    fn only_hidden_variables_are_ordered() {
        let g = star();
        let order = OrderingHeuristic::MinNeighbors.order(&g, &ids(&["hub", "t"]));
        assert_eq!(order.len(), 2);
        assert!(order.iter().all(|v| v.as_str() == "hub" || v.as_str() == "t"));
    }

    #[test]
    fn fixed_order_is_completed_and_filtered() {
        let fixed = FixedOrder(vec!["t".into(), "q".into(), "t".into()]);
        let order = fixed.order(&InteractionGraph::new(), &ids(&["b", "t", "a"]));
        let names: Vec<&str> = order.iter().map(|v| v.as_str()).collect();
        assert_eq!(names, ["t", "a", "b"]);
    }

    #[test]
    fn heuristic_parses_aliases() {
        assert_eq!("min-degree".parse::<OrderingHeuristic>().unwrap(), OrderingHeuristic::MinNeighbors);
        assert_eq!("MIN_FILL".parse::<OrderingHeuristic>().unwrap(), OrderingHeuristic::MinFill);
        assert!("random".parse::<OrderingHeuristic>().is_err());
    }
}
