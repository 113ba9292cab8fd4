//! Partial and full assignments of outcomes to variables.
//!
//! An assignment is a set of `(variable, value)` pairs with unique
//! variables. It is stored sorted by variable id so equal assignments hash
//! and compare equal regardless of construction order. Assignments serve as
//! factor arguments, as evidence, and as rows of a result table.

use crate::error::{Error, Result};
use crate::id::VarId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment(BTreeMap<VarId, Value>);

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, var: impl Into<VarId>, value: impl Into<Value>) -> Self {
        self.0.insert(var.into(), value.into());
        self
    }

    /// Set `var` to `value`, returning the previous value.
    pub fn insert(&mut self, var: VarId, value: Value) -> Option<Value> {
        self.0.insert(var, value)
    }

    pub fn get(&self, var: &VarId) -> Option<&Value> {
        self.0.get(var)
    }

    pub fn contains_var(&self, var: &VarId) -> bool {
        self.0.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn vars(&self) -> impl Iterator<Item = &VarId> + '_ {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, VarId, Value> {
        self.0.iter()
    }

    /// Sub-assignment over the variables `keep` selects.
    pub fn restrict<F>(&self, mut keep: F) -> Assignment
    where
        F: FnMut(&VarId) -> bool,
    {
        Assignment(
            self.0
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// True if both assignments agree on every variable they share.
    pub fn is_consistent_with(&self, other: &Assignment) -> bool {
        self.0
            .iter()
            .all(|(k, v)| other.0.get(k).map_or(true, |o| o == v))
    }

    /// Union of two consistent assignments; `None` if they disagree.
    pub fn merged(&self, other: &Assignment) -> Option<Assignment> {
        if !self.is_consistent_with(other) {
            return None;
        }
        let mut out = self.clone();
        for (k, v) in &other.0 {
            out.0.insert(k.clone(), v.clone());
        }
        Some(out)
    }

    /// Parse `var=value` tokens such as `rain=true` or `grade=B`.
    ///
    /// Values go through [`Value::parse_token`], which knows nothing about
    /// the variable's domain; [`Model::parse_evidence`](crate::Model::parse_evidence)
    /// resolves tokens against the domain instead. A variable named twice
    /// is rejected.
    pub fn parse_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Assignment> {
        Self::parse_pairs_with(pairs, |_, token| Ok(Value::parse_token(token)))
    }

    /// Parse `var=value` tokens, turning each value token into a [`Value`]
    /// with `resolve`.
    pub fn parse_pairs_with<S, F>(pairs: &[S], mut resolve: F) -> Result<Assignment>
    where
        S: AsRef<str>,
        F: FnMut(&VarId, &str) -> Result<Value>,
    {
        let mut out = Assignment::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (var, token) = pair
                .split_once('=')
                .ok_or_else(|| Error::InvalidQuery(format!("expected var=value, got '{pair}'")))?;
            let var = var.trim();
            if var.is_empty() {
                return Err(Error::InvalidQuery(format!("missing variable in '{pair}'")));
            }
            let var = VarId::from(var);
            let value = resolve(&var, token.trim())?;
            if out.insert(var.clone(), value).is_some() {
                return Err(Error::InvalidQuery(format!("variable {var} assigned twice")));
            }
        }
        Ok(out)
    }
}

impl FromIterator<(VarId, Value)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (VarId, Value)>>(iter: I) -> Self {
        Assignment(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Assignment {
    type Item = (&'a VarId, &'a Value);
    type IntoIter = btree_map::Iter<'a, VarId, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_order_does_not_matter() {
        let a = Assignment::new().with("b", true).with("a", 1);
        let b = Assignment::new().with("a", 1).with("b", true);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{a=1, b=true}");
    }

    #[test]
    fn restrict_keeps_selected_vars() {
        let a = Assignment::new().with("a", true).with("b", false).with("c", true);
        let r = a.restrict(|v| v.as_str() != "b");
        assert_eq!(r, Assignment::new().with("a", true).with("c", true));
    }

    #[test]
    fn merge_requires_agreement() {
        let a = Assignment::new().with("a", true).with("b", false);
        let b = Assignment::new().with("b", false).with("c", 2);
        let merged = a.merged(&b).unwrap();
        assert_eq!(merged.len(), 3);

        let clash = Assignment::new().with("a", false);
        assert!(a.merged(&clash).is_none());
    }

    #[test]
    fn parse_pairs_reads_typed_values() {
        let a = Assignment::parse_pairs(&["rain=true", "grade=B", "n=3"]).unwrap();
        assert_eq!(a.get(&"rain".into()), Some(&Value::Bool(true)));
        assert_eq!(a.get(&"grade".into()), Some(&Value::from("B")));
        assert_eq!(a.get(&"n".into()), Some(&Value::Int(3)));
    }

    #[test]
    fn parse_pairs_rejects_malformed() {
        assert!(Assignment::parse_pairs(&["rain"]).is_err());
        assert!(Assignment::parse_pairs(&["=true"]).is_err());
        assert!(Assignment::parse_pairs(&["a=1", "a=2"]).is_err());
    }

    #[test]
    fn serializes_as_object() {
        let a = Assignment::new().with("a", true).with("grade", "B");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"a":true,"grade":"B"}"#);
    }
}
