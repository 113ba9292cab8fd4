//! Fuzz target comparing variable elimination against the full joint.
//!
//! Builds a small model from structured input and checks that the
//! eliminated posterior agrees with brute-force marginalisation.

#![no_main]

use arbitrary::Arbitrary;
use fg_core::{Assignment, Factor, Model, RandomVariable, Value, VarId, VariableElimination};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Arbitrary)]
struct Input {
    cards: Vec<u8>,
    factors: Vec<(u8, Vec<u8>)>,
}

fuzz_target!(|input: Input| {
    let vars: Vec<Arc<RandomVariable>> = input
        .cards
        .iter()
        .take(5)
        .enumerate()
        .filter_map(|(i, c)| {
            let card = 2 + i64::from(*c % 2);
            let domain = (0..card).map(Value::Int).collect();
            RandomVariable::uniform(format!("v{i}"), domain).ok().map(Arc::new)
        })
        .collect();
    if vars.len() < 2 {
        return;
    }

    let mut factors = Vec::new();
    for (j, (mask, weights)) in input.factors.iter().take(6).enumerate() {
        let scope: Vec<_> = vars
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, v)| Arc::clone(v))
            .collect();
        if scope.is_empty() {
            continue;
        }
        let len: usize = scope.iter().map(|v| v.cardinality()).product();
        let values: Vec<f64> = (0..len)
            .map(|k| 0.05 + f64::from(weights.get(k).copied().unwrap_or(1)) / 64.0)
            .collect();
        if let Ok(f) = Factor::from_table(format!("f{j}"), scope, values) {
            factors.push(f);
        }
    }

    let Ok(model) = Model::new("fuzz", vars, vec![], factors) else {
        return;
    };
    let target = VarId::from("v0");
    let queries: BTreeSet<VarId> = [target.clone()].into();
    let Ok(post) = VariableElimination::new(&model).posterior(&queries, &Assignment::new()) else {
        return;
    };

    let joint = model.joint_factor().expect("joint over a consistent model");
    let others: Vec<VarId> = joint.scope_ids().filter(|v| **v != target).cloned().collect();
    let expected = joint
        .sum_out_all(others.iter())
        .and_then(|f| f.normalized())
        .expect("strictly positive joint");
    for (row, want) in post.rows.iter().zip(expected.values()) {
        assert!((row.probability - want).abs() < 1e-9);
    }
});
