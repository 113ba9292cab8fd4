//! Fuzz target for model document parsing.
//!
//! Arbitrary JSON must either load into a consistent model or produce an
//! error. Loaded models must then answer a query without panicking.

#![no_main]

use fg_core::{Assignment, ModelDocument, VarId, VariableElimination, MAX_TABLE_LEN};
use libfuzzer_sys::fuzz_target;
use std::collections::{BTreeMap, BTreeSet};

/// Tables above this size are legal but too slow and too large to fuzz.
const FUZZ_TABLE_LEN: f64 = 4096.0;

/// Scopes past the table limit are refused before allocation, so only the
/// large-but-legal band is skipped.
fn too_costly(cells: f64) -> bool {
    cells > FUZZ_TABLE_LEN && cells <= MAX_TABLE_LEN as f64
}

fn cells<'a>(cards: &BTreeMap<&VarId, f64>, scope: impl IntoIterator<Item = &'a VarId>) -> f64 {
    scope
        .into_iter()
        .map(|v| cards.get(v).copied().unwrap_or(1.0))
        .product()
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(doc) = ModelDocument::from_json_str(text) else {
        return;
    };

    let cards: BTreeMap<&VarId, f64> = doc
        .variables
        .iter()
        .map(|v| (&v.id, v.domain.len() as f64))
        .collect();
    let wide_factor = doc.factors.iter().any(|f| too_costly(cells(&cards, &f.scope)));
    let wide_edge = doc
        .edges
        .iter()
        .any(|e| too_costly(cells(&cards, [&e.start, &e.end])));
    if wide_factor || wide_edge {
        return;
    }

    let Ok(model) = doc.into_model() else {
        return;
    };
    let joint: f64 = model.nodes().map(|v| v.cardinality() as f64).product();
    if joint > FUZZ_TABLE_LEN {
        return;
    }
    let queries: BTreeSet<VarId> = model.node_ids().take(1).cloned().collect();
    if !queries.is_empty() {
        let _ = VariableElimination::new(&model).posterior(&queries, &Assignment::new());
    }
});
