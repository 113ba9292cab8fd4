//! Worked examples with known answers.

use fg_core::{
    infer, most_probable_explanation, Assignment, Edge, Error, Factor, FixedOrder, Model, RandomVariable,
    Value, VarId, VariableElimination,
};
use std::collections::BTreeSet;
use std::sync::Arc;

const TOL: f64 = 1e-4;

fn boolean(id: &str, p: f64) -> Arc<RandomVariable> {
    Arc::new(RandomVariable::boolean(id, p).unwrap())
}

fn set(names: &[&str]) -> BTreeSet<VarId> {
    names.iter().map(|n| VarId::from(*n)).collect()
}

fn truth(a: &Assignment, var: &str) -> bool {
    a.get(&VarId::from(var)) == Some(&Value::Bool(true))
}

/// `P(child = T | parents)` as a factor over `parents + [child]`.
fn cpt(
    id: &str,
    parents: &[&Arc<RandomVariable>],
    child: &Arc<RandomVariable>,
    p_true: impl Fn(&[bool]) -> f64,
) -> Factor {
    let mut scope: Vec<_> = parents.iter().map(|p| Arc::clone(p)).collect();
    scope.push(Arc::clone(child));
    let parent_ids: Vec<String> = parents.iter().map(|p| p.id().to_string()).collect();
    let child_id = child.id().to_string();
    Factor::from_fn(id, scope, move |a| {
        let bits: Vec<bool> = parent_ids.iter().map(|p| truth(a, p)).collect();
        let p = p_true(&bits);
        if truth(a, &child_id) {
            p
        } else {
            1.0 - p
        }
    })
    .unwrap()
}

/// Three-variable chain a - b - c.
fn darwiche_chain() -> Model {
    let (a, b, c) = (boolean("a", 0.6), boolean("b", 0.5), boolean("c", 0.5));
    let prior = Factor::from_joint_vars(vec![Arc::clone(&a)]).unwrap();
    let phi_ba = cpt("phi_ba", &[&a], &b, |p| if p[0] { 0.9 } else { 0.2 });
    let phi_cb = cpt("phi_cb", &[&b], &c, |p| if p[0] { 0.3 } else { 0.5 });
    Model::new(
        "darwiche",
        vec![a, b, c],
        vec![Edge::directed("ab", "a", "b"), Edge::directed("bc", "b", "c")],
        vec![prior, phi_ba, phi_cb],
    )
    .unwrap()
}

/// Cloudy / sprinkler / rain / wet grass.
fn sprinkler() -> Model {
    let (c, s, r, w) = (boolean("cloudy", 0.5), boolean("sprinkler", 0.5), boolean("rain", 0.5), boolean("wet", 0.5));
    let pc = Factor::from_joint_vars(vec![Arc::clone(&c)]).unwrap();
    let ps = cpt("p_s", &[&c], &s, |p| if p[0] { 0.1 } else { 0.5 });
    let pr = cpt("p_r", &[&c], &r, |p| if p[0] { 0.8 } else { 0.2 });
    let pw = cpt("p_w", &[&s, &r], &w, |p| match (p[0], p[1]) {
        (true, true) => 0.99,
        (true, false) | (false, true) => 0.9,
        (false, false) => 0.0,
    });
    Model::new(
        "sprinkler",
        vec![c, s, r, w],
        vec![
            Edge::directed("cs", "cloudy", "sprinkler"),
            Edge::directed("cr", "cloudy", "rain"),
            Edge::directed("sw", "sprinkler", "wet"),
            Edge::directed("rw", "rain", "wet"),
        ],
        vec![pc, ps, pr, pw],
    )
    .unwrap()
}

#[test]
fn darwiche_chain_matches_hand_computation() {
    let model = darwiche_chain();
    let evidence = Assignment::new().with("a", true);
    let (factor, last) = infer(&model, &set(&["c"]), &evidence).unwrap();
    assert_eq!(last, Some(VarId::from("b")));
    let p = factor.normalize(&Assignment::new().with("c", true)).unwrap();
    assert!((p - 0.32).abs() < 1e-12, "P(c=T | a=T) = {p}");
}

#[test]
fn sprinkler_posteriors_given_wet_grass() {
    let model = sprinkler();
    let engine = VariableElimination::new(&model);
    let wet = Assignment::new().with("wet", true);

    let p_rain = engine.probability(&Assignment::new().with("rain", true), &wet).unwrap();
    let p_sprinkler = engine
        .probability(&Assignment::new().with("sprinkler", true), &wet)
        .unwrap();
    let p_wet = engine.evidence_probability(&wet).unwrap();

    assert!((p_rain - 0.7079).abs() < TOL, "P(R|W) = {p_rain}");
    assert!((p_sprinkler - 0.4298).abs() < TOL, "P(S|W) = {p_sprinkler}");
    assert!((p_wet - 0.6471).abs() < TOL, "P(W) = {p_wet}");
}

#[test]
fn sprinkler_explaining_away() {
    let model = sprinkler();
    let engine = VariableElimination::new(&model);
    let wet = Assignment::new().with("wet", true);
    let wet_and_rain = wet.clone().with("rain", true);
    let target = Assignment::new().with("sprinkler", true);
    let given_wet = engine.probability(&target, &wet).unwrap();
    let given_both = engine.probability(&target, &wet_and_rain).unwrap();
    assert!(given_both < given_wet);
}

#[test]
fn sprinkler_joint_query_sums_to_one() {
    let model = sprinkler();
    let post = VariableElimination::new(&model)
        .posterior(&set(&["rain", "sprinkler"]), &Assignment::new().with("wet", true))
        .unwrap();
    assert_eq!(post.rows.len(), 4);
    let total: f64 = post.rows.iter().map(|r| r.probability).sum();
    assert!((total - 1.0).abs() < 1e-12);
    // Wet grass with neither cause is impossible.
    let neither = Assignment::new().with("rain", false).with("sprinkler", false);
    assert_eq!(post.get(&neither), Some(0.0));
}

#[test]
fn order_does_not_change_sprinkler_answer() {
    let model = sprinkler();
    let queries = set(&["rain"]);
    let evidence = Assignment::new().with("wet", true);
    let default = VariableElimination::new(&model).posterior(&queries, &evidence).unwrap();
    let reversed = VariableElimination::new(&model)
        .with_ordering(FixedOrder(vec!["sprinkler".into(), "cloudy".into()]))
        .posterior(&queries, &evidence)
        .unwrap();
    assert_eq!(reversed.order, vec![VarId::from("sprinkler"), VarId::from("cloudy")]);
    for (x, y) in default.rows.iter().zip(&reversed.rows) {
        assert!((x.probability - y.probability).abs() < 1e-9);
    }
}

#[test]
fn zero_support_evidence_is_degenerate_not_nan() {
    let model = sprinkler();
    // wet=T with sprinkler=F and rain=F has probability zero.
    let evidence = Assignment::new()
        .with("wet", true)
        .with("sprinkler", false)
        .with("rain", false);
    let err = VariableElimination::new(&model)
        .probability(&Assignment::new().with("cloudy", true), &evidence)
        .unwrap_err();
    assert!(matches!(err, Error::DegenerateFactor { .. }), "{err}");
}

#[test]
fn invalid_queries_are_rejected() {
    let model = darwiche_chain();
    let none = Assignment::new();
    assert!(matches!(infer(&model, &BTreeSet::new(), &none), Err(Error::InvalidQuery(_))));
    assert!(matches!(
        infer(&model, &set(&["a"]), &Assignment::new().with("a", true)),
        Err(Error::InvalidQuery(_))
    ));
    assert!(matches!(infer(&model, &set(&["nope"]), &none), Err(Error::InvalidQuery(_))));
    assert!(matches!(
        infer(&model, &set(&["c"]), &Assignment::new().with("a", "maybe")),
        Err(Error::Scope(_))
    ));
}

#[test]
fn disconnected_components_do_not_interact() {
    let (a, b, x, y) = (boolean("a", 0.6), boolean("b", 0.5), boolean("x", 0.3), boolean("y", 0.5));
    let pa = Factor::from_joint_vars(vec![Arc::clone(&a)]).unwrap();
    let pba = cpt("p_b", &[&a], &b, |p| if p[0] { 0.9 } else { 0.2 });
    let px = Factor::from_joint_vars(vec![Arc::clone(&x)]).unwrap();
    let pyx = cpt("p_y", &[&x], &y, |p| if p[0] { 0.7 } else { 0.1 });
    let model = Model::new("two", vec![a, b, x, y], vec![], vec![pa, pba, px, pyx]).unwrap();
    let engine = VariableElimination::new(&model);

    let target = Assignment::new().with("b", true);
    let alone = engine.probability(&target, &Assignment::new()).unwrap();
    let with_other = engine
        .probability(&target, &Assignment::new().with("y", true))
        .unwrap();
    assert!((alone - 0.62).abs() < 1e-12);
    assert!((alone - with_other).abs() < 1e-12);

    let inference = engine.infer(&set(&["b"]), &Assignment::new()).unwrap();
    assert_eq!(inference.factor.scope_ids().collect::<Vec<_>>(), vec![&VarId::from("b")]);
}

#[test]
fn variable_without_factor_is_a_no_op() {
    let (a, idle) = (boolean("a", 0.25), boolean("idle", 0.5));
    let pa = Factor::from_joint_vars(vec![Arc::clone(&a)]).unwrap();
    let model = Model::new("idle", vec![a, idle], vec![], vec![pa]).unwrap();
    let (factor, last) = infer(&model, &set(&["a"]), &Assignment::new()).unwrap();
    assert_eq!(last, Some(VarId::from("idle")));
    let p = factor.normalize(&Assignment::new().with("a", true)).unwrap();
    assert!((p - 0.25).abs() < 1e-12);
}

#[test]
fn mpe_agrees_with_brute_force() {
    let model = sprinkler();
    let evidence = Assignment::new().with("wet", true);
    let mpe = most_probable_explanation(&model, &evidence).unwrap();

    let joint = model.joint_factor().unwrap().reduce_by_evidence(&evidence).unwrap();
    let (best, score) = joint.argmax();
    assert!((mpe.score - score).abs() < 1e-12);
    assert_eq!(mpe.assignment, best);
    let z = joint.partition();
    assert!((mpe.probability - score / z).abs() < 1e-12);
}

#[test]
fn edges_only_model_uses_marginal_products() {
    let (a, b) = (boolean("a", 0.7), boolean("b", 0.4));
    let model = Model::from_edges("pair", vec![a, b], vec![Edge::undirected("ab", "a", "b")]).unwrap();
    let p = VariableElimination::new(&model)
        .probability(&Assignment::new().with("b", true), &Assignment::new().with("a", false))
        .unwrap();
    assert!((p - 0.4).abs() < 1e-12);
}
