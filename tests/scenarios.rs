//! End-to-end queries exercising the full engine: unification, fair
//! search, constraints, fact bases, and graph rewriting.

use relog::{
    conde, eq, facts, fresh, lall, lany, membero, neq, reduceo, rel2, run, walko, BinaryRel,
    Relation, TermId, TermStore,
};
use std::sync::Arc;

fn setup() -> Arc<TermStore> {
    Arc::new(TermStore::new())
}

/// add(x, x) -> mul(2, x); log(exp(x)) -> x
fn math_rules(store: &Arc<TermStore>) -> BinaryRel {
    let st = store.clone();
    rel2(move |a, b| {
        let st1 = st.clone();
        let st2 = st.clone();
        conde(vec![
            vec![fresh(move |[x]| {
                let lhs = st1.expr(st1.sym("add"), &[x, x]);
                let rhs = st1.expr(st1.sym("mul"), &[st1.int(2), x]);
                lall(vec![eq(a, lhs), eq(b, rhs)])
            })],
            vec![fresh(move |[x]| {
                let lhs = st2.expr(st2.sym("log"), &[st2.expr(st2.sym("exp"), &[x])]);
                lall(vec![eq(a, lhs), eq(b, x)])
            })],
        ])
    })
}

// ========== CORE QUERIES ==========

#[test]
fn bind_a_variable() {
    let store = setup();
    let x = store.var();
    assert_eq!(
        run(1, x, vec![eq(x, store.int(5))], &store).unwrap(),
        vec![store.int(5)]
    );
}

#[test]
fn bind_through_another_variable() {
    let store = setup();
    let [x, z] = store.vars::<2>();
    let q = store.list(&[x, z]);
    assert_eq!(
        run(1, q, vec![eq(x, z), eq(z, store.int(3))], &store).unwrap(),
        vec![store.list(&[store.int(3), store.int(3)])]
    );
}

#[test]
fn unify_inside_a_tuple() {
    let store = setup();
    let x = store.var();
    let lhs = store.list(&[store.int(1), store.int(2)]);
    let rhs = store.list(&[store.int(1), x]);
    assert_eq!(
        run(1, x, vec![eq(lhs, rhs)], &store).unwrap(),
        vec![store.int(2)]
    );
}

#[test]
fn membership_intersection() {
    let store = setup();
    let x = store.var();
    let c1 = store.list(&[store.int(1), store.int(2), store.int(3)]);
    let c2 = store.list(&[store.int(2), store.int(3), store.int(4)]);
    let mut res = run(0, x, vec![membero(x, c1), membero(x, c2)], &store).unwrap();
    res.sort();
    assert_eq!(res, vec![store.int(2), store.int(3)]);
}

// ========== FACT BASES ==========

#[test]
fn grandparent_from_parent_facts() {
    let store = setup();
    let parent = Relation::new("parent");
    let homer = store.sym("Homer");
    let bart = store.sym("Bart");
    let lisa = store.sym("Lisa");
    let abe = store.sym("Abe");
    facts(
        &parent,
        &store,
        &[&[homer, bart], &[homer, lisa], &[abe, homer]],
    );

    // direct parent
    let x = store.var();
    assert_eq!(
        run(1, x, vec![parent.query(&[x, bart])], &store).unwrap(),
        vec![homer]
    );

    // grandparent via a fresh intermediate
    let g = store.var();
    let p = parent.clone();
    let grandparent = fresh(move |[y]| lall(vec![p.query(&[g, y]), p.query(&[y, bart])]));
    assert_eq!(run(1, g, vec![grandparent], &store).unwrap(), vec![abe]);
}

// ========== CONSTRAINTS ==========

#[test]
fn disequality_prunes_membership() {
    let store = setup();
    let x = store.var();
    let coll = store.list(&[store.int(1), store.int(2), store.int(3)]);
    let res = run(
        0,
        x,
        vec![
            neq(x, store.int(1)),
            neq(x, store.int(3)),
            membero(x, coll),
        ],
        &store,
    )
    .unwrap();
    assert_eq!(res, vec![store.int(2)]);
}

// ========== GRAPH REWRITING ==========

#[test]
fn reduction_yields_exactly_the_rewrite_set() {
    let store = setup();
    let q = store.var();
    let reduce = reduceo(math_rules(&store));

    let add = store.sym("add");
    let mul = store.sym("mul");
    let log = store.sym("log");
    let exp = store.sym("exp");

    let add33 = store.expr(add, &[store.int(3), store.int(3)]);
    let exp5 = store.expr(exp, &[store.int(5)]);
    let exp_log_exp5 = store.expr(exp, &[store.expr(log, &[exp5])]);
    let input = store.expr(add, &[add33, exp_log_exp5]);

    let mut res = run(0, q, vec![walko(reduce, input, q)], &store).unwrap();
    res.sort();

    let mul23 = store.expr(mul, &[store.int(2), store.int(3)]);
    let mut expected = vec![
        store.expr(add, &[mul23, exp5]),
        store.expr(add, &[add33, exp5]),
        store.expr(add, &[mul23, exp_log_exp5]),
    ];
    expected.sort();

    assert_eq!(res, expected);
}

#[test]
fn expansion_finds_known_preimages_early() {
    let store = setup();
    let e = store.var();
    let reduce = reduceo(math_rules(&store));

    let mul = store.sym("mul");
    let add = store.sym("add");
    let log = store.sym("log");
    let exp = store.sym("exp");

    let target = store.expr(mul, &[store.int(2), store.int(5)]);
    let res = run(10, e, vec![walko(reduce, e, target)], &store).unwrap();

    let add55 = store.expr(add, &[store.int(5), store.int(5)]);
    let log_exp_add55 = store.expr(log, &[store.expr(exp, &[add55])]);
    assert!(res.contains(&add55), "one-step preimage missing");
    assert!(res.contains(&log_exp_add55), "two-step preimage missing");
}

#[test]
fn identity_walk_round_trips_ground_terms() {
    let store = setup();
    let t = store.expr(
        store.sym("f"),
        &[
            store.int(1),
            store.expr(store.sym("g"), &[store.sym("a")]),
        ],
    );

    let q = store.var();
    let forward = run(0, q, vec![walko(relog::eq_rel(), t, q)], &store).unwrap();
    assert!(forward.contains(&t));

    let p = store.var();
    let backward = run(0, p, vec![walko(relog::eq_rel(), p, t)], &store).unwrap();
    assert!(backward.contains(&t));
}

// ========== FAIRNESS ==========

/// Peano naturals: an infinite relation.
fn natso(n: TermId, store: &Arc<TermStore>) -> relog::Goal {
    let st = store.clone();
    relog::Goal::new(move |s| {
        let z = st.sym("z");
        let st2 = st.clone();
        conde(vec![
            vec![eq(n, z)],
            vec![fresh(move |[m]| {
                let succ = st2.expr(st2.sym("s"), &[m]);
                lall(vec![eq(n, succ), natso(m, &st2)])
            })],
        ])
        .apply(s)
    })
}

#[test]
fn finite_disjunct_survives_an_infinite_sibling() {
    let store = setup();
    let x = store.var();
    let marker = store.sym("done");
    let res = run(
        4,
        x,
        vec![lany(vec![natso(x, &store), eq(x, marker)])],
        &store,
    )
    .unwrap();
    assert!(res.contains(&marker));
}

#[test]
fn conjunction_order_does_not_change_the_answer_set() {
    let store = setup();
    let x = store.var();
    let coll = store.list(&[store.int(1), store.int(2)]);
    let mut a = run(0, x, vec![membero(x, coll), neq(x, store.int(1))], &store).unwrap();
    let mut b = run(0, x, vec![neq(x, store.int(1)), membero(x, coll)], &store).unwrap();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}
