use crate::constraints::revalidate;
use crate::state::State;
use crate::subst::Subst;
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Unify two terms in a state.
///
/// On success the returned state extends the input's substitution; an
/// extension triggers revalidation of every pending constraint, and a
/// violated constraint makes the whole unification fail. Failure is a
/// logical outcome, not an error.
pub fn unify(u: TermId, v: TermId, state: &State) -> Option<State> {
    let store = state.store();
    let mut subst = state.subst.clone();
    if !unify_in(store, u, v, &mut subst) {
        #[cfg(feature = "tracing")]
        trace!(?u, ?v, "unify_failed");
        return None;
    }
    if subst.len() == state.subst.len() {
        // No extension: constraints cannot have changed.
        return Some(state.clone());
    }
    revalidate(state.with_subst(subst))
}

/// Unify two terms at the substitution level, extending in place.
///
/// Worklist-driven, no recursion. Dispatch is open: a hook registered for
/// the pair of kind tags takes over that pair entirely; the built-in path
/// covers variables, atoms, cons cells and same-class instances. The
/// occurs check runs only when the store was built with it enabled.
pub fn unify_in(store: &TermStore, u: TermId, v: TermId, subst: &mut Subst) -> bool {
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    worklist.push((u, v));

    while let Some((a, b)) = worklist.pop() {
        let a = subst.walk(a, store);
        let b = subst.walk(b, store);

        if a == b {
            // Same term (atom ids are canonical, variables identical).
            continue;
        }

        let (ta, tb) = (store.tag(a), store.tag(b));
        if let Some((hook, swapped)) = store.unify_hook(ta, tb) {
            let ok = if swapped {
                hook(store, b, a, subst)
            } else {
                hook(store, a, b, subst)
            };
            if !ok {
                #[cfg(feature = "tracing")]
                trace!("unify_hook_failed");
                return false;
            }
            continue;
        }

        match (store.resolve(a), store.resolve(b)) {
            (Some(Term::Var(ia)), Some(Term::Var(ib))) => {
                // Bind higher-indexed to lower-indexed for consistency.
                if ia < ib {
                    subst.bind(ib, a);
                } else {
                    subst.bind(ia, b);
                }
            }
            (Some(Term::Var(idx)), Some(_)) => {
                if store.occurs_check_enabled() && occurs(idx, b, subst, store) {
                    #[cfg(feature = "tracing")]
                    trace!(var = idx, "unify_occurs_check_failed");
                    return false;
                }
                subst.bind(idx, b);
            }
            (Some(_), Some(Term::Var(idx))) => {
                if store.occurs_check_enabled() && occurs(idx, a, subst, store) {
                    #[cfg(feature = "tracing")]
                    trace!(var = idx, "unify_occurs_check_failed");
                    return false;
                }
                subst.bind(idx, a);
            }
            (Some(Term::Cons(a1, a2)), Some(Term::Cons(b1, b2))) => {
                worklist.push((a2, b2));
                worklist.push((a1, b1));
            }
            (Some(Term::Ext(ca, xs)), Some(Term::Ext(cb, ys))) => {
                // Default path for class instances without a hook:
                // same class, same arity, children pairwise.
                if ca != cb || xs.len() != ys.len() {
                    return false;
                }
                for (x, y) in xs.iter().zip(ys.iter()).rev() {
                    worklist.push((*x, *y));
                }
            }
            _ => {
                // Distinct atoms, or a structural mismatch.
                return false;
            }
        }
    }

    true
}

/// Occurs check: does variable `var` occur in `term` under the
/// substitution? Prevents creating infinite terms when enabled.
fn occurs(var: u32, term: TermId, subst: &Subst, store: &TermStore) -> bool {
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);

    while let Some(t) = stack.pop() {
        let t = subst.walk(t, store);
        match store.resolve(t) {
            Some(Term::Var(idx)) => {
                if idx == var {
                    return true;
                }
            }
            Some(Term::Cons(h, r)) => {
                stack.push(h);
                stack.push(r);
            }
            Some(Term::Ext(_, children)) => {
                for c in children.iter() {
                    stack.push(*c);
                }
            }
            _ => {}
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{TermTag, UnifyHook};
    use crate::test_utils::setup;
    use std::sync::Arc;

    fn unify_pair(store: &TermStore, a: TermId, b: TermId) -> Option<Subst> {
        let mut subst = Subst::new();
        if unify_in(store, a, b, &mut subst) {
            Some(subst)
        } else {
            None
        }
    }

    // ========== IDENTICAL TERMS ==========

    #[test]
    fn unify_same_atom_is_trivial() {
        let store = setup();
        let t = store.sym("a");
        let subst = unify_pair(&store, t, t).unwrap();
        assert!(subst.is_empty());
    }

    #[test]
    fn unify_same_var_is_trivial() {
        let store = setup();
        let v = store.var();
        let subst = unify_pair(&store, v, v).unwrap();
        assert!(subst.is_empty());
    }

    // ========== VARIABLE BINDING ==========

    #[test]
    fn var_binds_to_ground() {
        let store = setup();
        let v = store.var();
        let idx = store.is_var(v).unwrap();
        let t = store.int(3);

        let subst = unify_pair(&store, v, t).unwrap();
        assert_eq!(subst.get(idx), Some(t));

        let subst2 = unify_pair(&store, t, v).unwrap();
        assert_eq!(subst2.get(idx), Some(t));
    }

    #[test]
    fn var_binds_to_var() {
        let store = setup();
        let a = store.var();
        let b = store.var();
        let subst = unify_pair(&store, a, b).unwrap();
        assert_eq!(subst.len(), 1);
        assert_eq!(subst.walk(a, &store), subst.walk(b, &store));
    }

    // ========== STRUCTURAL ==========

    #[test]
    fn chains_unify_pairwise() {
        let store = setup();
        let [x, y] = store.vars::<2>();
        let lhs = store.list(&[store.int(1), x]);
        let rhs = store.list(&[y, store.int(2)]);

        let subst = unify_pair(&store, lhs, rhs).unwrap();
        assert_eq!(subst.walk_all(lhs, &store), store.list(&[store.int(1), store.int(2)]));
        assert_eq!(subst.walk_all(rhs, &store), store.list(&[store.int(1), store.int(2)]));
    }

    #[test]
    fn length_mismatch_fails() {
        let store = setup();
        let lhs = store.list(&[store.int(1)]);
        let rhs = store.list(&[store.int(1), store.int(2)]);
        assert!(unify_pair(&store, lhs, rhs).is_none());
    }

    #[test]
    fn head_mismatch_fails() {
        let store = setup();
        let lhs = store.expr(store.sym("f"), &[store.int(1)]);
        let rhs = store.expr(store.sym("g"), &[store.int(1)]);
        assert!(unify_pair(&store, lhs, rhs).is_none());
    }

    #[test]
    fn shared_var_must_agree() {
        let store = setup();
        let x = store.var();
        let lhs = store.list(&[x, x]);
        let rhs = store.list(&[store.int(1), store.int(2)]);
        assert!(unify_pair(&store, lhs, rhs).is_none());
    }

    #[test]
    fn nested_unification_threads_bindings() {
        let store = setup();
        let [x, y] = store.vars::<2>();
        let g = store.sym("g");
        let f = store.sym("f");
        let lhs = store.expr(f, &[store.expr(g, &[x]), y]);
        let rhs = store.expr(f, &[store.expr(g, &[store.int(1)]), store.int(2)]);

        let subst = unify_pair(&store, lhs, rhs).unwrap();
        assert_eq!(subst.walk_all(x, &store), store.int(1));
        assert_eq!(subst.walk_all(y, &store), store.int(2));
    }

    #[test]
    fn improper_chain_tail_unifies() {
        let store = setup();
        let t = store.var();
        let lhs = store.cons(store.int(1), t);
        let rhs = store.list(&[store.int(1), store.int(2)]);

        let subst = unify_pair(&store, lhs, rhs).unwrap();
        assert_eq!(subst.walk_all(t, &store), store.list(&[store.int(2)]));
    }

    // ========== ATOMS ==========

    #[test]
    fn distinct_atoms_fail() {
        let store = setup();
        assert!(unify_pair(&store, store.sym("a"), store.sym("b")).is_none());
        assert!(unify_pair(&store, store.int(1), store.int(2)).is_none());
        assert!(unify_pair(&store, store.int(1), store.sym("1")).is_none());
        assert!(unify_pair(&store, store.nil(), store.sym("nil")).is_none());
    }

    #[test]
    fn nil_unifies_with_nil() {
        let store = setup();
        assert!(unify_pair(&store, store.nil(), store.nil()).is_some());
    }

    // ========== IDEMPOTENCE / SOUNDNESS ==========

    #[test]
    fn unify_is_idempotent() {
        let store = setup();
        let x = store.var();
        let lhs = store.list(&[x]);
        let rhs = store.list(&[store.int(5)]);

        let mut subst = Subst::new();
        assert!(unify_in(&store, lhs, rhs, &mut subst));
        let len = subst.len();
        assert!(unify_in(&store, lhs, rhs, &mut subst));
        assert_eq!(subst.len(), len);
    }

    #[test]
    fn unified_terms_walk_to_the_same_term() {
        let store = setup();
        let [x, y] = store.vars::<2>();
        let lhs = store.list(&[x, store.int(2)]);
        let rhs = store.list(&[store.int(1), y]);

        let subst = unify_pair(&store, lhs, rhs).unwrap();
        assert_eq!(subst.walk_all(lhs, &store), subst.walk_all(rhs, &store));
    }

    // ========== OCCURS CHECK ==========

    #[test]
    fn occurs_check_off_by_default() {
        let store = setup();
        let x = store.var();
        let fx = store.expr(store.sym("f"), &[x]);
        // binds x to f(x); walk_all on x is the caller's problem
        assert!(unify_pair(&store, x, fx).is_some());
    }

    #[test]
    fn occurs_check_rejects_cyclic_binding_when_enabled() {
        let store = Arc::new(TermStore::with_occurs_check());
        let x = store.var();
        let fx = store.expr(store.sym("f"), &[x]);
        assert!(unify_pair(&store, x, fx).is_none());
    }

    #[test]
    fn occurs_check_through_substitution() {
        let store = Arc::new(TermStore::with_occurs_check());
        let [x, y] = store.vars::<2>();
        let f = store.sym("f");
        let fx = store.expr(f, &[x]);
        // (x y) against (y f(x)): after x = y the second pair is y vs f(y)
        let lhs = store.list(&[x, y]);
        let rhs = store.list(&[y, fx]);
        assert!(unify_pair(&store, lhs, rhs).is_none());
    }

    // ========== CLASS INSTANCES ==========

    #[test]
    fn same_class_unifies_pairwise() {
        let store = setup();
        let pair = store.register_class("pair", Some(2), None);
        let x = store.var();
        let lhs = store.ext(pair, &[x, store.int(2)]).unwrap();
        let rhs = store.ext(pair, &[store.int(1), store.int(2)]).unwrap();

        let subst = unify_pair(&store, lhs, rhs).unwrap();
        assert_eq!(subst.walk_all(x, &store), store.int(1));
    }

    #[test]
    fn different_classes_fail() {
        let store = setup();
        let a = store.register_class("a", Some(1), None);
        let b = store.register_class("b", Some(1), None);
        let lhs = store.ext(a, &[store.int(1)]).unwrap();
        let rhs = store.ext(b, &[store.int(1)]).unwrap();
        assert!(unify_pair(&store, lhs, rhs).is_none());
    }

    #[test]
    fn registered_hook_overrides_class_pair() {
        let store = setup();
        // a "bag" whose two elements unify in either order
        let hook: UnifyHook = Arc::new(|st, a, b, subst| {
            let xs = match st.resolve(a) {
                Some(Term::Ext(_, ch)) => ch,
                _ => return false,
            };
            let ys = match st.resolve(b) {
                Some(Term::Ext(_, ch)) => ch,
                _ => return false,
            };
            if xs.len() != 2 || ys.len() != 2 {
                return false;
            }
            let mut forward = subst.clone();
            if unify_in(st, xs[0], ys[0], &mut forward) && unify_in(st, xs[1], ys[1], &mut forward)
            {
                *subst = forward;
                return true;
            }
            let mut swapped = subst.clone();
            if unify_in(st, xs[0], ys[1], &mut swapped) && unify_in(st, xs[1], ys[0], &mut swapped)
            {
                *subst = swapped;
                return true;
            }
            false
        });
        let bag = store.register_class("bag", Some(2), Some(hook));

        let lhs = store.ext(bag, &[store.int(1), store.int(2)]).unwrap();
        let rhs = store.ext(bag, &[store.int(2), store.int(1)]).unwrap();
        assert!(unify_pair(&store, lhs, rhs).is_some());

        let rhs2 = store.ext(bag, &[store.int(2), store.int(3)]).unwrap();
        assert!(unify_pair(&store, lhs, rhs2).is_none());
    }

    #[test]
    fn last_hook_registration_wins() {
        let store = setup();
        let always_no: UnifyHook = Arc::new(|_, _, _, _| false);
        let always_yes: UnifyHook = Arc::new(|_, _, _, _| true);
        let d = store.register_class("d", Some(1), None);
        let da = store.ext(d, &[store.int(1)]).unwrap();
        let db = store.ext(d, &[store.int(2)]).unwrap();
        store.register_unify(TermTag::Class(d), TermTag::Class(d), always_no);
        assert!(unify_pair(&store, da, db).is_none());
        store.register_unify(TermTag::Class(d), TermTag::Class(d), always_yes);
        assert!(unify_pair(&store, da, db).is_some());
    }
}
