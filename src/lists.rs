//! Sequence goals over cons chains: construction, projection, membership,
//! concatenation, removal.

use crate::constraints::neq;
use crate::error::Error;
use crate::goal::{conde, eq, fresh, lall, Goal};
use crate::state::State;
use crate::stream::Stream;
use crate::term::{Term, TermId};

/// Goal: `cons(h, t) == l`. Any of the three may be unbound.
pub fn conso(h: TermId, t: TermId, l: TermId) -> Goal {
    Goal::new(move |s| {
        let cell = s.store().cons(h, t);
        eq(cell, l).apply(s)
    })
}

/// Goal: `h` is the first element of `l`.
pub fn heado(h: TermId, l: TermId) -> Goal {
    Goal::new(move |s| {
        let tail = s.store().var();
        let cell = s.store().cons(h, tail);
        eq(cell, l).apply(s)
    })
}

/// Goal: `t` is the rest of `l`.
pub fn tailo(t: TermId, l: TermId) -> Goal {
    Goal::new(move |s| {
        let head = s.store().var();
        let cell = s.store().cons(head, t);
        eq(cell, l).apply(s)
    })
}

/// Goal: every argument is the null sentinel (the empty sequence by
/// default, or a caller-supplied empty term).
pub fn nullo(terms: Vec<TermId>) -> Goal {
    nullo_as(None, terms)
}

pub(crate) fn nullo_as(null: Option<TermId>, terms: Vec<TermId>) -> Goal {
    Goal::new(move |s| {
        let sentinel = null.unwrap_or_else(|| s.store().nil());
        lall(terms.iter().map(|t| eq(*t, sentinel))).apply(s)
    })
}

/// Goal: `l` is a proper sequence (possibly enumerated open-endedly).
pub fn itero(l: TermId) -> Goal {
    Goal::new(move |s| {
        let nil = s.store().nil();
        conde(vec![
            vec![eq(l, nil)],
            vec![fresh(move |[c, d]| lall(vec![conso(c, d, l), itero(d)]))],
        ])
        .apply(s)
    })
}

/// Goal: `x` is an element of `coll`.
///
/// The collection's spine is resolved at application time and the goal
/// expands to a fair disjunction over its elements. A spine that ends in
/// an unbound variable is a typed error (`Error::NonGround`) rather than a
/// silent failure; a ground non-sequence simply fails.
pub fn membero(x: TermId, coll: TermId) -> Goal {
    Goal::new(move |s| {
        let coll_rf = s.walk_all(coll);
        let (elems, tail) = s.store().spine(coll_rf);
        match s.store().resolve(tail) {
            Some(Term::Nil) if elems.is_empty() => Stream::empty(),
            Some(Term::Nil) => {
                conde(elems.into_iter().map(|e| vec![eq(x, e)])).apply(s)
            }
            Some(Term::Var(_)) => Stream::fault(Error::NonGround {
                goal: "membero",
                arg: "collection",
            }),
            _ => Stream::empty(),
        }
    })
}

/// Goal: `l ++ s == out`. Produces lazily infinite splits when run with
/// unbound arguments.
pub fn appendo(l: TermId, s: TermId, out: TermId) -> Goal {
    Goal::new(move |st| {
        let nil = st.store().nil();
        conde(vec![
            vec![eq(l, nil), eq(s, out)],
            vec![fresh(move |[a, d, res]| {
                lall(vec![conso(a, d, l), conso(a, res, out), appendo(d, s, res)])
            })],
        ])
        .apply(st)
    })
}

/// Goal: `out` is `l` with the first occurrence of `x` removed.
pub fn rembero(x: TermId, l: TermId, out: TermId) -> Goal {
    Goal::new(move |s: State| {
        let nil = s.store().nil();
        conde(vec![
            vec![eq(l, nil), eq(out, nil)],
            vec![fresh(move |[car, cdr]| {
                lall(vec![conso(car, cdr, l), eq(x, car), eq(cdr, out)])
            })],
            vec![fresh(move |[car, cdr, rest]| {
                lall(vec![
                    conso(car, cdr, l),
                    neq(car, x),
                    conso(car, rest, out),
                    rembero(x, cdr, rest),
                ])
            })],
        ])
        .apply(s)
    })
}
