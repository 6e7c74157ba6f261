//! Goals and the core combinators.
//!
//! A goal is a pure function from a state to a lazy stream of states.
//! Constructors capture term ids (cheap copies) and build their subgoals
//! at application time, so recursive relations cost nothing to define and
//! only unfold as the stream is pulled.

use crate::state::State;
use crate::stream::Stream;
use crate::term::TermId;
use crate::unify::unify;
use std::sync::Arc;

/// A goal: `State -> Stream`. Cloning is cheap (shared function).
#[derive(Clone)]
pub struct Goal(Arc<dyn Fn(State) -> Stream>);

impl Goal {
    /// Wrap a state function as a goal.
    pub fn new(f: impl Fn(State) -> Stream + 'static) -> Self {
        Goal(Arc::new(f))
    }

    /// Apply the goal to a state.
    pub fn apply(&self, s: State) -> Stream {
        (self.0)(s)
    }
}

impl std::fmt::Debug for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Goal")
    }
}

/// The goal that always succeeds, passing its state through.
pub fn succeed() -> Goal {
    Goal::new(Stream::unit)
}

/// The goal that always fails.
pub fn fail() -> Goal {
    Goal::new(|_| Stream::empty())
}

/// Goal: `u` and `v` unify. The workhorse.
pub fn eq(u: TermId, v: TermId) -> Goal {
    Goal::new(move |s| match unify(u, v, &s) {
        Some(next) => Stream::unit(next),
        None => Stream::empty(),
    })
}

/// Conjunction of goals, left-associated through fair flat-map.
/// An empty conjunction succeeds.
pub fn lall(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let goals: Vec<Goal> = goals.into_iter().collect();
    Goal::new(move |s| {
        let mut iter = goals.iter();
        let first = match iter.next() {
            None => return Stream::unit(s),
            Some(g) => g,
        };
        let mut stream = first.apply(s);
        for g in iter {
            stream = stream.bind(g.clone());
        }
        stream
    })
}

/// Fair disjunction of goals. Every arm is wrapped in a suspension so the
/// merge interleaves; the k-th answer of any arm appears at a bounded
/// position regardless of the other arms. An empty disjunction succeeds.
pub fn lany(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let goals: Vec<Goal> = goals.into_iter().collect();
    Goal::new(move |s| {
        if goals.is_empty() {
            return Stream::unit(s);
        }
        let mut stream = Stream::empty();
        for g in goals.iter().rev() {
            let g = g.clone();
            let state = s.clone();
            stream = Stream::suspend(move || g.apply(state)).mplus(stream);
        }
        stream
    })
}

/// Disjunction of conjunctions: `conde([g11, g12], [g21], ...)`.
pub fn conde(clauses: impl IntoIterator<Item = Vec<Goal>>) -> Goal {
    lany(clauses.into_iter().map(lall))
}

/// Introduce N fresh variables scoped to the body goal.
pub fn fresh<const N: usize, F>(body: F) -> Goal
where
    F: Fn([TermId; N]) -> Goal + 'static,
{
    Goal::new(move |s| {
        let vars = std::array::from_fn(|_| s.store().var());
        body(vars).apply(s)
    })
}

/// At most one state from the goal. Pulls the underlying stream until the
/// first answer, so it diverges exactly when the goal's search does.
pub fn onceo(g: Goal) -> Goal {
    Goal::new(move |s| match g.apply(s).into_iter().next() {
        None => Stream::empty(),
        Some(Ok(st)) => Stream::unit(st),
        Some(Err(e)) => Stream::fault(e),
    })
}

/// Negation as failure: succeeds with the unchanged state exactly when the
/// goal has no answers. Only meaningful over goals with a finite search;
/// an unbound argument on the failing side will not terminate.
pub fn fails(g: Goal) -> Goal {
    Goal::new(move |s| match g.apply(s.clone()).into_iter().next() {
        None => Stream::unit(s),
        Some(Ok(_)) => Stream::empty(),
        Some(Err(e)) => Stream::fault(e),
    })
}

/// Goal: the term is fully ground in the current state.
pub fn ground(t: TermId) -> Goal {
    Goal::new(move |s| {
        if s.is_ground(t) {
            Stream::unit(s)
        } else {
            Stream::empty()
        }
    })
}
