//! Constraint store: disequality, type membership and type exclusion.
//!
//! Constraints live in the state and are revalidated whenever unification
//! extends the substitution. A constraint that becomes decidable is either
//! discharged (satisfied, removed from the store) or kills the state.

use crate::goal::Goal;
use crate::proto::TermTag;
use crate::state::State;
use crate::stream::Stream;
use crate::subst::Subst;
use crate::term::{TermId, TermStore};
use crate::unify::unify_in;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// A disequality: the conjunction of the recorded pairs must not become
/// true. At least one pair has to fail to unify under every future
/// extension of the substitution; if all of them hold trivially the
/// constraint is violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diseq {
    pub(crate) pairs: SmallVec<[(TermId, TermId); 2]>,
}

/// A pending type constraint on a term: once ground, the term's kind tag
/// must match (`negated = false`) or differ from (`negated = true`) the
/// recorded tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCstr {
    pub(crate) term: TermId,
    pub(crate) tag: TermTag,
    pub(crate) negated: bool,
}

impl TypeCstr {
    fn satisfied_by(&self, store: &TermStore, ground: TermId) -> bool {
        (store.tag(ground) == self.tag) != self.negated
    }
}

/// The constraints attached to a state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintStore {
    pub(crate) diseqs: Vec<Diseq>,
    pub(crate) types: Vec<TypeCstr>,
}

impl ConstraintStore {
    pub fn is_empty(&self) -> bool {
        self.diseqs.is_empty() && self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diseqs.len() + self.types.len()
    }
}

/// Outcome of disunifying a pair list under a substitution.
enum Disunify {
    /// Some pair can never unify: the constraint holds forever.
    Satisfied,
    /// Every pair already holds with no extension: immediate violation.
    Violated,
    /// The pairs unify only under the returned extensions; those become
    /// the live pair list.
    Pending(SmallVec<[(TermId, TermId); 2]>),
}

fn disunify(store: &TermStore, subst: &Subst, pairs: &[(TermId, TermId)]) -> Disunify {
    let mut scratch = subst.clone();
    for (u, v) in pairs {
        if !unify_in(store, *u, *v, &mut scratch) {
            return Disunify::Satisfied;
        }
    }
    if scratch.len() == subst.len() {
        return Disunify::Violated;
    }
    let mut fresh: SmallVec<[(TermId, TermId); 2]> = SmallVec::new();
    for (idx, t) in scratch.iter() {
        if subst.get(idx).is_none() {
            fresh.push((store.var_ref(idx), t));
        }
    }
    Disunify::Pending(fresh)
}

/// Re-check every constraint against an extended substitution.
/// Returns None when a constraint is violated.
pub(crate) fn revalidate(mut state: State) -> Option<State> {
    let store = state.store().clone();

    let types = std::mem::take(&mut state.constraints.types);
    let mut kept_types = Vec::with_capacity(types.len());
    for c in types {
        let t = state.subst.walk_all(c.term, &store);
        if store.is_ground(t) {
            if !c.satisfied_by(&store, t) {
                #[cfg(feature = "tracing")]
                trace!(tag = ?c.tag, "type_constraint_violated");
                return None;
            }
        } else {
            kept_types.push(c);
        }
    }
    state.constraints.types = kept_types;

    let diseqs = std::mem::take(&mut state.constraints.diseqs);
    let mut kept = Vec::with_capacity(diseqs.len());
    for d in diseqs {
        match disunify(&store, &state.subst, &d.pairs) {
            Disunify::Satisfied => {}
            Disunify::Violated => {
                #[cfg(feature = "tracing")]
                trace!("disequality_violated");
                return None;
            }
            Disunify::Pending(pairs) => kept.push(Diseq { pairs }),
        }
    }
    state.constraints.diseqs = kept;

    Some(state)
}

/// Goal: `u` and `v` never unify.
///
/// Posting disunifies the arguments under the current substitution: if
/// they cannot unify the goal just succeeds; if they are already equal it
/// fails; otherwise the would-be bindings are recorded and at least one of
/// them must eventually fail.
pub fn neq(u: TermId, v: TermId) -> Goal {
    Goal::new(move |s| {
        let store = s.store().clone();
        match disunify(&store, &s.subst, &[(u, v)]) {
            Disunify::Satisfied => Stream::unit(s),
            Disunify::Violated => Stream::empty(),
            Disunify::Pending(pairs) => {
                let mut next = s;
                next.constraints.diseqs.push(Diseq { pairs });
                Stream::unit(next)
            }
        }
    })
}

/// Goal: once ground, `t`'s kind is `tag`.
pub fn typeo(t: TermId, tag: TermTag) -> Goal {
    type_goal(t, tag, false)
}

/// Goal: once ground, `t`'s kind is anything but `tag`.
pub fn not_typeo(t: TermId, tag: TermTag) -> Goal {
    type_goal(t, tag, true)
}

fn type_goal(t: TermId, tag: TermTag, negated: bool) -> Goal {
    Goal::new(move |s| {
        let rf = s.walk_all(t);
        let c = TypeCstr {
            term: rf,
            tag,
            negated,
        };
        if s.store().is_ground(rf) {
            let sat = c.satisfied_by(s.store(), rf);
            if sat {
                Stream::unit(s)
            } else {
                Stream::empty()
            }
        } else {
            let mut next = s;
            next.constraints.types.push(c);
            Stream::unit(next)
        }
    })
}
