use crate::constraints::ConstraintStore;
use crate::subst::Subst;
use crate::term::{TermId, TermStore};
use std::sync::Arc;

/// A search state: the substitution plus the constraint store, sharing the
/// term store that interned the query's terms.
///
/// States are immutable by convention: goals derive extended states rather
/// than mutating the one they were given. Every constraint held in the
/// store is consistent with the substitution (revalidation on extension
/// enforces this).
#[derive(Clone)]
pub struct State {
    store: Arc<TermStore>,
    pub subst: Subst,
    pub constraints: ConstraintStore,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("subst", &self.subst)
            .field("constraints", &self.constraints)
            .finish()
    }
}

impl State {
    /// The empty state over a term store.
    pub fn new(store: Arc<TermStore>) -> Self {
        Self {
            store,
            subst: Subst::new(),
            constraints: ConstraintStore::default(),
        }
    }

    /// The shared term store.
    pub fn store(&self) -> &Arc<TermStore> {
        &self.store
    }

    /// Shallow resolution of a term through the substitution.
    pub fn walk(&self, t: TermId) -> TermId {
        self.subst.walk(t, &self.store)
    }

    /// Deep resolution of a term through the substitution.
    pub fn walk_all(&self, t: TermId) -> TermId {
        self.subst.walk_all(t, &self.store)
    }

    /// Whether the term is ground in this state.
    pub fn is_ground(&self, t: TermId) -> bool {
        self.subst.is_ground(t, &self.store)
    }

    /// Whether the term resolves to an unbound variable.
    pub fn is_var(&self, t: TermId) -> bool {
        self.store.is_var(self.walk(t)).is_some()
    }

    /// The same state with a replacement substitution.
    pub(crate) fn with_subst(&self, subst: Subst) -> State {
        State {
            store: self.store.clone(),
            subst,
            constraints: self.constraints.clone(),
        }
    }
}
