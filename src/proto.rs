//! Structural term protocol: kind tags, the user term-class registry, and
//! the `applyo` goal relating a compound to its head and children.
//!
//! This is the engine's single extension point. A provider registers a
//! class (name, optional arity, optional unification hook) and its
//! instances unify and walk like any built-in compound. The default
//! protocol treats a cons chain as a compound whose head is the first
//! element.

use crate::error::Error;
use crate::goal::{eq, lall, Goal};
use crate::lists::conso;
use crate::stream::Stream;
use crate::subst::Subst;
use crate::symbol::SymId;
use crate::term::{Term, TermId, TermStore};
use std::sync::Arc;

/// Identifier for a registered term class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        ClassId(raw)
    }
}

/// The kind of a term, used for unification dispatch and type constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermTag {
    Var,
    Sym,
    Int,
    Nil,
    Cons,
    Hole,
    Class(ClassId),
}

/// A unification hook: fully handles one pair of term kinds, extending the
/// substitution in place. Hooks must extend (never rewrite) the input
/// substitution, idempotently and commutatively; they may recurse through
/// `unify::unify_in`.
pub type UnifyHook = Arc<dyn Fn(&TermStore, TermId, TermId, &mut Subst) -> bool + Send + Sync>;

/// Definition of a registered term class.
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Display and head-symbol name.
    pub name: String,
    /// The interned head symbol of instances.
    pub sym: SymId,
    /// Fixed child count, checked at reconstruction.
    pub arity: Option<usize>,
}

/// Project a compound into (head, children-sequence).
/// Cons chains split into first element and rest; class instances project
/// as their class symbol and a proper list of children. Atoms, variables
/// and the empty sequence have no head.
pub fn decompose(store: &TermStore, t: TermId) -> Option<(TermId, TermId)> {
    match store.resolve(t) {
        Some(Term::Cons(h, r)) => Some((h, r)),
        Some(Term::Ext(class, children)) => {
            let def = store.class_def(class)?;
            Some((store.sym_ref(def.sym), store.list(&children)))
        }
        _ => None,
    }
}

/// Rebuild a compound from a head and a children sequence.
/// A head symbol registered as a class name with a proper children list
/// rebuilds a class instance (arity-checked); anything else becomes a
/// plain chain.
pub fn reconstruct(store: &TermStore, head: TermId, rands: TermId) -> Result<TermId, Error> {
    if let Some(Term::Sym(s)) = store.resolve(head) {
        if let Some(class) = store.class_of_sym(s) {
            let (elems, tail) = store.spine(rands);
            if store.resolve(tail) == Some(Term::Nil) {
                return store.ext(class, &elems);
            }
        }
    }
    Ok(store.cons(head, rands))
}

/// Relate an object to the application of its head to its children:
/// `head(children...) == obj`, three-way relational.
///
/// With a ground object the head and children are projected out; with an
/// unbound object and unbound head or children the cons relationship is
/// asserted; with ground head and children the object is rebuilt (which
/// surfaces arity errors for registered classes).
pub fn applyo(rator: TermId, rands: TermId, obj: TermId) -> Goal {
    Goal::new(move |s| {
        let store = s.store().clone();
        let obj_rf = s.walk_all(obj);
        if store.is_var(obj_rf).is_none() {
            match decompose(&store, obj_rf) {
                Some((head, rest)) => lall(vec![eq(rator, head), eq(rands, rest)]).apply(s),
                None => Stream::empty(),
            }
        } else {
            let rator_rf = s.walk_all(rator);
            let rands_rf = s.walk_all(rands);
            let (_, tail) = store.spine(rands_rf);
            let rands_proper = store.resolve(tail) == Some(Term::Nil);
            if store.is_var(rator_rf).is_some() || !rands_proper {
                conso(rator, rands, obj).apply(s)
            } else {
                match reconstruct(&store, rator_rf, rands_rf) {
                    Ok(t) => eq(obj, t).apply(s),
                    Err(e) => Stream::fault(e),
                }
            }
        }
    })
}
