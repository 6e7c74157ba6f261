pub mod constraints;
pub mod error;
pub mod facts;
pub mod goal;
pub mod graph;
pub mod lists;
pub mod proto;
pub mod reify;
pub mod run;
pub mod state;
pub mod stream;
pub mod subst;
pub mod symbol;
pub mod term;
pub mod trace;
pub mod unify;

#[cfg(test)]
pub(crate) mod test_utils;

pub use constraints::{neq, not_typeo, typeo, ConstraintStore};
pub use error::Error;
pub use facts::{fact, facts, Relation};
pub use goal::{conde, eq, fail, fails, fresh, ground, lall, lany, onceo, succeed, Goal};
pub use graph::{eq_length, eq_rel, map_anyo, mapo, reduceo, rel2, walko, walko_with, BinaryRel, WalkOpts};
pub use lists::{appendo, conso, heado, itero, membero, nullo, rembero, tailo};
pub use proto::{applyo, ClassDef, ClassId, TermTag, UnifyHook};
pub use reify::reify;
pub use run::{run, run_all};
pub use state::State;
pub use stream::Stream;
pub use subst::Subst;
pub use symbol::{SymId, SymbolStore};
pub use term::{format_term, Term, TermId, TermStore};
pub use unify::{unify, unify_in};
