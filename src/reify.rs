//! Reification: resolve a term against a state and rename the unbound
//! variables that remain to stable placeholders.
//!
//! Unnamed variables become `~_k`, numbered by first occurrence scanning
//! left to right, so structurally equal answers from different branches
//! reify to the same term id. Named variables keep their identity and
//! print as `~name`.

use crate::state::State;
use crate::term::{Term, TermId, TermStore};
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Reify a term against a state.
pub fn reify(q: TermId, state: &State) -> TermId {
    let store = state.store();
    let resolved = state.walk_all(q);
    let mut seen: HashMap<u32, TermId> = HashMap::new();
    let mut next = 0u32;
    rename(resolved, store, &mut seen, &mut next)
}

/// Replace unnamed free variables with holes, numbering them in
/// left-to-right first-occurrence order.
fn rename(
    term: TermId,
    store: &TermStore,
    seen: &mut HashMap<u32, TermId>,
    next: &mut u32,
) -> TermId {
    let mut work: Vec<(TermId, bool)> = vec![(term, false)];
    let mut results: Vec<TermId> = Vec::new();

    while let Some((t, children_done)) = work.pop() {
        if children_done {
            match store.resolve(t) {
                Some(Term::Cons(_, _)) => {
                    let rest = results.pop().unwrap();
                    let head = results.pop().unwrap();
                    results.push(store.cons(head, rest));
                }
                Some(Term::Ext(class, children)) => {
                    let n = children.len();
                    let rebuilt: SmallVec<[TermId; 4]> =
                        results.drain(results.len() - n..).collect();
                    results.push(store.ext_raw(class, rebuilt));
                }
                _ => unreachable!("only compound terms are revisited"),
            }
        } else {
            match store.resolve(t) {
                Some(Term::Var(idx)) => {
                    if store.var_name(idx).is_some() {
                        results.push(t);
                    } else {
                        let hole = *seen.entry(idx).or_insert_with(|| {
                            let h = store.hole(*next);
                            *next += 1;
                            h
                        });
                        results.push(hole);
                    }
                }
                Some(Term::Cons(h, r)) => {
                    work.push((t, true));
                    work.push((r, false));
                    work.push((h, false));
                }
                Some(Term::Ext(_, children)) if !children.is_empty() => {
                    work.push((t, true));
                    for c in children.iter().rev() {
                        work.push((*c, false));
                    }
                }
                _ => results.push(t),
            }
        }
    }

    assert_eq!(results.len(), 1);
    results.pop().unwrap()
}
