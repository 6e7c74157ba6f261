use crate::term::{Term, TermId, TermStore};
use hashbrown::HashMap;
use smallvec::SmallVec;

/// A substitution maps variable indices to terms.
///
/// Extension is monotone: a bound variable is never rebound, so the number
/// of bindings tells whether a unification extended the substitution.
/// States clone their substitution on extension; bindings are `TermId`s so
/// clones stay shallow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subst {
    bindings: HashMap<u32, TermId>,
}

impl Subst {
    /// Create an empty substitution.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind a variable to a term.
    pub fn bind(&mut self, var: u32, term: TermId) {
        self.bindings.insert(var, term);
    }

    /// Get the binding for a variable, if any.
    pub fn get(&self, var: u32) -> Option<TermId> {
        self.bindings.get(&var).copied()
    }

    /// Check if a variable is bound.
    pub fn is_bound(&self, var: u32) -> bool {
        self.bindings.contains_key(&var)
    }

    /// Check if the substitution is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Iterator over (var_index, term_id) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, TermId)> + '_ {
        self.bindings.iter().map(|(k, v)| (*k, *v))
    }

    /// Follow a chain of variable bindings one level at a time until an
    /// unbound variable or a non-variable term is reached. A cyclic chain
    /// (user error) stops at the first revisited variable rather than
    /// looping.
    pub fn walk(&self, term: TermId, store: &TermStore) -> TermId {
        let mut current = term;
        let mut visited: SmallVec<[u32; 8]> = SmallVec::new();
        loop {
            match store.is_var(current) {
                Some(idx) => {
                    if visited.contains(&idx) {
                        return current;
                    }
                    visited.push(idx);
                    match self.get(idx) {
                        Some(bound) => current = bound,
                        None => return current,
                    }
                }
                None => return current,
            }
        }
    }

    /// Deep resolution: walk the term and rebuild compounds so no bound
    /// variable remains anywhere. Uses an explicit worklist to avoid
    /// recursion on deep terms.
    pub fn walk_all(&self, term: TermId, store: &TermStore) -> TermId {
        // (term, children_done) pairs; results collects rebuilt subterms.
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
                let resolved = self.walk(t, store);
                match store.resolve(resolved) {
                    Some(Term::Cons(h, r)) => {
                        work.push((resolved, true));
                        work.push((r, false));
                        work.push((h, false));
                    }
                    Some(Term::Ext(_, children)) if !children.is_empty() => {
                        work.push((resolved, true));
                        for c in children.iter().rev() {
                            work.push((*c, false));
                        }
                    }
                    _ => results.push(resolved),
                }
            }
        }

        assert_eq!(results.len(), 1);
        results.pop().unwrap()
    }

    /// Whether the term is ground under this substitution.
    pub fn is_ground(&self, term: TermId, store: &TermStore) -> bool {
        store.is_ground(self.walk_all(term, store))
    }
}
