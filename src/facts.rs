//! Fact relations: mutable, indexed sets of tuples usable as goal
//! constructors.
//!
//! A relation is populated before a query runs and is treated as immutable
//! while one is in flight. Querying emits a disjunction over the stored
//! facts in insertion order, unifying argument-wise; ground query
//! arguments cut the candidate pool down through a per-position index
//! (exact under hashconsing: a ground argument matches a ground fact slot
//! iff their ids are equal).

use crate::goal::{conde, eq, Goal};
use crate::stream::Stream;
use crate::term::{TermId, TermStore};
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::trace;

type Tuple = SmallVec<[TermId; 4]>;

#[derive(Default)]
struct FactSet {
    /// Facts in insertion order.
    facts: Vec<Tuple>,
    /// Dedup guard.
    seen: HashSet<Tuple>,
    /// (position, ground argument) -> indices into `facts`, ascending.
    index: HashMap<(usize, TermId), Vec<usize>>,
    /// position -> facts whose slot there is unground, ascending.
    /// These match any ground query argument and always stay candidates.
    open: HashMap<usize, Vec<usize>>,
}

/// A named fact base. The handle is cheap to clone; clones share the same
/// underlying facts.
#[derive(Clone)]
pub struct Relation {
    name: Arc<str>,
    inner: Arc<RwLock<FactSet>>,
}

impl Relation {
    /// Create an empty relation.
    pub fn new(name: &str) -> Relation {
        Relation {
            name: Arc::from(name),
            inner: Arc::new(RwLock::new(FactSet::default())),
        }
    }

    /// The relation's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored facts.
    pub fn len(&self) -> usize {
        self.inner.read().facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert one fact. Duplicates are ignored; insertion order is the
    /// enumeration order of queries.
    pub fn add_fact(&self, store: &TermStore, args: &[TermId]) {
        let tuple: Tuple = args.iter().copied().collect();
        let mut set = self.inner.write();
        if !set.seen.insert(tuple.clone()) {
            return;
        }
        let idx = set.facts.len();
        for (pos, &arg) in tuple.iter().enumerate() {
            if store.is_ground(arg) {
                set.index.entry((pos, arg)).or_default().push(idx);
            } else {
                set.open.entry(pos).or_default().push(idx);
            }
        }
        set.facts.push(tuple);
    }

    /// Build the goal that matches `args` against the stored facts.
    pub fn query(&self, args: &[TermId]) -> Goal {
        let rel = self.clone();
        let args: Tuple = args.iter().copied().collect();
        Goal::new(move |s| {
            let store = s.store().clone();
            let args_rf: Tuple = args.iter().map(|a| s.walk_all(*a)).collect();

            let set = rel.inner.read();

            // Each ground argument restricts the pool to the facts that
            // carry the same id there, plus the facts whose slot there is
            // still unground (those unify with anything).
            let mut buckets: Vec<Vec<usize>> = Vec::new();
            for (pos, &arg) in args_rf.iter().enumerate() {
                if store.is_ground(arg) {
                    let exact = set.index.get(&(pos, arg));
                    let open = set.open.get(&pos);
                    buckets.push(merge_sorted(exact, open));
                }
            }

            let candidates: Vec<usize> = if buckets.is_empty() {
                (0..set.facts.len()).collect()
            } else {
                buckets.sort_by_key(|b| b.len());
                let (smallest, rest) = buckets.split_first().unwrap();
                smallest
                    .iter()
                    .copied()
                    .filter(|i| rest.iter().all(|b| b.binary_search(i).is_ok()))
                    .collect()
            };

            #[cfg(feature = "tracing")]
            trace!(
                relation = %rel.name,
                total = set.facts.len(),
                candidates = candidates.len(),
                "relation_query"
            );

            let mut clauses: Vec<Vec<Goal>> = Vec::with_capacity(candidates.len());
            for i in candidates {
                let fact = &set.facts[i];
                if fact.len() != args_rf.len() {
                    continue;
                }
                clauses.push(
                    args_rf
                        .iter()
                        .zip(fact.iter())
                        .map(|(a, f)| eq(*a, *f))
                        .collect(),
                );
            }
            drop(set);

            if clauses.is_empty() {
                return Stream::empty();
            }
            conde(clauses).apply(s)
        })
    }
}

/// Merge two ascending index lists into one ascending list.
fn merge_sorted(a: Option<&Vec<usize>>, b: Option<&Vec<usize>>) -> Vec<usize> {
    match (a, b) {
        (None, None) => Vec::new(),
        (Some(x), None) | (None, Some(x)) => x.clone(),
        (Some(x), Some(y)) => {
            let mut out = Vec::with_capacity(x.len() + y.len());
            let (mut i, mut j) = (0, 0);
            while i < x.len() && j < y.len() {
                if x[i] < y[j] {
                    out.push(x[i]);
                    i += 1;
                } else {
                    out.push(y[j]);
                    j += 1;
                }
            }
            out.extend_from_slice(&x[i..]);
            out.extend_from_slice(&y[j..]);
            out
        }
    }
}

/// Declare a single fact.
pub fn fact(rel: &Relation, store: &TermStore, args: &[TermId]) {
    rel.add_fact(store, args);
}

/// Declare several facts.
pub fn facts(rel: &Relation, store: &TermStore, tuples: &[&[TermId]]) {
    for t in tuples {
        rel.add_fact(store, t);
    }
}
