//! Driving queries: seed the empty state, conjoin the goals, pull the
//! stream, reify and deduplicate.

use crate::error::Error;
use crate::goal::{lall, Goal};
use crate::reify::reify;
use crate::state::State;
use crate::term::{TermId, TermStore};
use hashbrown::HashSet;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::debug;

/// Run a query for up to `n` distinct solutions (`n = 0` takes all, which
/// diverges on queries with infinitely many answers).
///
/// `q` is the term to reify against each answering state; pass a list term
/// of query variables to read off several at once. Solutions are
/// deduplicated by their reified value. An error raised by a goal aborts
/// the query and propagates out unchanged.
pub fn run(
    n: usize,
    q: TermId,
    goals: Vec<Goal>,
    store: &Arc<TermStore>,
) -> Result<Vec<TermId>, Error> {
    let state = State::new(Arc::clone(store));
    let stream = lall(goals).apply(state);

    let mut seen: HashSet<TermId> = HashSet::new();
    let mut out: Vec<TermId> = Vec::new();

    for item in stream {
        let answer = item?;
        let reified = reify(q, &answer);
        if seen.insert(reified) {
            #[cfg(feature = "tracing")]
            debug!(solution = ?reified, count = out.len() + 1, "run_solution");
            out.push(reified);
            if n != 0 && out.len() == n {
                break;
            }
        }
    }

    Ok(out)
}

/// Run a query to exhaustion.
pub fn run_all(
    q: TermId,
    goals: Vec<Goal>,
    store: &Arc<TermStore>,
) -> Result<Vec<TermId>, Error> {
    run(0, q, goals, store)
}
