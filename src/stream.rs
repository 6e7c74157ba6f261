//! Lazy answer streams with fair interleaving.
//!
//! A stream is a possibly infinite sequence of states. Evaluation is
//! pull-based: nothing advances until the consumer asks for the next
//! state. The fairness of the whole engine rests on one rule here: when
//! the first argument of `mplus` is a suspension, it is swapped with the
//! second argument before being forced, so no disjunct can starve the
//! others.

use crate::error::Error;
use crate::goal::Goal;
use crate::state::State;

/// A deferred stream computation.
pub type Thunk = Box<dyn FnOnce() -> Stream>;

/// Lazy, possibly infinite sequence of states.
pub enum Stream {
    /// No states.
    Empty,
    /// Exactly one state.
    Unit(State),
    /// One state now, more behind a thunk.
    Choice(State, Thunk),
    /// Nothing yet; force the thunk to continue.
    Suspend(Thunk),
    /// An aborting error; terminates the enclosing query.
    Fault(Error),
}

impl Stream {
    /// The empty stream.
    pub fn empty() -> Self {
        Stream::Empty
    }

    /// A one-state stream.
    pub fn unit(s: State) -> Self {
        Stream::Unit(s)
    }

    /// A suspended (lazily evaluated) stream.
    pub fn suspend(f: impl FnOnce() -> Stream + 'static) -> Self {
        Stream::Suspend(Box::new(f))
    }

    /// An aborting stream.
    pub fn fault(e: Error) -> Self {
        Stream::Fault(e)
    }

    /// Fair merge of two streams.
    ///
    /// A suspension on the left is swapped to the right before forcing;
    /// this is what keeps a disjunct with infinitely many answers from
    /// starving a finite one.
    pub fn mplus(self, other: Stream) -> Stream {
        match self {
            Stream::Empty => other,
            Stream::Fault(e) => Stream::Fault(e),
            Stream::Unit(s) => Stream::Choice(s, Box::new(move || other)),
            Stream::Choice(s, rest) => Stream::Choice(s, Box::new(move || rest().mplus(other))),
            Stream::Suspend(thunk) => Stream::suspend(move || other.mplus(thunk())),
        }
    }

    /// Fair flat-map: apply a goal to every state, interleaving the
    /// resulting streams rather than exhausting them in order.
    pub fn bind(self, goal: Goal) -> Stream {
        match self {
            Stream::Empty => Stream::Empty,
            Stream::Fault(e) => Stream::Fault(e),
            Stream::Unit(s) => goal.apply(s),
            Stream::Choice(s, rest) => {
                let tail_goal = goal.clone();
                goal.apply(s)
                    .mplus(Stream::suspend(move || rest().bind(tail_goal)))
            }
            Stream::Suspend(thunk) => Stream::suspend(move || thunk().bind(goal)),
        }
    }

    /// Whether the stream is already known to be empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Stream::Empty)
    }
}

impl IntoIterator for Stream {
    type Item = Result<State, Error>;
    type IntoIter = StreamIter;

    fn into_iter(self) -> StreamIter {
        StreamIter(self)
    }
}

/// Pull-based iterator over a stream. Forces suspensions in a loop; a
/// stream with no answers and an infinite search space will not return
/// from `next`, which is the contract of a fair-but-complete search.
pub struct StreamIter(Stream);

impl Iterator for StreamIter {
    type Item = Result<State, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.0, Stream::Empty) {
                Stream::Empty => return None,
                Stream::Unit(s) => return Some(Ok(s)),
                Stream::Choice(s, rest) => {
                    self.0 = Stream::Suspend(rest);
                    return Some(Ok(s));
                }
                Stream::Suspend(thunk) => {
                    self.0 = thunk();
                }
                Stream::Fault(e) => return Some(Err(e)),
            }
        }
    }
}
