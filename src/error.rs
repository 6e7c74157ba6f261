use thiserror::Error;

/// Errors raised while evaluating a query.
///
/// Logical failure is never an error: a goal whose arguments do not unify,
/// or whose constraint is violated, simply contributes no states to the
/// answer stream. The variants here are the conditions that abort a running
/// query and propagate out of `run` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A goal required a ground argument that was still unbound at
    /// application time (e.g. `membero` over an unbound collection).
    #[error("`{goal}` requires a ground {arg}")]
    NonGround {
        goal: &'static str,
        arg: &'static str,
    },

    /// A registered term class was rebuilt with the wrong number of
    /// children. Programmer error, surfaced immediately.
    #[error("cannot rebuild `{class}`: expected {expected} children, got {got}")]
    Arity {
        class: String,
        expected: usize,
        got: usize,
    },

    /// A term referenced a class this store knows nothing about, or the
    /// structural protocol was otherwise misused.
    #[error("term protocol violation: {detail}")]
    Protocol { detail: String },
}
