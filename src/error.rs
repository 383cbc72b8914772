// Error taxonomy for the Naftah evaluator (spec §7).
//
// Operator-level errors are not caught anywhere in this crate: they
// unwind the call stack until the embedding host's outermost call into
// the interpreter returns them. There is no user-visible try/catch in
// the core.

use crate::value::Kind;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Produced by the external parser; propagated as-is.
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("undefined: {0}")]
    Undefined(String),

    #[error("expected {expected} argument(s), got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },

    #[error("no method named `{0}` matches the given arguments")]
    NoSuchMethod(String),

    #[error("unsupported operation `{op}` for {left:?} and {right:?}")]
    UnsupportedOperation {
        op: &'static str,
        left: Kind,
        right: Option<Kind>,
    },

    #[error("arithmetic error: {0}")]
    ArithmeticError(&'static str),

    #[error("cannot assign to constant `{0}`")]
    ConstantWrite(String),

    #[error("duplicate declaration of `{0}` in the same scope")]
    DuplicateDeclaration(String),

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("internal bug: {0}")]
    InternalBug(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
