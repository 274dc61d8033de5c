/// Front-end errors.
///
/// Defines all error types that can occur while lexing and parsing source
/// code into the evaluator's AST shape. Parse errors include unexpected
/// tokens, unterminated strings and blocks, and invalid numeric literals.
pub mod parse_error;

/// Evaluation errors.
///
/// Contains all error types that can be raised while walking the AST:
/// unbound names, arity mismatches, invalid indexing, bad assignment targets,
/// return-list selection failures, and the context-only-token misuses.
/// Every error carries the source line of the node that raised it and
/// classifies itself into one of the four kinds of `ErrorKind`.
pub mod eval_error;

pub use eval_error::{ErrorKind, EvalError};
pub use parse_error::ParseError;
