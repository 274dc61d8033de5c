/// The evaluator state, construction, and the node dispatcher.
pub mod core;
/// Assignment decomposition and the per-target store rules.
pub mod assign;
/// Binary operations on values, with broadcasting and the matrix forms.
pub mod binary;
/// The base function table and its built-in entries.
pub mod builtin;
/// The command-word table.
pub mod command;
/// Index/call resolution, field access, and the `end`/`:` sentinels.
pub mod index;
/// The presentation-MathML unparser.
pub mod mathml;
/// Unary prefix and postfix operations.
pub mod unary;
/// The canonical text unparser.
pub mod unparse;
