//! # octava
//!
//! octava is an interpreter for a matrix-oriented numeric language with
//! MATLAB/Octave surface syntax. It parses source text into an arena AST,
//! evaluates it against a mutable symbol environment, and renders results
//! as plain text or presentation MathML. Values are arbitrary-precision
//! complex scalars, character strings, N-dimensional arrays, or
//! named-field structures.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
)]
#![allow(clippy::missing_errors_doc)]

use crate::interpreter::evaluator::core::Evaluator;

/// Defines the structure of parsed code.
///
/// This module declares the arena tree the evaluator consumes: node
/// discriminators for every construct of the language, stable integer node
/// ids, and the parent back-links the evaluator fills in before walking.
///
/// # Responsibilities
/// - Defines the closed discriminator set for all language constructs.
/// - Holds nodes in an arena with stable indices, keeping the
///   parent/position back-links cycle-free.
/// - Attaches source lines to nodes for error reporting.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// This module defines all errors that can be raised while lexing,
/// parsing, or evaluating code, with source lines and the four-way
/// classification used for exit-status reporting.
///
/// # Responsibilities
/// - Defines error enums for the front end and the evaluator.
/// - Attaches line numbers and detailed messages for context.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together the lexer, parser, evaluator, value
/// representations and unparsers to provide a complete runtime for source
/// code evaluation.
///
/// # Responsibilities
/// - Coordinates all core components: lexer, parser, evaluator, values.
/// - Provides the entry points for parsing and evaluating user code.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;

/// Evaluates all statements in the provided source string and optionally
/// prints the non-suppressed results.
///
/// A fresh evaluator is created for the call; use [`Evaluator`] directly
/// to keep an environment alive across inputs.
///
/// # Errors
/// Returns an error if lexing, parsing or evaluation fails.
///
/// # Examples
/// ```
/// use octava::get_result;
///
/// // Simple statements: the trailing `a` displays the assigned value.
/// let source = "a = 2 + 3*4; a";
/// assert!(get_result(source, false).is_ok());
///
/// // An unbound name is an error.
/// assert!(get_result("y = x + 1", false).is_err());
/// ```
pub fn get_result(source: &str, auto_print: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut evaluator = Evaluator::new();
    let lines = evaluator.run_display(source)?;

    if auto_print {
        for line in lines {
            println!("{line}");
        }
    }

    Ok(())
}
