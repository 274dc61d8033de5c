/// Walks the AST and manages the environment.
///
/// This module owns the evaluator: the name and function tables, the
/// command words, assignment and indexing semantics, and the two
/// unparsers (text and MathML).
///
/// # Responsibilities
/// - Dispatches every AST discriminator to its evaluation rule.
/// - Owns the environment tables and the local-scope frame stack.
/// - Renders values and trees back to text and to presentation MathML.
pub mod evaluator;
/// Produces tokens from source text.
///
/// The reference front end's lexer: a `logos` token set over the
/// MATLAB-like surface syntax, with line tracking and the context rule
/// that decides whether `'` transposes or opens a string.
pub mod lexer;
/// Builds the arena AST from the token stream.
///
/// The reference front end's parser: recursive descent with one function
/// per precedence level, statement and block parsing, matrix literals,
/// and the command-word syntax driven by the evaluator's published name
/// set.
pub mod parser;
/// Defines the runtime value universe.
///
/// Scalars (arbitrary-precision complex), character strings,
/// N-dimensional arrays, structures, and the multi-valued return adapter,
/// together with the numeric kernel they are built on.
pub mod value;
