#[derive(Debug)]
/// Represents all errors that can occur while lexing and parsing.
pub enum ParseError {
    /// The lexer met a character sequence that is not part of the language.
    UnrecognizedInput {
        /// The offending slice of source text.
        text: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A token appeared somewhere the grammar does not allow it.
    UnexpectedToken {
        /// Description of the offending token.
        token: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// The input ended in the middle of a construct.
    UnexpectedEndOfInput {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A numeric literal could not be converted to a decimal value.
    InvalidNumber {
        /// The literal text.
        text: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A string literal was opened but never closed.
    UnterminatedString {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An `if` block was opened but never closed with `end`/`endif`.
    UnterminatedBlock {
        /// The source line where the block started.
        line: usize,
    },
}

impl ParseError {
    /// Gets the source line this error was raised on.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        match self {
            Self::UnrecognizedInput { line, .. }
            | Self::UnexpectedToken { line, .. }
            | Self::UnexpectedEndOfInput { line }
            | Self::InvalidNumber { line, .. }
            | Self::UnterminatedString { line }
            | Self::UnterminatedBlock { line } => *line,
        }
    }

    /// Returns `true` when the failure happened in the lexer rather than in
    /// the parser proper. Hosts map this onto the `LexError` exit status.
    #[must_use]
    pub const fn is_lexical(&self) -> bool {
        matches!(self,
                 Self::UnrecognizedInput { .. } | Self::UnterminatedString { .. })
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedInput { text, line } => {
                write!(f, "Error on line {line}: Unrecognized input '{text}'.")
            },
            Self::UnexpectedToken { token, line } => {
                write!(f, "Error on line {line}: Unexpected token {token}.")
            },
            Self::UnexpectedEndOfInput { line } => {
                write!(f, "Error on line {line}: Unexpected end of input.")
            },
            Self::InvalidNumber { text, line } => {
                write!(f, "Error on line {line}: Invalid number literal '{text}'.")
            },
            Self::UnterminatedString { line } => {
                write!(f, "Error on line {line}: Unterminated string literal.")
            },
            Self::UnterminatedBlock { line } => {
                write!(f, "Error on line {line}: Block is never closed.")
            },
        }
    }
}

impl std::error::Error for ParseError {}
