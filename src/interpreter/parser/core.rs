use std::{collections::HashSet, iter::Peekable, slice::Iter};

use crate::{
    ast::Ast,
    error::ParseError,
    interpreter::lexer::{tokenize, Token},
};

/// Result type used by every parse function.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses source text into an arena AST.
///
/// The command-word name set published by the evaluator drives the
/// command-syntax rule: a registered name at statement position followed
/// by a bare word parses as a command word list.
///
/// # Errors
/// Any lexing or parsing failure.
///
/// # Example
/// ```
/// use std::collections::HashSet;
///
/// use octava::interpreter::parser::parse;
///
/// let ast = parse("a = 2 + 3*4; a", &HashSet::new()).unwrap();
/// assert!(!ast.children(ast.root).is_empty());
/// ```
pub fn parse(source: &str, commands: &HashSet<String>) -> ParseResult<Ast> {
    let tokens = tokenize(source)?;
    let mut cursor = Cursor::new(&tokens, commands);
    let root = cursor.parse_statement_list(ListEnd::Eof)?;
    let mut ast = cursor.ast;
    ast.root = root;
    Ok(ast)
}

/// Where a statement list is allowed to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListEnd {
    /// End of input.
    Eof,
    /// An `elseif`/`else`/`end`/`endif` keyword (left unconsumed).
    IfBlock,
}

/// A cloning cursor over the token stream, carrying the arena being built
/// and the registered command names.
pub(crate) struct Cursor<'a> {
    iter:                 Peekable<Iter<'a, (Token, usize)>>,
    pub(crate) ast:       Ast,
    pub(crate) commands:  &'a HashSet<String>,
    pub(crate) last_line: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tokens: &'a [(Token, usize)], commands: &'a HashSet<String>) -> Self {
        Self { iter: tokens.iter().peekable(),
               ast: Ast::new(),
               commands,
               last_line: 1 }
    }

    /// Peeks the next token.
    pub(crate) fn peek(&mut self) -> Option<&Token> {
        self.iter.peek().map(|(t, _)| t)
    }

    /// Peeks one token past the next.
    pub(crate) fn peek_second(&mut self) -> Option<&Token> {
        let mut ahead = self.iter.clone();
        ahead.next();
        ahead.next().map(|(t, _)| t)
    }

    /// The line of the next token, or of the last one consumed.
    pub(crate) fn line(&mut self) -> usize {
        self.iter.peek().map_or(self.last_line, |(_, line)| *line)
    }

    /// Consumes and returns the next token.
    pub(crate) fn advance(&mut self) -> Option<(Token, usize)> {
        let (token, line) = self.iter.next()?;
        self.last_line = *line;
        Some((token.clone(), *line))
    }

    /// Consumes the next token when it equals `token`.
    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the next token, failing unless it equals `token`.
    pub(crate) fn expect(&mut self, token: &Token, context: &str) -> ParseResult<()> {
        let line = self.line();
        match self.advance() {
            Some((found, _)) if found == *token => Ok(()),
            Some((found, line)) => {
                Err(ParseError::UnexpectedToken { token: format!("{found:?} where {context} was expected"),
                                                  line })
            },
            None => Err(ParseError::UnexpectedEndOfInput { line }),
        }
    }
}
