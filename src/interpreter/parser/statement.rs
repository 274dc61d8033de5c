use crate::{
    ast::{BinaryOp, NodeId, NodeKind},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::core::{Cursor, ListEnd, ParseResult},
    },
};

/// Maps a compound-assignment token to the operator it applies; plain `=`
/// maps to `None`.
const fn assignment_op(token: &Token) -> Option<Option<BinaryOp>> {
    match token {
        Token::Assign => Some(None),
        Token::PlusAssign => Some(Some(BinaryOp::Add)),
        Token::MinusAssign => Some(Some(BinaryOp::Sub)),
        Token::StarAssign => Some(Some(BinaryOp::Mul)),
        Token::SlashAssign => Some(Some(BinaryOp::Div)),
        Token::BackslashAssign => Some(Some(BinaryOp::LeftDiv)),
        Token::CaretAssign | Token::StarStarAssign => Some(Some(BinaryOp::Pow)),
        Token::DotStarAssign => Some(Some(BinaryOp::ElemMul)),
        Token::DotSlashAssign => Some(Some(BinaryOp::ElemDiv)),
        Token::DotBackslashAssign => Some(Some(BinaryOp::ElemLeftDiv)),
        Token::DotCaretAssign | Token::DotStarStarAssign => Some(Some(BinaryOp::ElemPow)),
        Token::AmpAssign => Some(Some(BinaryOp::And)),
        Token::PipeAssign => Some(Some(BinaryOp::Or)),
        _ => None,
    }
}

const fn is_if_terminator(token: &Token) -> bool {
    matches!(token, Token::Elseif | Token::Else | Token::End | Token::Endif)
}

impl Cursor<'_> {
    /// Parses a statement sequence into a `List` node, recording the
    /// per-statement display suppression from `;` terminators.
    pub(crate) fn parse_statement_list(&mut self, end: ListEnd) -> ParseResult<NodeId> {
        let line = self.line();
        let mut items = Vec::new();
        let mut omit_output = Vec::new();

        loop {
            while matches!(self.peek(),
                           Some(Token::NewLine | Token::Semicolon | Token::Comma))
            {
                self.advance();
            }
            match self.peek() {
                None => {
                    if end == ListEnd::IfBlock {
                        return Err(ParseError::UnterminatedBlock { line });
                    }
                    break;
                },
                Some(token) if end == ListEnd::IfBlock && is_if_terminator(token) => break,
                Some(_) => {},
            }

            let statement = self.parse_statement()?;
            items.push(statement);

            match self.peek() {
                Some(Token::Semicolon) => {
                    self.advance();
                    omit_output.push(true);
                },
                Some(Token::Comma | Token::NewLine) => {
                    self.advance();
                    omit_output.push(false);
                },
                None => omit_output.push(false),
                Some(token) if end == ListEnd::IfBlock && is_if_terminator(token) => {
                    omit_output.push(false);
                },
                Some(_) => {
                    let line = self.line();
                    let found = self.advance().map(|(t, _)| t);
                    return Err(ParseError::UnexpectedToken { token: format!("{found:?} after a statement"),
                                                             line });
                },
            }
        }

        Ok(self.ast.push(NodeKind::List { omit_output }, items, line))
    }

    /// Parses one statement: an `if` block, a command word list, an
    /// assignment, or a bare expression.
    fn parse_statement(&mut self) -> ParseResult<NodeId> {
        if self.peek() == Some(&Token::If) {
            return self.parse_if();
        }

        // `~ = expr` discards the result
        if self.peek() == Some(&Token::Tilde) && self.peek_second() == Some(&Token::Assign) {
            let line = self.line();
            self.advance();
            self.advance();
            let wildcard = self.ast.push(NodeKind::Wildcard, Vec::new(), line);
            let value = self.parse_expression()?;
            return Ok(self.ast.push(NodeKind::Assign(None), vec![wildcard, value], line));
        }

        let candidate = match self.peek() {
            Some(Token::Ident(name)) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = candidate {
            let is_command = self.commands.contains(&name)
                             && matches!(self.peek_second(),
                                         Some(Token::Ident(_) | Token::Number(_)));
            if is_command {
                return self.parse_command();
            }
        }

        let target = self.parse_expression()?;
        let Some(op) = self.peek().and_then(assignment_op) else { return Ok(target) };
        let line = self.line();
        self.advance();
        let value = self.parse_expression()?;
        Ok(self.ast.push(NodeKind::Assign(op), vec![target, value], line))
    }

    /// Parses a command word list: a registered command name followed by
    /// whitespace-separated bare words up to the end of the statement.
    fn parse_command(&mut self) -> ParseResult<NodeId> {
        let Some((Token::Ident(name), line)) = self.advance() else {
            return Err(ParseError::UnexpectedEndOfInput { line: self.last_line });
        };

        let mut words = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Ident(word)) => {
                    words.push(word.clone());
                    self.advance();
                },
                Some(Token::Number(word)) => {
                    words.push(word.clone());
                    self.advance();
                },
                Some(Token::NewLine | Token::Semicolon | Token::Comma) | None => break,
                Some(_) => {
                    let line = self.line();
                    let found = self.advance().map(|(t, _)| t);
                    return Err(ParseError::UnexpectedToken { token: format!("{found:?} in a command argument list"),
                                                             line });
                },
            }
        }

        Ok(self.ast.push(NodeKind::Command { name, words }, Vec::new(), line))
    }

    /// Parses `if … elseif … else … end|endif`.
    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let line = self.line();
        self.expect(&Token::If, "'if'")?;

        let mut children = Vec::new();
        let mut conditions = 1usize;
        children.push(self.parse_expression()?);
        children.push(self.parse_statement_list(ListEnd::IfBlock)?);

        while self.peek() == Some(&Token::Elseif) {
            self.advance();
            conditions += 1;
            children.push(self.parse_expression()?);
            children.push(self.parse_statement_list(ListEnd::IfBlock)?);
        }

        let has_else = self.eat(&Token::Else);
        if has_else {
            children.push(self.parse_statement_list(ListEnd::IfBlock)?);
        }

        match self.advance() {
            Some((Token::End | Token::Endif, _)) => {},
            Some((found, line)) => {
                return Err(ParseError::UnexpectedToken { token: format!("{found:?} where 'endif' was expected"),
                                                         line });
            },
            None => return Err(ParseError::UnterminatedBlock { line }),
        }

        Ok(self.ast.push(NodeKind::If { conditions, has_else }, children, line))
    }
}
