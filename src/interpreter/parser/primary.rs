use crate::{
    ast::{BinaryOp, Delimiter, NodeId, NodeKind, PostfixOp, PrefixOp},
    error::ParseError,
    interpreter::{
        lexer::{QuoteToken, Token},
        parser::core::{Cursor, ParseResult},
        value::{real::Real, scalar::Scalar},
    },
};

impl Cursor<'_> {
    /// Parses the unary-prefix level: `+`, `-`, `!`/`~`, `++`, `--`.
    ///
    /// Exponentiation binds tighter than unary minus, so `-2^2` is
    /// `-(2^2)`.
    pub(crate) fn parse_unary(&mut self) -> ParseResult<NodeId> {
        let op = match self.peek() {
            Some(Token::Plus) => Some(PrefixOp::Plus),
            Some(Token::Minus) => Some(PrefixOp::Minus),
            Some(Token::Bang | Token::Tilde) => Some(PrefixOp::Not),
            Some(Token::PlusPlus) => Some(PrefixOp::Increment),
            Some(Token::MinusMinus) => Some(PrefixOp::Decrement),
            _ => None,
        };
        if let Some(op) = op {
            let line = self.line();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.ast.push(NodeKind::Prefix(op), vec![operand], line));
        }
        self.parse_power()
    }

    /// Parses exponentiation, right-associative through the unary level:
    /// `2 ^ -3` and `a .^ b .^ c` both parse naturally.
    fn parse_power(&mut self) -> ParseResult<NodeId> {
        let base = self.parse_postfix()?;
        let op = match self.peek() {
            Some(Token::Caret | Token::StarStar) => Some(BinaryOp::Pow),
            Some(Token::DotCaret | Token::DotStarStar) => Some(BinaryOp::ElemPow),
            _ => None,
        };
        if let Some(op) = op {
            let line = self.line();
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(self.ast.push(NodeKind::Binary(op), vec![base, exponent], line));
        }
        Ok(base)
    }

    /// Parses a primary followed by its postfix chain: index/call argument
    /// lists, field accesses, transposes, and `++`/`--`.
    fn parse_postfix(&mut self) -> ParseResult<NodeId> {
        let mut node = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    let line = self.line();
                    self.advance();
                    let mut children = vec![node];
                    children.extend(self.parse_index_args(&Token::RParen)?);
                    node = self.ast.push(NodeKind::Index { delimiter: Delimiter::Paren },
                                         children,
                                         line);
                },
                Some(Token::LBrace) => {
                    let line = self.line();
                    self.advance();
                    let mut children = vec![node];
                    children.extend(self.parse_index_args(&Token::RBrace)?);
                    node = self.ast.push(NodeKind::Index { delimiter: Delimiter::Brace },
                                         children,
                                         line);
                },
                Some(Token::Dot) => {
                    let line = self.line();
                    let mut children = vec![node];
                    while self.eat(&Token::Dot) {
                        children.push(self.parse_field_designator()?);
                    }
                    node = self.ast.push(NodeKind::Field, children, line);
                },
                Some(Token::Quote(QuoteToken::Transpose)) => {
                    let line = self.line();
                    self.advance();
                    node = self.ast.push(NodeKind::Postfix(PostfixOp::CTranspose),
                                         vec![node],
                                         line);
                },
                Some(Token::DotQuote) => {
                    let line = self.line();
                    self.advance();
                    node =
                        self.ast.push(NodeKind::Postfix(PostfixOp::Transpose), vec![node], line);
                },
                Some(Token::PlusPlus) => {
                    let line = self.line();
                    self.advance();
                    node =
                        self.ast.push(NodeKind::Postfix(PostfixOp::Increment), vec![node], line);
                },
                Some(Token::MinusMinus) => {
                    let line = self.line();
                    self.advance();
                    node =
                        self.ast.push(NodeKind::Postfix(PostfixOp::Decrement), vec![node], line);
                },
                _ => break,
            }
        }
        Ok(node)
    }

    /// One field designator: a literal name, or `(expr)` for dynamic
    /// fields.
    fn parse_field_designator(&mut self) -> ParseResult<NodeId> {
        let line = self.line();
        match self.advance() {
            Some((Token::Ident(name), line)) => {
                Ok(self.ast.push(NodeKind::Ident(name), Vec::new(), line))
            },
            Some((Token::LParen, line)) => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "')' closing a dynamic field")?;
                Ok(self.ast.push(NodeKind::Paren, vec![inner], line))
            },
            Some((found, line)) => {
                Err(ParseError::UnexpectedToken { token: format!("{found:?} where a field name was expected"),
                                                  line })
            },
            None => Err(ParseError::UnexpectedEndOfInput { line }),
        }
    }

    /// The argument list of an index/call, up to `closer`. A bare `:`
    /// argument becomes the colon sentinel.
    fn parse_index_args(&mut self, closer: &Token) -> ParseResult<Vec<NodeId>> {
        let mut args = Vec::new();
        if self.eat(closer) {
            return Ok(args);
        }
        loop {
            let colon_arg = self.peek() == Some(&Token::Colon)
                            && (self.peek_second() == Some(&Token::Comma)
                                || self.peek_second() == Some(closer));
            if colon_arg {
                let line = self.line();
                self.advance();
                args.push(self.ast.push(NodeKind::Colon, Vec::new(), line));
            } else {
                args.push(self.parse_expression()?);
            }

            let line = self.line();
            match self.advance() {
                Some((Token::Comma, _)) => {},
                Some((token, _)) if token == *closer => break,
                Some((found, line)) => {
                    return Err(ParseError::UnexpectedToken { token: format!("{found:?} inside an argument list"),
                                                             line });
                },
                None => return Err(ParseError::UnexpectedEndOfInput { line }),
            }
        }
        Ok(args)
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let fallback = self.line();
        match self.advance() {
            Some((Token::Number(text), line)) => {
                let re = Real::from_literal(&text).ok_or(ParseError::InvalidNumber { text,
                                                                                     line })?;
                Ok(self.ast.push(NodeKind::Number(Scalar::real(re)), Vec::new(), line))
            },
            Some((Token::ImagNumber(text), line)) => {
                let im = Real::from_literal(&text).ok_or(ParseError::InvalidNumber { text,
                                                                                     line })?;
                Ok(self.ast
                       .push(NodeKind::Number(Scalar::new(Real::zero(), im)), Vec::new(), line))
            },
            Some((Token::Str(text), line)) => Ok(self.ast.push(NodeKind::Str { text,
                                                                               double_quoted:
                                                                                   true, },
                                                               Vec::new(),
                                                               line)),
            Some((Token::Quote(QuoteToken::Str(text)), line)) => {
                Ok(self.ast.push(NodeKind::Str { text,
                                                 double_quoted: false, },
                                 Vec::new(),
                                 line))
            },
            Some((Token::Ident(name), line)) => {
                Ok(self.ast.push(NodeKind::Ident(name), Vec::new(), line))
            },
            Some((Token::End, line)) => Ok(self.ast.push(NodeKind::End, Vec::new(), line)),
            Some((Token::LParen, line)) => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "')' closing a parenthesized expression")?;
                Ok(self.ast.push(NodeKind::Paren, vec![inner], line))
            },
            Some((Token::LBracket, line)) => self.parse_matrix(false, line),
            Some((Token::LBrace, line)) => self.parse_matrix(true, line),
            Some((found, line)) => {
                Err(ParseError::UnexpectedToken { token: format!("{found:?} where an expression was expected"),
                                                  line })
            },
            None => Err(ParseError::UnexpectedEndOfInput { line: fallback }),
        }
    }

    /// Parses a matrix (`[…]`) or cell (`{…}`) literal body; the opener is
    /// already consumed. Elements are comma-separated, rows split on `;`
    /// or line breaks.
    fn parse_matrix(&mut self, cell: bool, line: usize) -> ParseResult<NodeId> {
        let closer = if cell { Token::RBrace } else { Token::RBracket };
        let mut rows: Vec<usize> = Vec::new();
        let mut children: Vec<NodeId> = Vec::new();
        let mut current = 0usize;

        while self.peek() == Some(&Token::NewLine) {
            self.advance();
        }
        if self.eat(&closer) {
            return Ok(self.ast.push(NodeKind::Matrix { rows, cell }, children, line));
        }

        loop {
            let wildcard = self.peek() == Some(&Token::Tilde)
                           && matches!(self.peek_second(),
                                       Some(Token::Comma
                                            | Token::Semicolon
                                            | Token::NewLine
                                            | Token::RBracket
                                            | Token::RBrace));
            if wildcard {
                let wline = self.line();
                self.advance();
                children.push(self.ast.push(NodeKind::Wildcard, Vec::new(), wline));
            } else {
                children.push(self.parse_expression()?);
            }
            current += 1;

            let sep_line = self.line();
            match self.advance() {
                Some((Token::Comma, _)) => {},
                Some((Token::Semicolon | Token::NewLine, _)) => {
                    while self.peek() == Some(&Token::NewLine) {
                        self.advance();
                    }
                    rows.push(current);
                    current = 0;
                    if self.eat(&closer) {
                        break;
                    }
                },
                Some((token, _)) if token == closer => {
                    rows.push(current);
                    current = 0;
                    break;
                },
                Some((found, line)) => {
                    return Err(ParseError::UnexpectedToken { token: format!("{found:?} inside a matrix literal"),
                                                             line });
                },
                None => return Err(ParseError::UnexpectedEndOfInput { line: sep_line }),
            }
        }
        if current > 0 {
            rows.push(current);
        }

        Ok(self.ast.push(NodeKind::Matrix { rows, cell }, children, line))
    }
}
