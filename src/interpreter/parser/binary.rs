use crate::{
    ast::{BinaryOp, NodeId, NodeKind},
    interpreter::{
        lexer::Token,
        parser::core::{Cursor, ParseResult},
    },
};

/// Maps a token to its binary operator, for every precedence level.
#[must_use]
pub const fn token_to_binary_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        Token::DotStar => Some(BinaryOp::ElemMul),
        Token::Star => Some(BinaryOp::Mul),
        Token::DotSlash => Some(BinaryOp::ElemDiv),
        Token::Slash => Some(BinaryOp::Div),
        Token::DotBackslash => Some(BinaryOp::ElemLeftDiv),
        Token::Backslash => Some(BinaryOp::LeftDiv),
        Token::DotCaret | Token::DotStarStar => Some(BinaryOp::ElemPow),
        Token::Caret | Token::StarStar => Some(BinaryOp::Pow),
        Token::Less => Some(BinaryOp::Less),
        Token::LessEqual => Some(BinaryOp::LessEqual),
        Token::EqualEqual => Some(BinaryOp::Equal),
        Token::GreaterEqual => Some(BinaryOp::GreaterEqual),
        Token::Greater => Some(BinaryOp::Greater),
        Token::BangEqual | Token::TildeEqual => Some(BinaryOp::NotEqual),
        Token::Amp => Some(BinaryOp::And),
        Token::Pipe => Some(BinaryOp::Or),
        Token::AmpAmp => Some(BinaryOp::ShortAnd),
        Token::PipePipe => Some(BinaryOp::ShortOr),
        _ => None,
    }
}

impl Cursor<'_> {
    /// Parses a full expression (the `||` level downward).
    pub(crate) fn parse_expression(&mut self) -> ParseResult<NodeId> {
        self.parse_binary_level(0)
    }

    /// One left-associative precedence level; the levels from loosest to
    /// tightest are `||`, `&&`, `|`, `&`, comparison, then the range and
    /// arithmetic levels below.
    fn parse_binary_level(&mut self, level: usize) -> ParseResult<NodeId> {
        const LEVELS: &[&[BinaryOp]] = &[&[BinaryOp::ShortOr],
                                         &[BinaryOp::ShortAnd],
                                         &[BinaryOp::Or],
                                         &[BinaryOp::And],
                                         &[BinaryOp::Less,
                                           BinaryOp::LessEqual,
                                           BinaryOp::Equal,
                                           BinaryOp::GreaterEqual,
                                           BinaryOp::Greater,
                                           BinaryOp::NotEqual]];

        if level == LEVELS.len() {
            return self.parse_range();
        }

        let mut left = self.parse_binary_level(level + 1)?;
        loop {
            let Some(op) = self.peek().and_then(token_to_binary_op) else { break };
            if !LEVELS[level].contains(&op) {
                break;
            }
            let line = self.line();
            self.advance();
            let right = self.parse_binary_level(level + 1)?;
            left = self.ast.push(NodeKind::Binary(op), vec![left, right], line);
        }
        Ok(left)
    }

    /// Parses the range level: `start : stop` or `start : stride : stop`.
    fn parse_range(&mut self) -> ParseResult<NodeId> {
        let start = self.parse_additive()?;
        if self.peek() != Some(&Token::Colon) {
            return Ok(start);
        }
        let line = self.line();
        self.advance();
        let second = self.parse_additive()?;

        if self.peek() == Some(&Token::Colon) {
            self.advance();
            let stop = self.parse_additive()?;
            Ok(self.ast.push(NodeKind::Range { has_stride: true },
                             vec![start, stop, second],
                             line))
        } else {
            Ok(self.ast.push(NodeKind::Range { has_stride: false }, vec![start, second], line))
        }
    }

    /// Parses addition and subtraction, left-associative.
    fn parse_additive(&mut self) -> ParseResult<NodeId> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let Some(op) = self.peek().and_then(token_to_binary_op) else { break };
            if !matches!(op, BinaryOp::Add | BinaryOp::Sub) {
                break;
            }
            let line = self.line();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.ast.push(NodeKind::Binary(op), vec![left, right], line);
        }
        Ok(left)
    }

    /// Parses the multiplication level: `*`, `/`, `\` and their
    /// element-wise forms, left-associative.
    fn parse_multiplicative(&mut self) -> ParseResult<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(op) = self.peek().and_then(token_to_binary_op) else { break };
            if !matches!(op,
                         BinaryOp::Mul
                         | BinaryOp::Div
                         | BinaryOp::LeftDiv
                         | BinaryOp::ElemMul
                         | BinaryOp::ElemDiv
                         | BinaryOp::ElemLeftDiv)
            {
                break;
            }
            let line = self.line();
            self.advance();
            let right = self.parse_unary()?;
            left = self.ast.push(NodeKind::Binary(op), vec![left, right], line);
        }
        Ok(left)
    }
}
