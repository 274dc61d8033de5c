use logos::Logos;

use crate::error::ParseError;

/// What a `'` turned out to be once the lexer applied its context rule.
#[derive(Debug, PartialEq, Clone)]
pub enum QuoteToken {
    /// The conjugate-transpose operator.
    Transpose,
    /// A single-quoted string literal (content with `''` escapes resolved).
    Str(String),
}

/// Represents a lexical token of the surface language.
///
/// The single-quote character is the classic MATLAB ambiguity: after a
/// value it is the conjugate-transpose operator, anywhere else it opens a
/// string. The `Quote` callback decides using the `last_was_value` flag
/// that [`tokenize`] maintains in the lexer extras.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(extras = LexerExtras)]
pub enum Token {
    /// Imaginary numeric literals such as `2i`, `3.5j` or `.5e-3i`.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?[ij]", strip_imag_suffix)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[ij]", strip_imag_suffix)]
    ImagNumber(String),
    /// Numeric literals such as `42`, `3.14`, `.5` or `2.1e-10`.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),
    /// A double-quoted string literal.
    #[regex(r#""([^"\\\n]|\\.)*""#, unescape_double)]
    Str(String),
    /// A single quote: transpose operator or single-quoted string.
    #[token("'", lex_single_quote)]
    Quote(QuoteToken),
    /// `if`
    #[token("if")]
    If,
    /// `elseif`
    #[token("elseif")]
    Elseif,
    /// `else`
    #[token("else")]
    Else,
    /// `end` — closes a block, or is the range sentinel inside indexing.
    #[token("end")]
    End,
    /// `endif`
    #[token("endif")]
    Endif,
    /// Identifier tokens; variable, function and command names.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    /// `% comments` and `# comments` up to end of line.
    #[regex(r"[%#][^\n]*", logos::skip)]
    Comment,
    /// `.**=`
    #[token(".**=")]
    DotStarStarAssign,
    /// `.**`
    #[token(".**")]
    DotStarStar,
    /// `.*=`
    #[token(".*=")]
    DotStarAssign,
    /// `.*`
    #[token(".*")]
    DotStar,
    /// `./=`
    #[token("./=")]
    DotSlashAssign,
    /// `./`
    #[token("./")]
    DotSlash,
    /// `.\=`
    #[token(".\\=")]
    DotBackslashAssign,
    /// `.\`
    #[token(".\\")]
    DotBackslash,
    /// `.^=`
    #[token(".^=")]
    DotCaretAssign,
    /// `.^`
    #[token(".^")]
    DotCaret,
    /// `.'`
    #[token(".'")]
    DotQuote,
    /// `.`
    #[token(".")]
    Dot,
    /// `**=`
    #[token("**=")]
    StarStarAssign,
    /// `**`
    #[token("**")]
    StarStar,
    /// `++`
    #[token("++")]
    PlusPlus,
    /// `--`
    #[token("--")]
    MinusMinus,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    StarAssign,
    /// `/=`
    #[token("/=")]
    SlashAssign,
    /// `\=`
    #[token("\\=")]
    BackslashAssign,
    /// `^=`
    #[token("^=")]
    CaretAssign,
    /// `&=`
    #[token("&=")]
    AmpAssign,
    /// `|=`
    #[token("|=")]
    PipeAssign,
    /// `&&`
    #[token("&&")]
    AmpAmp,
    /// `||`
    #[token("||")]
    PipePipe,
    /// `&`
    #[token("&")]
    Amp,
    /// `|`
    #[token("|")]
    Pipe,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `\`
    #[token("\\")]
    Backslash,
    /// `^`
    #[token("^")]
    Caret,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `>`
    #[token(">")]
    Greater,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `~=`
    #[token("~=")]
    TildeEqual,
    /// `!`
    #[token("!")]
    Bang,
    /// `~`
    #[token("~")]
    Tilde,
    /// `=`
    #[token("=")]
    Assign,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `:`
    #[token(":")]
    Colon,
    /// Line breaks, which both separate statements and rows.
    #[token("\n", |lex| {
        lex.extras.line += 1;
    })]
    NewLine,
    /// Spaces, tabs, carriage returns and feeds.
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Ignored,
}

/// State carried by the lexer during tokenization.
#[derive(Default)]
pub struct LexerExtras {
    /// The current line number, starting at 1.
    pub line:           usize,
    /// Whether the previous significant token can end a value, which makes
    /// a following `'` the transpose operator.
    pub last_was_value: bool,
}

fn strip_imag_suffix(lex: &logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    slice[..slice.len() - 1].to_string()
}

fn unescape_double(lex: &logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some(other) => text.push(other),
                None => {},
            }
        } else {
            text.push(c);
        }
    }
    text
}

fn lex_single_quote(lex: &mut logos::Lexer<Token>) -> Option<QuoteToken> {
    if lex.extras.last_was_value {
        return Some(QuoteToken::Transpose);
    }

    let remainder = lex.remainder();
    let mut text = String::new();
    let mut chars = remainder.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\'' => {
                if let Some(&(_, '\'')) = chars.peek() {
                    text.push('\'');
                    chars.next();
                } else {
                    lex.bump(i + 1);
                    return Some(QuoteToken::Str(text));
                }
            },
            '\n' => return None,
            other => text.push(other),
        }
    }
    None
}

/// Whether a token can end a value, for the single-quote context rule.
const fn ends_value(token: &Token) -> bool {
    matches!(token,
             Token::Number(_)
             | Token::ImagNumber(_)
             | Token::Str(_)
             | Token::Ident(_)
             | Token::End
             | Token::RParen
             | Token::RBracket
             | Token::RBrace
             | Token::Quote(_))
}

/// Runs the lexer over a source string, producing tokens with their lines.
///
/// # Errors
/// `ParseError::UnrecognizedInput` on an unlexable slice and
/// `ParseError::UnterminatedString` on an unclosed single-quoted literal.
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut lexer = Token::lexer_with_extras(source,
                                             LexerExtras { line:           1,
                                                           last_was_value: false, });
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => {
                lexer.extras.last_was_value = ends_value(&token);
                let line = match &token {
                    Token::NewLine => lexer.extras.line - 1,
                    _ => lexer.extras.line,
                };
                tokens.push((token, line));
            },
            Err(()) => {
                let slice = lexer.slice();
                if slice.starts_with('\'') {
                    return Err(ParseError::UnterminatedString { line: lexer.extras.line });
                }
                return Err(ParseError::UnrecognizedInput { text: slice.to_string(),
                                                           line: lexer.extras.line, });
            },
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn quote_is_transpose_after_a_value() {
        assert_eq!(kinds("A'"),
                   vec![Token::Ident("A".to_string()), Token::Quote(QuoteToken::Transpose)]);
        assert_eq!(kinds("'ab''c'"),
                   vec![Token::Quote(QuoteToken::Str("ab'c".to_string()))]);
    }

    #[test]
    fn dotted_operators_do_not_eat_number_dots() {
        assert_eq!(kinds("2.*x"),
                   vec![Token::Number("2".to_string()),
                        Token::DotStar,
                        Token::Ident("x".to_string())]);
        assert_eq!(kinds("2.5"), vec![Token::Number("2.5".to_string())]);
    }

    #[test]
    fn imaginary_suffixes() {
        assert_eq!(kinds("3i"), vec![Token::ImagNumber("3".to_string())]);
        assert_eq!(kinds("2.5j"), vec![Token::ImagNumber("2.5".to_string())]);
    }
}
