//! Parsing of `--filter` and `--order-by` arguments.
//!
//! Filters use the URI operator keywords, lowest precedence first:
//! `or`, `and`, `eq ne lt le gt ge`, `add sub`, `mul div mod`, then the
//! prefix operators `not` and `-`. Operands are property paths
//! (`Supplier/Address/City`), literals in URI form (`'Chai'`, `18.5M`,
//! `datetime'2020-01-01T00:00'`), function calls (`startswith(Name,'C')`)
//! and parenthesized expressions.

use entiodata_codec::{parse_literal, CodecError};
use entiodata_core::query::{BinaryOp, Function};
use entiodata_core::{Expr, OrderBy};
use thiserror::Error;

/// Errors raised while parsing command-line expressions.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// A token appeared where it is not allowed.
    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected {
        /// The offending token.
        found: String,
        /// Byte offset of the token.
        offset: usize,
    },

    /// The input ended early.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A call names no known function.
    #[error("unknown function {0}")]
    UnknownFunction(String),

    /// A literal is malformed.
    #[error(transparent)]
    Literal(#[from] CodecError),
}

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Open,
    Close,
    Comma,
}

fn tokenize(input: &str) -> ParseResult<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' => {
                chars.next();
                let token = match c {
                    '(' => Token::Open,
                    ')' => Token::Close,
                    _ => Token::Comma,
                };
                tokens.push((offset, token));
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | ',') {
                        break;
                    }
                    chars.next();
                    word.push(c);
                    if c == '\'' {
                        // Quoted section, `''` escapes a quote.
                        loop {
                            match chars.next() {
                                Some((_, '\'')) => {
                                    word.push('\'');
                                    if chars.peek().map(|&(_, c)| c) == Some('\'') {
                                        chars.next();
                                        word.push('\'');
                                    } else {
                                        break;
                                    }
                                }
                                Some((_, c)) => word.push(c),
                                None => {
                                    return Err(CodecError::Unterminated { literal: word }.into())
                                }
                            }
                        }
                    }
                }
                tokens.push((offset, Token::Word(word)));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek_word(&self) -> Option<&str> {
        match self.tokens.get(self.pos) {
            Some((_, Token::Word(w))) => Some(w.as_str()),
            _ => None,
        }
    }

    fn next(&mut self) -> ParseResult<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        let (offset, token) = self.next()?;
        if &token == expected {
            Ok(())
        } else {
            Err(unexpected(offset, &token))
        }
    }

    fn binary_level(
        &mut self,
        ops: &[BinaryOp],
        next: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut lhs = next(self)?;
        while let Some(op) = self
            .peek_word()
            .and_then(BinaryOp::from_keyword)
            .filter(|op| ops.contains(op))
        {
            self.pos += 1;
            lhs = lhs.binary(op, next(self)?);
        }
        Ok(lhs)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[BinaryOp::Or], Self::and)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[BinaryOp::And], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        use BinaryOp::{Eq, Ge, Gt, Le, Lt, Ne};
        self.binary_level(&[Eq, Ne, Lt, Le, Gt, Ge], Self::additive)
    }

    fn additive(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[BinaryOp::Add, BinaryOp::Sub], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Mod], Self::unary)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        match self.peek_word() {
            Some("not") => {
                self.pos += 1;
                Ok(Expr::not(self.unary()?))
            }
            Some("-") => {
                self.pos += 1;
                Ok(Expr::negate(self.unary()?))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let (offset, token) = self.next()?;
        let word = match token {
            Token::Open => {
                let inner = self.or()?;
                self.expect(&Token::Close)?;
                return Ok(inner);
            }
            Token::Word(word) => word,
            other => return Err(unexpected(offset, &other)),
        };

        if matches!(self.tokens.get(self.pos), Some((_, Token::Open))) {
            let function =
                Function::from_name(&word).ok_or_else(|| ParseError::UnknownFunction(word.clone()))?;
            self.pos += 1;
            return Ok(Expr::call(function, self.arguments()?));
        }
        if BinaryOp::from_keyword(&word).is_some() {
            return Err(ParseError::Unexpected { found: word, offset });
        }
        if is_literal(&word) {
            return Ok(Expr::Literal(parse_literal(&word)?));
        }
        Ok(Expr::property(&word))
    }

    fn arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if matches!(self.tokens.get(self.pos), Some((_, Token::Close))) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.or()?);
            match self.next()? {
                (_, Token::Comma) => continue,
                (_, Token::Close) => return Ok(args),
                (offset, other) => return Err(unexpected(offset, &other)),
            }
        }
    }
}

fn is_literal(word: &str) -> bool {
    matches!(word, "null" | "true" | "false")
        || word.contains('\'')
        || word.starts_with(|c: char| c.is_ascii_digit() || c == '-')
}

fn unexpected(offset: usize, token: &Token) -> ParseError {
    let found = match token {
        Token::Word(w) => w.clone(),
        Token::Open => "(".to_string(),
        Token::Close => ")".to_string(),
        Token::Comma => ",".to_string(),
    };
    ParseError::Unexpected { found, offset }
}

/// Parses a filter expression.
pub fn parse_filter(input: &str) -> ParseResult<Expr> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    let expr = parser.or()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some((offset, token)) => Err(unexpected(*offset, token)),
    }
}

/// Parses a comma-separated ordering list, e.g. `UnitPrice desc,ProductID`.
pub fn parse_order_by(input: &str) -> ParseResult<Vec<OrderBy>> {
    let mut keys = Vec::new();
    for (index, part) in input.split(',').enumerate() {
        let mut words = part.split_whitespace();
        let path = words.next().ok_or(ParseError::UnexpectedEnd)?;
        let key = match words.next() {
            None | Some("asc") => OrderBy::asc(Expr::property(path)),
            Some("desc") => OrderBy::desc(Expr::property(path)),
            Some(other) => {
                return Err(ParseError::Unexpected {
                    found: other.to_string(),
                    offset: index,
                })
            }
        };
        if let Some(extra) = words.next() {
            return Err(ParseError::Unexpected {
                found: extra.to_string(),
                offset: index,
            });
        }
        keys.push(key);
    }
    Ok(keys)
}
