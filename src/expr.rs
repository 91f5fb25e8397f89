use crate::error::ResolveError;
use crate::resolver::{Resolution, Resolver, Visited, MAX_CHAIN_HOPS};
use crate::tree::{TokenPath, TokenValue};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches one `{...}` reference anywhere in a string.
    pub(crate) static ref REFERENCE: Regex = Regex::new(r"\{([^{}]+)\}").unwrap();
    /// Matches a string that is exactly one reference and nothing else.
    pub(crate) static ref FULL_REFERENCE: Regex = Regex::new(r"^\{([^{}]+)\}$").unwrap();
}

/// Evaluates a raw token string that embeds `{...}` references.
///
/// Every reference is resolved through `resolver`, sharing one `visited` set
/// across the whole expression, and substituted into the residual text. When
/// operator characters remain after substitution the residual is evaluated
/// as arithmetic; otherwise it is returned as a string. A string that is a
/// single bare reference passes the resolved value through unchanged,
/// preserving its type.
pub fn evaluate(
    raw: &str,
    resolver: &mut Resolver<'_>,
    visited: &mut Visited,
) -> Result<TokenValue, ResolveError> {
    if let Some(caps) = FULL_REFERENCE.captures(raw.trim()) {
        let path = TokenPath::from_reference(&caps[1], resolver.namespace());
        return resolve_reference(&path, resolver, visited);
    }

    let mut residual = String::new();
    let mut last_end = 0;
    for found in REFERENCE.find_iter(raw) {
        residual.push_str(&raw[last_end..found.start()]);
        let body = &raw[found.start() + 1..found.end() - 1];
        let path = TokenPath::from_reference(body, resolver.namespace());
        let value = resolve_reference(&path, resolver, visited)?;
        residual.push_str(&value.to_string());
        last_end = found.end();
    }
    residual.push_str(&raw[last_end..]);

    if residual.contains(&['+', '-', '*', '/'][..]) {
        eval_arithmetic(&residual, raw).map(TokenValue::Number)
    } else {
        Ok(TokenValue::String(residual))
    }
}

/// Resolves one reference to a final value, finishing through the evaluator
/// when the chain lands on an expression leaf. Each reference costs one hop
/// against the shared bound, so chains that thread through nested
/// expressions still terminate.
pub fn resolve_reference(
    path: &TokenPath,
    resolver: &mut Resolver<'_>,
    visited: &mut Visited,
) -> Result<TokenValue, ResolveError> {
    visited.hops += 1;
    if visited.hops > MAX_CHAIN_HOPS {
        return Err(ResolveError::ChainTooDeep { path: path.clone() });
    }
    match resolver.resolve(path, visited)? {
        Resolution::Value(value) => Ok(value),
        Resolution::Expression(nested) => evaluate(&nested, resolver, visited),
    }
}

/// One lexical token of the residual arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExprToken {
    /// A numeric literal; any alphabetic or `%` unit suffix (`4px`, `50%`)
    /// has already been stripped by the lexer.
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn eval_arithmetic(residual: &str, raw: &str) -> Result<f64, ResolveError> {
    let tokens = tokenize(residual, raw)?;
    let mut parser = ExprParser {
        tokens,
        position: 0,
        raw,
    };
    let value = parser.parse_expression()?;
    if parser.position != parser.tokens.len() {
        return Err(malformed(raw, "trailing input after expression"));
    }
    if !value.is_finite() {
        return Err(malformed(raw, "expression does not evaluate to a finite number"));
    }
    Ok(value)
}

fn tokenize(input: &str, raw: &str) -> Result<Vec<ExprToken>, ResolveError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(ExprToken::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(ExprToken::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(ExprToken::Star);
            }
            '/' => {
                chars.next();
                tokens.push(ExprToken::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(ExprToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(ExprToken::RParen);
            }
            '0'..='9' | '.' => {
                let start = pos;
                let mut end = pos;
                while let Some(&(p, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = p + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let number: f64 = literal
                    .parse()
                    .map_err(|_| malformed(raw, format!("invalid number '{literal}'")))?;
                // Swallow a unit suffix such as `px`, `rem` or `%`.
                while let Some(&(_, u)) = chars.peek() {
                    if u.is_ascii_alphabetic() || u == '%' {
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(ExprToken::Number(number));
            }
            other => {
                return Err(malformed(raw, format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

/// A recursive descent parser over the residual arithmetic, one method per
/// grammar rule.
struct ExprParser<'e> {
    tokens: Vec<ExprToken>,
    position: usize,
    raw: &'e str,
}

impl ExprParser<'_> {
    /// Expression ::= Term { ("+" | "-") Term }
    fn parse_expression(&mut self) -> Result<f64, ResolveError> {
        let mut value = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                ExprToken::Plus => {
                    self.position += 1;
                    value += self.parse_term()?;
                }
                ExprToken::Minus => {
                    self.position += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// Term ::= Factor { ("*" | "/") Factor }
    fn parse_term(&mut self) -> Result<f64, ResolveError> {
        let mut value = self.parse_factor()?;
        while let Some(op) = self.peek() {
            match op {
                ExprToken::Star => {
                    self.position += 1;
                    value *= self.parse_factor()?;
                }
                ExprToken::Slash => {
                    self.position += 1;
                    value /= self.parse_factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// Factor ::= Number | "(" Expression ")" | "-" Factor
    fn parse_factor(&mut self) -> Result<f64, ResolveError> {
        match self.next() {
            Some(ExprToken::Number(n)) => Ok(n),
            Some(ExprToken::Minus) => Ok(-self.parse_factor()?),
            Some(ExprToken::LParen) => {
                let value = self.parse_expression()?;
                match self.next() {
                    Some(ExprToken::RParen) => Ok(value),
                    _ => Err(malformed(self.raw, "expected ')'")),
                }
            }
            Some(other) => Err(malformed(self.raw, format!("unexpected token {other:?}"))),
            None => Err(malformed(self.raw, "unexpected end of expression")),
        }
    }

    fn peek(&self) -> Option<ExprToken> {
        self.tokens.get(self.position).copied()
    }

    fn next(&mut self) -> Option<ExprToken> {
        let token = self.peek();
        if token.is_some() {
            self.position += 1;
        }
        token
    }
}

fn malformed(raw: &str, reason: impl Into<String>) -> ResolveError {
    ResolveError::MalformedExpression {
        expr: raw.to_string(),
        reason: reason.into(),
    }
}
