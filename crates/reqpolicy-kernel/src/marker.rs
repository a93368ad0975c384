//! Environment markers and constraint selection.
//!
//! The default matching rule is literal: a constraint applies to a
//! declaration when its marker text is identical, otherwise the first
//! constraint with no marker at all applies. `os_name == "nt"` is *not*
//! considered compatible with `os_name != "posix"` under that rule.
//!
//! [`Marker`] is an optional, opt-in evaluator over a parsed expression
//! tree. It is only consulted by [`find_constraint`] in
//! [`MarkerMatch::Evaluate`] mode.

use crate::declaration::Declaration;
use crate::error::MarkerError;
use crate::specifier::Specifier;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a declaration's marker is matched against constraint markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMatch {
    /// Textual identity, then the unmarked fallback.
    #[default]
    Literal,
    /// Literal first; additionally accept a constraint whose `var == value`
    /// clauses, taken as an environment, satisfy the declaration's marker.
    Evaluate,
}

impl std::str::FromStr for MarkerMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "evaluate" => Ok(Self::Evaluate),
            _ => Err(format!("unknown marker matching mode: {s}")),
        }
    }
}

/// Select the constraint that applies to `decl`.
///
/// Returns `None` when no candidate carries the same marker text and none
/// is unmarked; callers report that as a validation failure.
pub fn find_constraint<'a, I>(
    decl: &Declaration,
    candidates: I,
    mode: MarkerMatch,
) -> Option<&'a Declaration>
where
    I: IntoIterator<Item = &'a Declaration>,
    I::IntoIter: Clone,
{
    let candidates = candidates.into_iter();
    if !decl.marker.is_empty() {
        let wanted = match mode {
            MarkerMatch::Literal => None,
            MarkerMatch::Evaluate => Marker::parse(&decl.marker).ok(),
        };
        for candidate in candidates.clone() {
            if candidate.marker == decl.marker {
                return Some(candidate);
            }
            let (Some(wanted), false) = (&wanted, candidate.marker.is_empty()) else {
                continue;
            };
            let Ok(theirs) = Marker::parse(&candidate.marker) else {
                continue;
            };
            if wanted
                .evaluate(&theirs.equality_bindings())
                .unwrap_or(false)
            {
                return Some(candidate);
            }
        }
    }
    candidates
        .into_iter()
        .find(|candidate| candidate.marker.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Variable(String),
    Literal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Compatible,
    Arbitrary,
    In,
    NotIn,
}

impl MarkerOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Compatible => "~=",
            Self::Arbitrary => "===",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Compare {
        lhs: Operand,
        op: MarkerOp,
        rhs: Operand,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A parsed environment marker such as `python_version<'3.8' and os_name=="nt"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    source: String,
    expr: Expr,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Ident(String),
    Str(String),
    Op(MarkerOp),
    And,
    Or,
    Not,
    In,
}

fn tokenize(source: &str) -> Result<Vec<Token>, MarkerError> {
    let syntax = |reason: String| MarkerError::Syntax {
        marker: source.to_string(),
        reason,
    };
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        let c = chars[idx];
        if c.is_whitespace() {
            idx += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Token::LParen);
                idx += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                idx += 1;
            }
            '\'' | '"' => {
                let close = chars[idx + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| syntax("unterminated string".to_string()))?;
                let value: String = chars[idx + 1..idx + 1 + close].iter().collect();
                tokens.push(Token::Str(value));
                idx += close + 2;
            }
            '=' | '!' | '<' | '>' | '~' => {
                let rest: String = chars[idx..chars.len().min(idx + 3)].iter().collect();
                let (op, width) = if rest.starts_with("===") {
                    (MarkerOp::Arbitrary, 3)
                } else if rest.starts_with("==") {
                    (MarkerOp::Eq, 2)
                } else if rest.starts_with("!=") {
                    (MarkerOp::NotEq, 2)
                } else if rest.starts_with("<=") {
                    (MarkerOp::LtEq, 2)
                } else if rest.starts_with(">=") {
                    (MarkerOp::GtEq, 2)
                } else if rest.starts_with("~=") {
                    (MarkerOp::Compatible, 2)
                } else if c == '<' {
                    (MarkerOp::Lt, 1)
                } else if c == '>' {
                    (MarkerOp::Gt, 1)
                } else {
                    return Err(syntax(format!("unexpected operator at {rest:?}")));
                };
                tokens.push(Token::Op(op));
                idx += width;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = idx;
                while idx < chars.len() && is_word_char(chars[idx]) {
                    idx += 1;
                }
                let word: String = chars[start..idx].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(syntax(format!("unexpected character {other:?}"))),
        }
    }
    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> MarkerError {
        MarkerError::Syntax {
            marker: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<Expr, MarkerError> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, MarkerError> {
        let mut lhs = self.atom()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.atom()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn atom(&mut self) -> Result<Expr, MarkerError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.or_expr()?;
            return match self.next() {
                Some(Token::RParen) => Ok(inner),
                _ => Err(self.error("expected ')'")),
            };
        }
        let lhs = self.operand()?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            Some(Token::In) => MarkerOp::In,
            Some(Token::Not) => match self.next() {
                Some(Token::In) => MarkerOp::NotIn,
                _ => return Err(self.error("expected 'in' after 'not'")),
            },
            _ => return Err(self.error("expected a comparison operator")),
        };
        let rhs = self.operand()?;
        Ok(Expr::Compare { lhs, op, rhs })
    }

    fn operand(&mut self) -> Result<Operand, MarkerError> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(Operand::Variable(name)),
            Some(Token::Str(value)) => Ok(Operand::Literal(value)),
            _ => Err(self.error("expected a variable or quoted string")),
        }
    }
}

const VERSION_VARIABLES: [&str; 3] = [
    "python_version",
    "python_full_version",
    "implementation_version",
];

impl Marker {
    pub fn parse(source: &str) -> Result<Self, MarkerError> {
        let mut parser = Parser {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        };
        if parser.tokens.is_empty() {
            return Err(parser.error("empty marker"));
        }
        let expr = parser.or_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("trailing tokens"));
        }
        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// Evaluate against an environment of marker variable bindings.
    pub fn evaluate(&self, env: &BTreeMap<String, String>) -> Result<bool, MarkerError> {
        eval_expr(&self.expr, env)
    }

    /// The `variable == "value"` comparisons, as an environment map.
    pub fn equality_bindings(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        collect_bindings(&self.expr, &mut out);
        out
    }
}

fn collect_bindings(expr: &Expr, out: &mut BTreeMap<String, String>) {
    match expr {
        Expr::Compare {
            lhs,
            op: MarkerOp::Eq,
            rhs,
        } => match (lhs, rhs) {
            (Operand::Variable(name), Operand::Literal(value))
            | (Operand::Literal(value), Operand::Variable(name)) => {
                out.insert(name.clone(), value.clone());
            }
            _ => {}
        },
        Expr::Compare { .. } => {}
        Expr::And(a, b) | Expr::Or(a, b) => {
            collect_bindings(a, out);
            collect_bindings(b, out);
        }
    }
}

fn resolve<'a>(
    operand: &'a Operand,
    env: &'a BTreeMap<String, String>,
) -> Result<&'a str, MarkerError> {
    match operand {
        Operand::Literal(value) => Ok(value),
        Operand::Variable(name) => env
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| MarkerError::UndefinedName(name.clone())),
    }
}

fn is_version_operand(operand: &Operand) -> bool {
    matches!(operand, Operand::Variable(name) if VERSION_VARIABLES.contains(&name.as_str()))
}

fn eval_expr(expr: &Expr, env: &BTreeMap<String, String>) -> Result<bool, MarkerError> {
    match expr {
        Expr::And(a, b) => Ok(eval_expr(a, env)? && eval_expr(b, env)?),
        Expr::Or(a, b) => Ok(eval_expr(a, env)? || eval_expr(b, env)?),
        Expr::Compare { lhs, op, rhs } => {
            let left = resolve(lhs, env)?;
            let right = resolve(rhs, env)?;
            match op {
                MarkerOp::In => return Ok(right.contains(left)),
                MarkerOp::NotIn => return Ok(!right.contains(left)),
                _ => {}
            }
            if (is_version_operand(lhs) || is_version_operand(rhs))
                && let (Ok(clause), Ok(version)) = (
                    format!("{}{right}", op.as_str()).parse::<Specifier>(),
                    left.parse::<Version>(),
                )
            {
                return Ok(clause.contains(left, Some(&version)));
            }
            Ok(match op {
                MarkerOp::Eq | MarkerOp::Arbitrary => left == right,
                MarkerOp::NotEq => left != right,
                MarkerOp::Lt => left < right,
                MarkerOp::LtEq => left <= right,
                MarkerOp::Gt => left > right,
                MarkerOp::GtEq => left >= right,
                MarkerOp::Compatible => false,
                MarkerOp::In | MarkerOp::NotIn => false,
            })
        }
    }
}
