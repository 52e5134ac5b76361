use serde::{Deserialize, Serialize};

use crate::lexer::Token;

pub mod source_map;
pub use source_map::SourceMap;

// ---- Span infrastructure ----

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(r: std::ops::Range<usize>) -> Self {
        Span { start: r.start, end: r.end }
    }
}

/// Wraps a node with its source span. Transparent to serde (serializes as inner node only)
/// and to equality, so parsed trees compare equal to hand-built ones.
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Spanned { node, span }
    }

    pub fn unknown(node: T) -> Self {
        Spanned { node, span: Span::UNKNOWN }
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.node
    }
}

impl<T: Serialize> Serialize for Spanned<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Spanned<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(|node| Spanned { node, span: Span::UNKNOWN })
    }
}

// ---- Core AST types ----

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression as statement; its value stays on the stack
    Expr(Expr),

    /// `name type = value`
    VarDecl {
        name: String,
        /// Declared type name, accepted but not checked
        ty: String,
        value: Expr,
        #[serde(skip)]
        span: Span,
    },

    /// `{ stmt; stmt }`
    Block {
        statements: Vec<Stmt>,
        #[serde(skip)]
        span: Span,
    },
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Int(i64),

    Bool(bool),

    /// Global variable reference
    Ident {
        name: String,
        #[serde(skip)]
        span: Span,
    },

    /// `!expr` (logical) or `-expr` (numeric)
    Unary {
        op: Spanned<Token>,
        operand: Box<Expr>,
    },

    /// Infix binary op: `a + b`, `a && b`
    Binary {
        left: Box<Expr>,
        op: Spanned<Token>,
        right: Box<Expr>,
    },

    /// `if cond { ... } else { ... }`
    If {
        condition: Box<Expr>,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        #[serde(skip)]
        span: Span,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident { name: name.into(), span: Span::UNKNOWN }
    }

    pub fn unary(op: Token, operand: Expr) -> Self {
        Expr::Unary { op: Spanned::unknown(op), operand: Box::new(operand) }
    }

    pub fn binary(left: Expr, op: Token, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op: Spanned::unknown(op),
            right: Box::new(right),
        }
    }

    /// Best-effort source span; literals carry none.
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(_) | Expr::Bool(_) => Span::UNKNOWN,
            Expr::Ident { span, .. } | Expr::If { span, .. } => *span,
            Expr::Unary { op, .. } => op.span,
            Expr::Binary { op, .. } => op.span,
        }
    }
}

/// A complete program is an ordered list of statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    #[serde(skip)]
    pub source: Option<String>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements, source: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_unknown_is_zero() {
        assert_eq!(Span::UNKNOWN, Span { start: 0, end: 0 });
    }

    #[test]
    fn span_merge_takes_extremes() {
        let a = Span { start: 5, end: 10 };
        let b = Span { start: 2, end: 15 };
        assert_eq!(a.merge(b), Span { start: 2, end: 15 });
    }

    #[test]
    fn span_from_range() {
        assert_eq!(Span::from(3..7), Span { start: 3, end: 7 });
    }

    #[test]
    fn spanned_deref() {
        let s = Spanned::new(Token::Plus, Span { start: 0, end: 1 });
        assert_eq!(*s, Token::Plus);
    }

    #[test]
    fn spanned_serialize_transparent() {
        let s = Spanned::new(42i32, Span { start: 5, end: 10 });
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn spanned_deserialize_transparent() {
        let s: Spanned<i32> = serde_json::from_str("42").unwrap();
        assert_eq!(s.node, 42);
        assert_eq!(s.span, Span::UNKNOWN);
    }

    #[test]
    fn decl_span_not_serialized() {
        let stmt = Stmt::VarDecl {
            name: "a".to_string(),
            ty: "int".to_string(),
            value: Expr::Int(1),
            span: Span { start: 0, end: 9 },
        };
        let json = serde_json::to_string(&stmt).unwrap();
        assert!(!json.contains("span"));
        assert!(json.contains("VarDecl"));
    }

    #[test]
    fn program_json_round_trip() {
        let prog = Program {
            statements: vec![Stmt::Expr(Expr::binary(Expr::Int(1), Token::Plus, Expr::ident("x")))],
            source: Some("1 + x".to_string()),
        };
        let json = serde_json::to_string_pretty(&prog).unwrap();
        assert!(!json.contains("1 + x"));
        let back: Program = serde_json::from_str(&json).unwrap();
        // spans and source are dropped, structure survives
        assert_eq!(back.statements, prog.statements);
        assert!(back.source.is_none());
    }

    #[test]
    fn spanned_equality_ignores_span() {
        let a = Spanned::new(Token::Plus, Span { start: 4, end: 5 });
        assert_eq!(a, Spanned::unknown(Token::Plus));
        assert_ne!(a, Spanned::unknown(Token::Minus));
    }

    #[test]
    fn binary_span_is_operator_span() {
        let e = Expr::Binary {
            left: Box::new(Expr::Int(1)),
            op: Spanned::new(Token::Star, Span { start: 2, end: 3 }),
            right: Box::new(Expr::Int(2)),
        };
        assert_eq!(e.span(), Span { start: 2, end: 3 });
        assert_eq!(Expr::Int(4).span(), Span::UNKNOWN);
    }
}
