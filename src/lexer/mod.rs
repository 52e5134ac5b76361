use logos::Logos;
use serde::{Deserialize, Serialize};

#[derive(Logos, Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
pub enum Token {
    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEq,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Statement separators
    #[token(";")]
    Semi,
    #[token("\n")]
    Newline,
}

impl Token {
    /// True for tokens that end a statement.
    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Newline | Token::Semi)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Token::If => "if",
            Token::Else => "else",
            Token::True => "true",
            Token::False => "false",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Bang => "!",
            Token::Assign => "=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Greater => ">",
            Token::GreaterEq => ">=",
            Token::Less => "<",
            Token::LessEq => "<=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Int(n) => return write!(f, "{}", n),
            Token::Ident(name) => return write!(f, "{}", name),
            Token::Semi => ";",
            Token::Newline => "newline",
        };
        f.write_str(s)
    }
}

/// Lex source code into a stream of tokens with positions.
/// Stops at the first character that cannot start a token.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                let snippet = source[span.clone()].to_string();
                return Err(LexError {
                    position: span.start,
                    suggestion: suggest_fix(&snippet),
                    snippet,
                });
            }
        }
    }

    Ok(tokens)
}

fn suggest_fix(bad_token: &str) -> String {
    match bad_token {
        "&" => "Logical and is written '&&'".to_string(),
        "|" => "Logical or is written '||'".to_string(),
        s if s.bytes().all(|b| b.is_ascii_digit()) => {
            format!("Integer literal '{}' does not fit in 64 bits (max {})", s, i64::MAX)
        }
        s => format!("Unexpected character(s): '{}'", s),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Lex error at position {position}: '{snippet}'. {suggestion}")]
pub struct LexError {
    pub position: usize,
    pub snippet: String,
    pub suggestion: String,
}

impl LexError {
    pub fn code(&self) -> &'static str {
        if !self.snippet.is_empty() && self.snippet.bytes().all(|b| b.is_ascii_digit()) {
            "BRS-L002"
        } else {
            "BRS-L001"
        }
    }
}
