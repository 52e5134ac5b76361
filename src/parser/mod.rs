use crate::ast::*;
use crate::lexer::Token;

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("Parse error at {}..{}: {message}", span.start, span.end)]
pub struct ParseError {
    pub code: &'static str,
    pub span: Span,
    pub message: String,
}

type Result<T> = std::result::Result<T, ParseError>;

/// Binding power of an infix operator; higher binds tighter.
fn binding_power(tok: &Token) -> Option<u8> {
    match tok {
        Token::OrOr => Some(1),
        Token::AndAnd => Some(2),
        Token::EqEq | Token::NotEq => Some(3),
        Token::Greater | Token::GreaterEq | Token::Less | Token::LessEq => Some(4),
        Token::Plus | Token::Minus => Some(5),
        Token::Star | Token::Slash => Some(6),
        _ => None,
    }
}

impl Parser {
    pub fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.token_at(self.pos)
    }

    fn token_at(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, s)) => *s,
            // at EOF, point just past the last token
            None => self
                .tokens
                .last()
                .map(|(_, s)| Span { start: s.end, end: s.end })
                .unwrap_or(Span::UNKNOWN),
        }
    }

    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| *s)
            .unwrap_or(Span::UNKNOWN)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn expect(&mut self, expected: &Token) -> Result<Span> {
        match self.peek() {
            Some(tok) if tok == expected => {
                let span = self.peek_span();
                self.advance();
                Ok(span)
            }
            Some(tok) => Err(self.error("BRS-P002", format!("expected '{}', got '{}'", expected, tok))),
            None => Err(self.error("BRS-P003", format!("expected '{}', got EOF", expected))),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            Some(tok) => Err(self.error("BRS-P002", format!("expected identifier, got '{}'", tok))),
            None => Err(self.error("BRS-P003", "expected identifier, got EOF".into())),
        }
    }

    fn error(&self, code: &'static str, message: String) -> ParseError {
        ParseError { code, span: self.peek_span(), message }
    }

    fn skip_separators(&mut self) {
        while self.peek().is_some_and(Token::is_separator) {
            self.pos += 1;
        }
    }

    /// A statement must be followed by a separator, the end of input, or
    /// (inside a block) the closing brace.
    fn expect_statement_end(&mut self, in_block: bool) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(tok) if tok.is_separator() => Ok(()),
            Some(Token::RBrace) if in_block => Ok(()),
            Some(tok) => Err(self.error("BRS-P004", format!("expected end of statement, got '{}'", tok))),
        }
    }

    /// Skip to the next statement separator outside any braces.
    fn sync_to_separator(&mut self) {
        let mut depth: usize = 0;
        while let Some(tok) = self.peek() {
            match tok {
                Token::LBrace => depth += 1,
                Token::RBrace => depth = depth.saturating_sub(1),
                t if t.is_separator() && depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    // ---- Statements ----

    pub fn parse_program(&mut self) -> (Program, Vec<ParseError>) {
        let mut statements = Vec::new();
        let mut errors: Vec<ParseError> = Vec::new();
        const MAX_ERRORS: usize = 20;

        self.skip_separators();
        while !self.at_end() {
            if errors.len() >= MAX_ERRORS {
                break;
            }
            let parsed = self.parse_stmt().and_then(|stmt| {
                self.expect_statement_end(false)?;
                Ok(stmt)
            });
            match parsed {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    errors.push(e);
                    self.sync_to_separator();
                }
            }
            self.skip_separators();
        }

        (Program { statements, source: None }, errors)
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let decl_ahead = matches!(
            (self.peek(), self.token_at(self.pos + 1), self.token_at(self.pos + 2)),
            (Some(Token::Ident(_)), Some(Token::Ident(_)), Some(Token::Assign))
        );
        if decl_ahead {
            return self.parse_var_decl();
        }
        if self.peek() == Some(&Token::LBrace) {
            let (statements, span) = self.parse_block()?;
            return Ok(Stmt::Block { statements, span });
        }
        Ok(Stmt::Expr(self.parse_expr()?))
    }

    /// `name type = expr`
    fn parse_var_decl(&mut self) -> Result<Stmt> {
        let start = self.peek_span();
        let name = self.expect_ident()?;
        let ty = self.expect_ident()?;
        self.expect(&Token::Assign)?;
        let value = self.parse_expr()?;
        Ok(Stmt::VarDecl { name, ty, value, span: start.merge(self.prev_span()) })
    }

    /// `{ stmt (sep stmt)* }`
    fn parse_block(&mut self) -> Result<(Vec<Stmt>, Span)> {
        let start = self.expect(&Token::LBrace)?;
        let mut statements = Vec::new();
        self.skip_separators();
        loop {
            match self.peek() {
                Some(Token::RBrace) => break,
                None => {
                    return Err(ParseError {
                        code: "BRS-P005",
                        span: start,
                        message: "unclosed block: expected '}'".into(),
                    });
                }
                _ => {}
            }
            statements.push(self.parse_stmt()?);
            self.expect_statement_end(true)?;
            self.skip_separators();
        }
        let end = self.expect(&Token::RBrace)?;
        Ok((statements, start.merge(end)))
    }

    // ---- Expressions ----

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_binary(1)
    }

    /// Precedence climbing over left-associative infix operators.
    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while let Some(bp) = self.peek().and_then(binding_power) {
            if bp < min_bp {
                break;
            }
            let span = self.peek_span();
            let Some(op) = self.advance() else { break };
            let right = self.parse_binary(bp + 1)?;
            left = Expr::Binary {
                left: Box::new(left),
                op: Spanned::new(op, span),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Bang) | Some(Token::Minus) => {
                let span = self.peek_span();
                let Some(op) = self.advance() else {
                    return Err(self.error("BRS-P001", "expected expression, got EOF".into()));
                };
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op: Spanned::new(op, span), operand: Box::new(operand) })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.peek_span();
        match self.peek().cloned() {
            Some(Token::Int(n)) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            Some(Token::True) => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Some(Token::False) => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(Expr::Ident { name, span })
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::If) => self.parse_if(),
            Some(tok) => Err(self.error("BRS-P001", format!("expected expression, got '{}'", tok))),
            None => Err(self.error("BRS-P001", "expected expression, got EOF".into())),
        }
    }

    /// `if cond { ... } [else { ... } | else if ...]`
    fn parse_if(&mut self) -> Result<Expr> {
        let start = self.expect(&Token::If)?;
        let condition = self.parse_expr()?;
        let (then_branch, _) = self.parse_block()?;

        // `else` may sit on the line after the closing brace
        let mut look = self.pos;
        while self.token_at(look).is_some_and(Token::is_separator) {
            look += 1;
        }
        let else_branch = if self.token_at(look) == Some(&Token::Else) {
            self.pos = look + 1;
            if self.peek() == Some(&Token::If) {
                Some(vec![Stmt::Expr(self.parse_if()?)])
            } else {
                Some(self.parse_block()?.0)
            }
        } else {
            None
        };

        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch,
            else_branch,
            span: start.merge(self.prev_span()),
        })
    }
}

/// Parse from token+span pairs.
/// Returns `(program, errors)`; the program only holds statements that
/// parsed cleanly, so check `errors.is_empty()` before compiling it.
pub fn parse(tokens: Vec<(Token, Span)>) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}
