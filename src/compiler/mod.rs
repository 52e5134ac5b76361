use std::collections::HashMap;

use crate::ast::*;
use crate::bytecode::{Chunk, ChunkError, MAX_INDEXED, OpCode};
use crate::lexer::Token;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("variable '{name}' is already declared")]
    Redeclared { name: String, span: Span },
    #[error("undeclared identifier '{name}'")]
    Undeclared { name: String, span: Span },
    #[error("unsupported unary operator '{op}'")]
    UnsupportedUnary { op: Token, span: Span },
    #[error("unsupported binary operator '{op}'")]
    UnsupportedBinary { op: Token, span: Span },
    #[error("unsupported construct: {construct}")]
    Unsupported { construct: &'static str, span: Span },
    #[error("too many constants: the pool holds at most {} distinct values", MAX_INDEXED)]
    ConstantPoolOverflow { span: Span },
    #[error("too many globals: cannot declare '{name}', the limit is {}", MAX_INDEXED)]
    TooManyGlobals { name: String, span: Span },
    #[error("branch too large: jump of {distance} bytes exceeds {}", u16::MAX)]
    JumpTooFar { distance: usize, span: Span },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::Redeclared { span, .. }
            | CompileError::Undeclared { span, .. }
            | CompileError::UnsupportedUnary { span, .. }
            | CompileError::UnsupportedBinary { span, .. }
            | CompileError::Unsupported { span, .. }
            | CompileError::ConstantPoolOverflow { span }
            | CompileError::TooManyGlobals { span, .. }
            | CompileError::JumpTooFar { span, .. } => *span,
        }
    }

    /// Stable diagnostic code, see `diagnostic::registry`.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Redeclared { .. } => "BRS-C001",
            CompileError::Undeclared { .. } => "BRS-C002",
            CompileError::UnsupportedUnary { .. } | CompileError::UnsupportedBinary { .. } => "BRS-C003",
            CompileError::Unsupported { .. } => "BRS-C004",
            CompileError::ConstantPoolOverflow { .. } => "BRS-C005",
            CompileError::TooManyGlobals { .. } => "BRS-C006",
            CompileError::JumpTooFar { .. } => "BRS-C007",
        }
    }
}

fn binary_opcode(tok: &Token) -> Option<OpCode> {
    Some(match tok {
        Token::Plus => OpCode::Add,
        Token::Minus => OpCode::Sub,
        Token::Star => OpCode::Mul,
        Token::Slash => OpCode::Div,
        Token::EqEq => OpCode::Equal,
        Token::NotEq => OpCode::NotEqual,
        Token::Greater => OpCode::Greater,
        Token::GreaterEq => OpCode::GreaterEqual,
        Token::Less => OpCode::Less,
        Token::LessEq => OpCode::LessEqual,
        // not short-circuiting: both operands are always evaluated
        Token::AndAnd => OpCode::And,
        Token::OrOr => OpCode::Or,
        _ => return None,
    })
}

// ── Code generator ───────────────────────────────────────────────────

struct Compiler {
    chunk: Chunk,
    /// Compile-time global table; the VM only ever sees slot numbers.
    globals: HashMap<String, u8>,
    errors: Vec<CompileError>,
    /// Span of the statement being compiled, for errors raised by literals.
    stmt_span: Span,
    pool_full: bool,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            chunk: Chunk::new(),
            globals: HashMap::new(),
            errors: Vec::new(),
            stmt_span: Span::UNKNOWN,
            pool_full: false,
        }
    }

    fn compile_program(mut self, program: &Program) -> Result<Chunk, Vec<CompileError>> {
        let leaves_value = self.compile_sequence(&program.statements);

        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        log::debug!(
            "compiled {} statement(s): {} code bytes, {} constants, {} globals, result on stack: {}",
            program.statements.len(),
            self.chunk.code.len(),
            self.chunk.constants.len(),
            self.globals.len(),
            leaves_value,
        );
        Ok(self.chunk)
    }

    /// Compile statements in order, popping every value but the last.
    /// Returns whether a value is left on the stack.
    fn compile_sequence(&mut self, stmts: &[Stmt]) -> bool {
        let mut leaves_value = false;
        for stmt in stmts {
            if leaves_value {
                self.chunk.write(OpCode::Pop);
            }
            leaves_value = self.compile_stmt(stmt);
        }
        leaves_value
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> bool {
        match stmt {
            Stmt::Expr(expr) => {
                self.stmt_span = expr.span();
                self.compile_expr(expr);
                true
            }

            Stmt::VarDecl { name, value, span, .. } => {
                self.stmt_span = *span;
                // initializer first, so `a int = a` is an undeclared use
                self.compile_expr(value);
                let slot = self.declare(name, *span);
                self.chunk.write(OpCode::DefineGlobal);
                self.chunk.write_byte(slot);
                false
            }

            Stmt::Block { statements, .. } => self.compile_sequence(statements),
        }
    }

    fn declare(&mut self, name: &str, span: Span) -> u8 {
        if let Some(&slot) = self.globals.get(name) {
            self.errors.push(CompileError::Redeclared { name: name.to_string(), span });
            return slot;
        }
        if self.globals.len() >= MAX_INDEXED {
            self.errors.push(CompileError::TooManyGlobals { name: name.to_string(), span });
            return 0;
        }
        let slot = self.globals.len() as u8;
        self.globals.insert(name.to_string(), slot);
        slot
    }

    fn emit_constant(&mut self, val: Value) {
        if let Err(e) = self.chunk.write_constant(val) {
            self.chunk_error(e, self.stmt_span);
        }
    }

    fn patch_jump(&mut self, handle: usize, span: Span) {
        if let Err(e) = self.chunk.patch_jump(handle) {
            self.chunk_error(e, span);
        }
    }

    fn chunk_error(&mut self, e: ChunkError, span: Span) {
        match e {
            // report a full pool once, not for every later literal
            ChunkError::ConstantPoolFull if !self.pool_full => {
                self.pool_full = true;
                self.errors.push(CompileError::ConstantPoolOverflow { span });
            }
            ChunkError::ConstantPoolFull => {}
            ChunkError::JumpTooFar { distance } => {
                self.errors.push(CompileError::JumpTooFar { distance, span });
            }
        }
    }

    fn compile_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Int(n) => self.emit_constant(Value::Int(*n)),

            Expr::Bool(true) => self.chunk.write(OpCode::True),
            Expr::Bool(false) => self.chunk.write(OpCode::False),

            Expr::Ident { name, span } => {
                let slot = match self.globals.get(name) {
                    Some(&slot) => slot,
                    None => {
                        self.errors.push(CompileError::Undeclared { name: name.clone(), span: *span });
                        0 // dummy slot; compile continues to surface more errors
                    }
                };
                self.chunk.write(OpCode::GetGlobal);
                self.chunk.write_byte(slot);
            }

            Expr::Unary { op, operand } => match op.node {
                Token::Bang => {
                    self.compile_expr(operand);
                    self.chunk.write(OpCode::Not);
                }
                // -x is 0 - x, so it faults on non-integers exactly like SUB
                Token::Minus => {
                    self.emit_constant(Value::Int(0));
                    self.compile_expr(operand);
                    self.chunk.write(OpCode::Sub);
                }
                ref other => {
                    self.errors.push(CompileError::UnsupportedUnary { op: other.clone(), span: op.span });
                }
            },

            Expr::Binary { left, op, right } => {
                self.compile_expr(left);
                self.compile_expr(right);
                match binary_opcode(op) {
                    Some(opcode) => self.chunk.write(opcode),
                    None => self.errors.push(CompileError::UnsupportedBinary { op: op.node.clone(), span: op.span }),
                }
            }

            Expr::If { condition, then_branch, else_branch, span } => {
                self.compile_if(condition, then_branch, else_branch.as_deref(), *span);
            }
        }
    }

    //     <condition>
    //     JUMP_IF_FALSE else
    //     POP
    //     <then>
    //     JUMP end
    // else:
    //     POP
    //     <else>
    // end:
    fn compile_if(&mut self, condition: &Expr, then_branch: &[Stmt], else_branch: Option<&[Stmt]>, span: Span) {
        let Some(else_branch) = else_branch else {
            self.errors.push(CompileError::Unsupported { construct: "'if' without 'else' has no value", span });
            return;
        };

        self.compile_expr(condition);
        let else_jump = self.chunk.emit_jump(OpCode::JumpIfFalse);
        self.chunk.write(OpCode::Pop);
        self.compile_branch(then_branch, span);
        let end_jump = self.chunk.emit_jump(OpCode::Jump);

        self.patch_jump(else_jump, span);
        self.chunk.write(OpCode::Pop);
        self.compile_branch(else_branch, span);
        self.patch_jump(end_jump, span);
    }

    fn compile_branch(&mut self, stmts: &[Stmt], span: Span) {
        if !self.compile_sequence(stmts) {
            self.errors.push(CompileError::Unsupported {
                construct: "'if' branch must end with an expression",
                span,
            });
        }
    }
}

/// Lower a program into a chunk. Either every statement compiles or the
/// full list of errors is returned; a partial chunk is never handed out.
pub fn compile(program: &Program) -> Result<Chunk, Vec<CompileError>> {
    Compiler::new().compile_program(program)
}

// ── Tests ────────────────────────────────────────────────────────────
