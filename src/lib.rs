pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod vm;

pub use bytecode::Chunk;
pub use diagnostic::Diagnostic;
pub use value::Value;

use ast::{Program, Span};

/// Lex and parse `source`. Parse errors are reported together; a lex
/// error stops before parsing.
pub fn parse_source(source: &str) -> Result<Program, Vec<Diagnostic>> {
    let tokens = lexer::lex(source)
        .map_err(|e| vec![Diagnostic::from(&e).with_source(source)])?
        .into_iter()
        .map(|(t, r)| (t, Span::from(r)))
        .collect();

    let (mut program, errors) = parser::parse(tokens);
    if !errors.is_empty() {
        return Err(errors.iter().map(|e| Diagnostic::from(e).with_source(source)).collect());
    }
    program.source = Some(source.to_string());
    Ok(program)
}

/// Front end plus code generation.
pub fn compile_source(source: &str) -> Result<Chunk, Vec<Diagnostic>> {
    let program = parse_source(source)?;
    compiler::compile(&program)
        .map_err(|errors| errors.iter().map(|e| Diagnostic::from(e).with_source(source)).collect())
}

/// Compile and run `source`, returning the value left by its last
/// statement. `Ok(None)` means the program left nothing on the stack.
pub fn run_source(source: &str) -> Result<Option<Value>, Vec<Diagnostic>> {
    let chunk = compile_source(source)?;
    vm::run(&chunk).map_err(|e| vec![Diagnostic::from(&e)])
}
