use std::io::Write;
use std::process::{Command, Output, Stdio};

fn brasa() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_brasa"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(args: &[&str]) -> Output {
    brasa().args(args).output().expect("failed to run brasa")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// --- Inline programs ---

#[test]
fn inline_arithmetic() {
    let out = run(&["1 + 2 * 3"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "7");
}

#[test]
fn inline_boolean_result() {
    let out = run(&["-e", "!(1 + 2 <= 3) && true"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "false");
}

#[test]
fn inline_last_statement_wins() {
    let out = run(&["1 + 1; 10 - 3"]);
    assert_eq!(stdout(&out).trim(), "7");
}

#[test]
fn inline_if_else() {
    let out = run(&["n int = 7; if n > 5 { n * 2 } else { n }"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "14");
}

#[test]
fn trailing_declaration_warns_but_succeeds() {
    let out = run(&["--no-color", "a int = 1"]);
    assert!(out.status.success());
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("warning[BRS-R008]"), "stderr: {}", stderr(&out));
}

// --- Files and stdin ---

#[test]
fn file_source() {
    let mut file = tempfile::Builder::new().suffix(".brs").tempfile().unwrap();
    writeln!(file, "a int = 2*5\nb int = 13-3\na == b").unwrap();
    let out = run(&[file.path().to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "true");
}

#[test]
fn missing_file_is_an_error() {
    let out = run(&["--no-color", "does/not/exist.brs"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("cannot read source"), "stderr: {}", stderr(&out));
}

#[test]
fn stdin_source() {
    let mut child = brasa().stdin(Stdio::piped()).stdout(Stdio::piped()).spawn().unwrap();
    child.stdin.take().unwrap().write_all(b"x int = 4\nx * x\n").unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "16");
}

// --- Diagnostics ---

#[test]
fn compile_errors_reported_as_batch() {
    let out = run(&["--no-color", "a == 1\nb int = 1\nb int = 2"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("error[BRS-C002]: undeclared identifier 'a'"), "stderr: {}", err);
    assert!(err.contains("error[BRS-C001]: variable 'b' is already declared"), "stderr: {}", err);
    assert!(err.contains("--> 3:1"), "stderr: {}", err);
    assert!(stdout(&out).is_empty());
}

#[test]
fn runtime_fault_exits_nonzero() {
    let out = run(&["--no-color", "10 / (5 - 5)"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("error[BRS-R003]: division by zero"), "stderr: {}", err);
    assert!(err.contains("OP_DIV"), "stderr: {}", err);
}

#[test]
fn json_diagnostics() {
    let out = run(&["--json", "1 + true"]);
    assert_eq!(out.status.code(), Some(1));
    let line = stderr(&out);
    let v: serde_json::Value = serde_json::from_str(line.trim()).expect("one JSON object");
    assert_eq!(v["code"], "BRS-R002");
    assert_eq!(v["severity"], "error");
}

#[test]
fn no_color_env_disables_ansi() {
    let out = brasa().env("NO_COLOR", "1").arg("x").output().unwrap();
    assert!(!stderr(&out).contains("\x1b["));
}

#[test]
fn explain_known_code() {
    let out = run(&["--explain", "BRS-C004"]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("## BRS-C004"));
}

#[test]
fn explain_unknown_code() {
    let out = run(&["--explain", "BRS-Z000"]);
    assert_eq!(out.status.code(), Some(1));
}

// --- Inspection ---

#[test]
fn disasm_then_result() {
    let out = run(&["--disasm", "if true { 1 } else { 2 }"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "0000 OP_TRUE");
    assert_eq!(lines[1], "0001 OP_JUMP_IF_FALSE 6 -> 0010");
    assert_eq!(lines.last(), Some(&"1"));
}

#[test]
fn ast_is_json() {
    let out = run(&["--ast", "a int = 1"]);
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_str(&stdout(&out)).expect("AST JSON");
    assert!(v["statements"].is_array());
    assert!(stdout(&out).contains("VarDecl"));
}

#[test]
fn verbose_logs_compile_summary() {
    let out = run(&["-v", "1 + 2"]);
    assert!(out.status.success());
    assert!(stderr(&out).contains("compiled 1 statement(s)"), "stderr: {}", stderr(&out));
}
