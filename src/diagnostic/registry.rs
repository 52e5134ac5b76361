/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one line, for listings
    pub long: &'static str,  // full explanation for --explain
}

/// All stable error codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "BRS-L001",
        short: "unexpected character",
        long: r#"## BRS-L001: unexpected character

A character was found that cannot start any token.

**Example:**

    a int = 1 $ 2

Logical operators are doubled: write `&&` and `||`, not `&` and `|`.
"#,
    },
    ErrorEntry {
        code: "BRS-L002",
        short: "integer literal out of range",
        long: r#"## BRS-L002: integer literal out of range

Integers are signed 64-bit. A literal larger than 9223372036854775807
cannot be represented.

**Example:**

    99999999999999999999
"#,
    },
    // ── Parser ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "BRS-P001",
        short: "expected expression",
        long: r#"## BRS-P001: expected expression

An operand was expected but a different token, or the end of the
input, was found.

**Example:**

    1 + * 2
"#,
    },
    ErrorEntry {
        code: "BRS-P002",
        short: "unexpected token",
        long: r#"## BRS-P002: unexpected token

A specific token was required here, such as `{` after an `if`
condition or `=` in a declaration.

**Example:**

    a int 5

**Fix:**

    a int = 5
"#,
    },
    ErrorEntry {
        code: "BRS-P003",
        short: "unexpected end of input",
        long: r#"## BRS-P003: unexpected end of input

The program ended in the middle of a construct.

**Example:**

    if true
"#,
    },
    ErrorEntry {
        code: "BRS-P004",
        short: "expected end of statement",
        long: r#"## BRS-P004: expected end of statement

Statements are separated by a newline or `;`. Two expressions on the
same line need a separator between them.

**Example:**

    1 2

**Fix:**

    1; 2
"#,
    },
    ErrorEntry {
        code: "BRS-P005",
        short: "unclosed block",
        long: r#"## BRS-P005: unclosed block

A `{` was opened but the input ended before the matching `}`.

**Example:**

    { a int = 1
"#,
    },
    // ── Compiler ─────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "BRS-C001",
        short: "variable already declared",
        long: r#"## BRS-C001: variable already declared

All variables are globals and each name can be declared once.

**Example:**

    a int = 1
    a int = 2
"#,
    },
    ErrorEntry {
        code: "BRS-C002",
        short: "undeclared identifier",
        long: r#"## BRS-C002: undeclared identifier

An identifier was used before any declaration of it. Declarations
take effect in program order, and a declaration cannot refer to the
variable it declares.

**Example:**

    b + 1
    b int = 2
"#,
    },
    ErrorEntry {
        code: "BRS-C003",
        short: "unsupported operator",
        long: r#"## BRS-C003: unsupported operator

The operator has no instruction in the bytecode. Unary operators are
`-` and `!`. Binary operators are `+ - * /`, the comparisons
`== != < <= > >=` and the logical `&& ||`.
"#,
    },
    ErrorEntry {
        code: "BRS-C004",
        short: "unsupported construct",
        long: r#"## BRS-C004: unsupported construct

`if` is an expression and must produce a value on both paths: it needs
an `else`, and each branch must end with an expression rather than a
declaration.

**Example:**

    if x > 1 { 10 }

**Fix:**

    if x > 1 { 10 } else { 0 }
"#,
    },
    ErrorEntry {
        code: "BRS-C005",
        short: "too many constants",
        long: r#"## BRS-C005: too many constants

Constant operands are one byte wide, so a program can use at most 256
distinct integer literals. Repeated literals share one entry.
"#,
    },
    ErrorEntry {
        code: "BRS-C006",
        short: "too many globals",
        long: r#"## BRS-C006: too many globals

Global slot operands are one byte wide, so a program can declare at
most 256 variables.
"#,
    },
    ErrorEntry {
        code: "BRS-C007",
        short: "branch too large",
        long: r#"## BRS-C007: branch too large

Jump offsets are 16 bits. An `if` branch whose bytecode exceeds 65535
bytes cannot be jumped over. Split the work across smaller branches.
"#,
    },
    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "BRS-R001",
        short: "stack underflow",
        long: r#"## BRS-R001: stack underflow

An instruction needed more operands than the stack held. Compiled
programs never do this; it points at hand-written or corrupted
bytecode.
"#,
    },
    ErrorEntry {
        code: "BRS-R002",
        short: "type mismatch",
        long: r#"## BRS-R002: type mismatch

Arithmetic and comparisons take integers; `!`, `&&`, `||` and `if`
conditions take booleans. Types are checked when the instruction runs.

**Example:**

    1 + true
"#,
    },
    ErrorEntry {
        code: "BRS-R003",
        short: "division by zero",
        long: r#"## BRS-R003: division by zero

The right operand of `/` was zero.

**Example:**

    10 / (5 - 5)
"#,
    },
    ErrorEntry {
        code: "BRS-R004",
        short: "integer overflow",
        long: r#"## BRS-R004: integer overflow

The result of `+`, `-`, `*` or `/` does not fit in a signed 64-bit
integer. Arithmetic never wraps.
"#,
    },
    ErrorEntry {
        code: "BRS-R005",
        short: "unknown opcode",
        long: r#"## BRS-R005: unknown opcode

The byte at the instruction pointer is not a valid opcode. This
indicates corrupted bytecode, not a problem in the source program.
"#,
    },
    ErrorEntry {
        code: "BRS-R006",
        short: "malformed instruction",
        long: r#"## BRS-R006: malformed instruction

An instruction's operand bytes are missing, or a constant index points
past the end of the constant pool.
"#,
    },
    ErrorEntry {
        code: "BRS-R007",
        short: "global read before definition",
        long: r#"## BRS-R007: global read before definition

A variable was read, but the declaration that defines it never ran.
This happens when the only declaration sits in an `if` branch that
was not taken.

**Example:**

    if false { a int = 1; 0 } else { 0 }
    a
"#,
    },
    ErrorEntry {
        code: "BRS-R008",
        short: "no result",
        long: r#"## BRS-R008: no result

The program finished without leaving a value, for example because it
is empty or its last statement is a declaration.
"#,
    },
];

/// Look up an error entry by code (e.g. `"BRS-C002"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}
