use crate::bytecode::{Chunk, OpCode};
use crate::value::Value;

/// What went wrong while executing an instruction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("instruction truncated: operand bytes missing")]
    TruncatedInstruction,
    #[error("constant index {0} is out of range")]
    BadConstant(u8),
    #[error("global slot {0} read before it was defined")]
    UndefinedGlobal(u8),
    #[error("no result: the stack is empty")]
    EmptyStack,
}

/// A fault plus the instruction that raised it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{fault} (at {offset:04} {mnemonic})")]
pub struct VmError {
    pub offset: usize,
    pub mnemonic: &'static str,
    pub fault: Fault,
}

impl VmError {
    pub fn code(&self) -> &'static str {
        match self.fault {
            Fault::StackUnderflow => "BRS-R001",
            Fault::TypeMismatch { .. } => "BRS-R002",
            Fault::DivisionByZero => "BRS-R003",
            Fault::IntegerOverflow => "BRS-R004",
            Fault::UnknownOpcode(_) => "BRS-R005",
            Fault::TruncatedInstruction | Fault::BadConstant(_) => "BRS-R006",
            Fault::UndefinedGlobal(_) => "BRS-R007",
            Fault::EmptyStack => "BRS-R008",
        }
    }
}

type VmResult<T> = Result<T, VmError>;

// ── Machine ──────────────────────────────────────────────────────────

/// Stack machine. All state is reset at the start of every [`Vm::run`],
/// so one instance can execute any number of chunks.
#[derive(Debug, Default)]
pub struct Vm {
    ip: usize,
    stack: Vec<Value>,
    globals: Vec<Option<Value>>,
}

impl Vm {
    pub fn new() -> Self {
        Vm::default()
    }

    /// Execute `chunk` until the instruction pointer runs off the end.
    pub fn run(&mut self, chunk: &Chunk) -> VmResult<()> {
        self.ip = 0;
        self.stack.clear();
        self.globals.clear();

        let code = &chunk.code;
        while self.ip < code.len() {
            let offset = self.ip;
            let byte = code[offset];
            let op = OpCode::try_from(byte).map_err(|b| VmError {
                offset,
                mnemonic: "OP_UNKNOWN",
                fault: Fault::UnknownOpcode(b),
            })?;
            self.ip += 1;
            log::trace!("{:04} {:<16} depth={}", offset, op, self.stack.len());

            self.step(chunk, op).map_err(|fault| VmError { offset, mnemonic: op.mnemonic(), fault })?;
        }

        log::debug!("run finished at {:04}: {} value(s) on stack", self.ip, self.stack.len());
        Ok(())
    }

    fn step(&mut self, chunk: &Chunk, op: OpCode) -> Result<(), Fault> {
        match op {
            OpCode::Const => {
                let index = self.read_byte(chunk)?;
                let val = chunk.constants.get(index as usize).copied().ok_or(Fault::BadConstant(index))?;
                self.stack.push(val);
            }

            OpCode::Add => self.arith(|a, b| a.checked_add(b).ok_or(Fault::IntegerOverflow))?,
            OpCode::Sub => self.arith(|a, b| a.checked_sub(b).ok_or(Fault::IntegerOverflow))?,
            OpCode::Mul => self.arith(|a, b| a.checked_mul(b).ok_or(Fault::IntegerOverflow))?,
            OpCode::Div => self.arith(|a, b| {
                if b == 0 {
                    return Err(Fault::DivisionByZero);
                }
                // i64::MIN / -1
                a.checked_div(b).ok_or(Fault::IntegerOverflow)
            })?,

            OpCode::True => self.stack.push(Value::Bool(true)),
            OpCode::False => self.stack.push(Value::Bool(false)),

            OpCode::Pop => {
                self.pop()?;
            }

            OpCode::Equal => self.compare(|a, b| a == b)?,
            OpCode::NotEqual => self.compare(|a, b| a != b)?,
            OpCode::Greater => self.compare(|a, b| a > b)?,
            OpCode::Less => self.compare(|a, b| a < b)?,
            OpCode::GreaterEqual => self.compare(|a, b| a >= b)?,
            OpCode::LessEqual => self.compare(|a, b| a <= b)?,

            OpCode::Not => {
                let b = as_bool(self.pop()?)?;
                self.stack.push(Value::Bool(!b));
            }
            OpCode::And => self.logic(|a, b| a && b)?,
            OpCode::Or => self.logic(|a, b| a || b)?,

            OpCode::Jump => {
                let offset = self.read_u16(chunk)?;
                self.ip += offset as usize;
            }
            OpCode::JumpIfFalse => {
                let offset = self.read_u16(chunk)?;
                // condition stays on the stack; the branch pops it
                let cond = self.stack.last().copied().ok_or(Fault::StackUnderflow)?;
                if !as_bool(cond)? {
                    self.ip += offset as usize;
                }
            }

            OpCode::DefineGlobal => {
                let slot = self.read_byte(chunk)?;
                let val = self.pop()?;
                let slot = slot as usize;
                if self.globals.len() <= slot {
                    self.globals.resize(slot + 1, None);
                }
                self.globals[slot] = Some(val);
            }
            OpCode::GetGlobal => {
                let slot = self.read_byte(chunk)?;
                let val = self.global(slot).ok_or(Fault::UndefinedGlobal(slot))?;
                self.stack.push(val);
            }
        }
        Ok(())
    }

    fn read_byte(&mut self, chunk: &Chunk) -> Result<u8, Fault> {
        let byte = *chunk.code.get(self.ip).ok_or(Fault::TruncatedInstruction)?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self, chunk: &Chunk) -> Result<u16, Fault> {
        let hi = self.read_byte(chunk)?;
        let lo = self.read_byte(chunk)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn pop(&mut self) -> Result<Value, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow)
    }

    /// Pop the right then the left operand.
    fn pop_pair(&mut self) -> Result<(Value, Value), Fault> {
        if self.stack.len() < 2 {
            return Err(Fault::StackUnderflow);
        }
        let right = self.pop()?;
        let left = self.pop()?;
        Ok((left, right))
    }

    fn arith(&mut self, f: impl FnOnce(i64, i64) -> Result<i64, Fault>) -> Result<(), Fault> {
        let (a, b) = self.pop_pair()?;
        let result = f(as_int(a)?, as_int(b)?)?;
        self.stack.push(Value::Int(result));
        Ok(())
    }

    fn compare(&mut self, f: impl FnOnce(i64, i64) -> bool) -> Result<(), Fault> {
        let (a, b) = self.pop_pair()?;
        let result = f(as_int(a)?, as_int(b)?);
        self.stack.push(Value::Bool(result));
        Ok(())
    }

    fn logic(&mut self, f: impl FnOnce(bool, bool) -> bool) -> Result<(), Fault> {
        let (a, b) = self.pop_pair()?;
        let result = f(as_bool(a)?, as_bool(b)?);
        self.stack.push(Value::Bool(result));
        Ok(())
    }

    /// Value on top of the stack after a run. Faults on an empty stack,
    /// which is what a program ending in a declaration leaves behind.
    pub fn stack_top(&self) -> VmResult<Value> {
        self.stack.last().copied().ok_or(VmError {
            offset: self.ip,
            mnemonic: "HALT",
            fault: Fault::EmptyStack,
        })
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn global(&self, slot: u8) -> Option<Value> {
        self.globals.get(slot as usize).copied().flatten()
    }
}

fn as_int(v: Value) -> Result<i64, Fault> {
    match v {
        Value::Int(n) => Ok(n),
        other => Err(Fault::TypeMismatch { expected: "int", found: other.kind() }),
    }
}

fn as_bool(v: Value) -> Result<bool, Fault> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(Fault::TypeMismatch { expected: "bool", found: other.kind() }),
    }
}

/// Run `chunk` on a fresh machine and return the value left on top, if any.
pub fn run(chunk: &Chunk) -> VmResult<Option<Value>> {
    let mut vm = Vm::new();
    vm.run(chunk)?;
    Ok(vm.stack.last().copied())
}

// ── Tests ────────────────────────────────────────────────────────────
