use crate::value::Value;

pub mod disasm;
pub use disasm::{Disassembly, Instruction, Operand};

/// Width in bytes of a jump operand (big-endian u16).
pub const JUMP_OPERAND_WIDTH: usize = 2;

/// Largest constant pool / global table a one-byte operand can address.
pub const MAX_INDEXED: usize = u8::MAX as usize + 1;

// ── Opcodes ──────────────────────────────────────────────────────────
//
// The discriminants are the wire encoding and must not be reordered.

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Const = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    True = 5,
    False = 6,
    Pop = 7,
    Equal = 8,
    NotEqual = 9,
    Greater = 10,
    Less = 11,
    GreaterEqual = 12,
    LessEqual = 13,
    Not = 14,
    And = 15,
    Or = 16,
    Jump = 17,
    JumpIfFalse = 18,
    DefineGlobal = 19,
    GetGlobal = 20,
}

impl OpCode {
    pub const ALL: [OpCode; 21] = [
        OpCode::Const,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Div,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::Equal,
        OpCode::NotEqual,
        OpCode::Greater,
        OpCode::Less,
        OpCode::GreaterEqual,
        OpCode::LessEqual,
        OpCode::Not,
        OpCode::And,
        OpCode::Or,
        OpCode::Jump,
        OpCode::JumpIfFalse,
        OpCode::DefineGlobal,
        OpCode::GetGlobal,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Const => "OP_CONST",
            OpCode::Add => "OP_ADD",
            OpCode::Sub => "OP_SUB",
            OpCode::Mul => "OP_MUL",
            OpCode::Div => "OP_DIV",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Pop => "OP_POP",
            OpCode::Equal => "OP_EQUAL",
            OpCode::NotEqual => "OP_NOT_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::GreaterEqual => "OP_GREATER_EQUAL",
            OpCode::LessEqual => "OP_LESS_EQUAL",
            OpCode::Not => "OP_NOT",
            OpCode::And => "OP_AND",
            OpCode::Or => "OP_OR",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
        }
    }

    /// Number of operand bytes following the opcode byte.
    pub fn operand_width(self) -> usize {
        match self {
            OpCode::Const | OpCode::DefineGlobal | OpCode::GetGlobal => 1,
            OpCode::Jump | OpCode::JumpIfFalse => JUMP_OPERAND_WIDTH,
            _ => 0,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::ALL.get(byte as usize).copied().ok_or(byte)
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // pad() so width specifiers like {:<16} apply
        f.pad(self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    #[error("constant pool is full ({} distinct constants)", MAX_INDEXED)]
    ConstantPoolFull,
    #[error("jump distance {distance} exceeds {} bytes", u16::MAX)]
    JumpTooFar { distance: usize },
}

// ── Chunk ────────────────────────────────────────────────────────────

/// A compiled program: a flat byte stream plus the constants it indexes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Chunk::default()
    }

    pub fn write(&mut self, op: OpCode) {
        self.code.push(op as u8);
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.code.push(byte);
    }

    /// Add `val` to the pool, reusing an identical entry if one exists.
    pub fn add_constant(&mut self, val: Value) -> Result<u8, ChunkError> {
        if let Some(i) = self.constants.iter().position(|c| *c == val) {
            return Ok(i as u8);
        }
        if self.constants.len() >= MAX_INDEXED {
            return Err(ChunkError::ConstantPoolFull);
        }
        self.constants.push(val);
        Ok((self.constants.len() - 1) as u8)
    }

    /// Emit `OP_CONST <index>` for `val`.
    pub fn write_constant(&mut self, val: Value) -> Result<u8, ChunkError> {
        let index = self.add_constant(val)?;
        self.write(OpCode::Const);
        self.write_byte(index);
        Ok(index)
    }

    /// Emit `op` with a placeholder offset and return the position of the
    /// first offset byte, to be handed to [`Chunk::patch_jump`].
    pub fn emit_jump(&mut self, op: OpCode) -> usize {
        self.write(op);
        self.write_byte(0xff);
        self.write_byte(0xff);
        self.code.len() - JUMP_OPERAND_WIDTH
    }

    /// Point the jump whose offset starts at `handle` at the current end of code.
    pub fn patch_jump(&mut self, handle: usize) -> Result<(), ChunkError> {
        let distance = self.code.len() - (handle + JUMP_OPERAND_WIDTH);
        let offset = u16::try_from(distance).map_err(|_| ChunkError::JumpTooFar { distance })?;
        let [hi, lo] = offset.to_be_bytes();
        self.code[handle] = hi;
        self.code[handle + 1] = lo;
        log::trace!("patched jump at {:04} -> {:04}", handle - 1, self.code.len());
        Ok(())
    }

    /// Lazily decode the instruction stream.
    pub fn disassemble(&self) -> Disassembly<'_> {
        Disassembly::new(self)
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for inst in self.disassemble() {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_ordinals_are_stable() {
        assert_eq!(OpCode::Const as u8, 0);
        assert_eq!(OpCode::Pop as u8, 7);
        assert_eq!(OpCode::Or as u8, 16);
        assert_eq!(OpCode::JumpIfFalse as u8, 18);
        assert_eq!(OpCode::GetGlobal as u8, 20);
        for (i, op) in OpCode::ALL.iter().enumerate() {
            assert_eq!(*op as u8 as usize, i, "{} out of place", op);
            assert_eq!(OpCode::try_from(i as u8), Ok(*op));
        }
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert_eq!(OpCode::try_from(21), Err(21));
        assert_eq!(OpCode::try_from(0xff), Err(0xff));
    }

    #[test]
    fn write_constant_emits_const_and_index() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.write_constant(Value::Int(7)), Ok(0));
        assert_eq!(chunk.write_constant(Value::Bool(true)), Ok(1));
        assert_eq!(chunk.code, vec![OpCode::Const as u8, 0, OpCode::Const as u8, 1]);
        assert_eq!(chunk.constants, vec![Value::Int(7), Value::Bool(true)]);
    }

    #[test]
    fn identical_constants_share_a_slot() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Int(3)).unwrap();
        chunk.write_constant(Value::Int(4)).unwrap();
        assert_eq!(chunk.write_constant(Value::Int(3)), Ok(0));
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn constant_pool_caps_at_256_distinct() {
        let mut chunk = Chunk::new();
        for i in 0..256 {
            assert_eq!(chunk.add_constant(Value::Int(i)), Ok(i as u8));
        }
        assert_eq!(chunk.add_constant(Value::Int(256)), Err(ChunkError::ConstantPoolFull));
        // existing values are still reachable
        assert_eq!(chunk.add_constant(Value::Int(255)), Ok(255));
    }

    #[test]
    fn emit_jump_returns_first_offset_byte() {
        let mut chunk = Chunk::new();
        chunk.write(OpCode::True);
        let handle = chunk.emit_jump(OpCode::JumpIfFalse);
        assert_eq!(handle, 2);
        assert_eq!(chunk.code.len(), 4);
    }

    #[test]
    fn patch_jump_writes_big_endian_distance() {
        let mut chunk = Chunk::new();
        let handle = chunk.emit_jump(OpCode::Jump);
        chunk.write(OpCode::True);
        chunk.write(OpCode::Pop);
        chunk.patch_jump(handle).unwrap();
        assert_eq!(&chunk.code[1..3], &[0, 2]);
    }

    #[test]
    fn patch_jump_with_nothing_between_is_zero() {
        let mut chunk = Chunk::new();
        let handle = chunk.emit_jump(OpCode::Jump);
        chunk.patch_jump(handle).unwrap();
        assert_eq!(chunk.code, vec![OpCode::Jump as u8, 0, 0]);
    }

    #[test]
    fn patch_jump_at_ceiling() {
        let mut chunk = Chunk::new();
        let handle = chunk.emit_jump(OpCode::Jump);
        chunk.code.resize(chunk.code.len() + u16::MAX as usize, OpCode::Pop as u8);
        chunk.patch_jump(handle).unwrap();
        assert_eq!(&chunk.code[1..3], &[0xff, 0xff]);
    }

    #[test]
    fn patch_jump_past_ceiling_fails() {
        let mut chunk = Chunk::new();
        let handle = chunk.emit_jump(OpCode::Jump);
        chunk.code.resize(chunk.code.len() + u16::MAX as usize + 1, OpCode::Pop as u8);
        assert_eq!(chunk.patch_jump(handle), Err(ChunkError::JumpTooFar { distance: 65536 }));
    }

    #[test]
    fn display_pads_mnemonic() {
        assert_eq!(format!("{:<10}|", OpCode::Add), "OP_ADD    |");
    }
}
