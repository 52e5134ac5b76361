//! Human-readable view of a [`Chunk`]: one line per instruction, showing the
//! byte offset, the mnemonic and the decoded operand.
//!
//! ```text
//! 0000 OP_CONST         0 (false)
//! 0002 OP_JUMP_IF_FALSE 3 -> 0008
//! ```

use super::{Chunk, OpCode, JUMP_OPERAND_WIDTH};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    /// Constant pool index; `value` is `None` when the index is out of range.
    Constant { index: u8, value: Option<Value> },
    /// Global slot index.
    Slot(u8),
    /// Relative forward offset and the absolute offset it lands on.
    Jump { offset: u16, target: usize },
    /// The code ended before the operand bytes.
    Missing(&'static str),
}

/// One decoded instruction. `opcode` is `Err(byte)` for an unknown opcode byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Result<OpCode, u8>,
    pub operand: Operand,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self.opcode {
            Ok(op) => op.mnemonic(),
            Err(_) => "OP_UNKNOWN",
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operand = match (&self.opcode, &self.operand) {
            (Err(byte), _) => format!("{:#04x}", byte),
            (_, Operand::None) => String::new(),
            (_, Operand::Constant { index, value: Some(v) }) => format!("{} ({})", index, v),
            (_, Operand::Constant { index, value: None }) => format!("{} <invalid const index>", index),
            (_, Operand::Slot(slot)) => slot.to_string(),
            (_, Operand::Jump { offset, target }) => format!("{} -> {:04}", offset, target),
            (_, Operand::Missing(what)) => format!("<missing {}>", what),
        };
        let line = format!("{:04} {:<16} {}", self.offset, self.mnemonic(), operand);
        f.write_str(line.trim_end())
    }
}

/// Lazy iterator over the instructions of a chunk. Never panics: a truncated
/// trailing instruction yields a single [`Operand::Missing`] line and ends
/// the iteration.
pub struct Disassembly<'a> {
    chunk: &'a Chunk,
    offset: usize,
}

impl<'a> Disassembly<'a> {
    pub(super) fn new(chunk: &'a Chunk) -> Self {
        Disassembly { chunk, offset: 0 }
    }
}

impl Iterator for Disassembly<'_> {
    type Item = Instruction;

    fn next(&mut self) -> Option<Instruction> {
        let code = &self.chunk.code;
        let offset = self.offset;
        let byte = *code.get(offset)?;
        let opcode = OpCode::try_from(byte);
        let width = opcode.map(OpCode::operand_width).unwrap_or(0);
        let operands = code.get(offset + 1..offset + 1 + width);

        let operand = match (opcode, operands) {
            (Err(_), _) => Operand::None,
            (Ok(op), None) => {
                self.offset = code.len();
                let what = match op {
                    OpCode::Const => "const index",
                    OpCode::Jump | OpCode::JumpIfFalse => "jump offset",
                    _ => "global slot",
                };
                return Some(Instruction { offset, opcode, operand: Operand::Missing(what) });
            }
            (Ok(OpCode::Const), Some(&[index])) => Operand::Constant {
                index,
                value: self.chunk.constants.get(index as usize).copied(),
            },
            (Ok(OpCode::DefineGlobal | OpCode::GetGlobal), Some(&[slot])) => Operand::Slot(slot),
            (Ok(OpCode::Jump | OpCode::JumpIfFalse), Some(&[hi, lo])) => {
                let jump = u16::from_be_bytes([hi, lo]);
                Operand::Jump {
                    offset: jump,
                    target: offset + 1 + JUMP_OPERAND_WIDTH + jump as usize,
                }
            }
            (Ok(_), Some(_)) => Operand::None,
        };

        self.offset = offset + 1 + width;
        Some(Instruction { offset, opcode, operand })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(chunk: &Chunk) -> Vec<String> {
        chunk.disassemble().map(|i| i.to_string()).collect()
    }

    fn branchy_chunk() -> Chunk {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Bool(false)).unwrap();
        let else_jump = chunk.emit_jump(OpCode::JumpIfFalse);
        chunk.write_constant(Value::Int(1)).unwrap();
        chunk.write(OpCode::Pop);
        let end_jump = chunk.emit_jump(OpCode::Jump);
        chunk.patch_jump(else_jump).unwrap();
        chunk.write_constant(Value::Int(2)).unwrap();
        chunk.write(OpCode::Pop);
        chunk.patch_jump(end_jump).unwrap();
        chunk
    }

    #[test]
    fn constants_and_jump_targets_are_rendered() {
        let got = branchy_chunk().to_string();
        for check in ["OP_CONST", "0 (false)", "OP_JUMP_IF_FALSE", "OP_JUMP", "1 (1)", "2 (2)"] {
            assert!(got.contains(check), "disassembly missing {:?}\n{}", check, got);
        }
    }

    #[test]
    fn exact_layout() {
        assert_eq!(
            lines(&branchy_chunk()),
            vec![
                "0000 OP_CONST         0 (false)",
                "0002 OP_JUMP_IF_FALSE 6 -> 0011",
                "0005 OP_CONST         1 (1)",
                "0007 OP_POP",
                "0008 OP_JUMP          3 -> 0014",
                "0011 OP_CONST         2 (2)",
                "0013 OP_POP",
            ]
        );
    }

    #[test]
    fn jump_target_is_next_instruction_at_patch_time() {
        let chunk = branchy_chunk();
        let insts: Vec<Instruction> = chunk.disassemble().collect();
        let targets: Vec<usize> = insts
            .iter()
            .filter_map(|i| match i.operand {
                Operand::Jump { target, .. } => Some(target),
                _ => None,
            })
            .collect();
        // else-branch start, then end of code
        assert_eq!(targets, vec![11, chunk.code.len()]);
        assert!(insts.iter().any(|i| i.offset == 11));
    }

    #[test]
    fn globals_render_slot() {
        let mut chunk = Chunk::new();
        chunk.write(OpCode::True);
        chunk.write(OpCode::DefineGlobal);
        chunk.write_byte(3);
        chunk.write(OpCode::GetGlobal);
        chunk.write_byte(3);
        assert_eq!(lines(&chunk), vec!["0000 OP_TRUE", "0001 OP_DEFINE_GLOBAL 3", "0003 OP_GET_GLOBAL    3"]);
    }

    #[test]
    fn truncated_const_reports_placeholder() {
        let mut chunk = Chunk::new();
        chunk.write(OpCode::True);
        chunk.write(OpCode::Const);
        assert_eq!(lines(&chunk), vec!["0000 OP_TRUE", "0001 OP_CONST         <missing const index>"]);
    }

    #[test]
    fn truncated_jump_reports_placeholder() {
        let mut chunk = Chunk::new();
        chunk.write(OpCode::Jump);
        chunk.write_byte(0);
        let insts: Vec<Instruction> = chunk.disassemble().collect();
        assert_eq!(insts.len(), 1);
        assert_eq!(insts[0].operand, Operand::Missing("jump offset"));
    }

    #[test]
    fn invalid_const_index_is_flagged() {
        let mut chunk = Chunk::new();
        chunk.write(OpCode::Const);
        chunk.write_byte(9);
        assert_eq!(lines(&chunk), vec!["0000 OP_CONST         9 <invalid const index>"]);
    }

    #[test]
    fn unknown_opcode_is_shown_and_skipped() {
        let mut chunk = Chunk::new();
        chunk.write_byte(0xee);
        chunk.write(OpCode::False);
        assert_eq!(lines(&chunk), vec!["0000 OP_UNKNOWN       0xee", "0001 OP_FALSE"]);
    }

    #[test]
    fn empty_chunk_has_no_lines() {
        assert_eq!(Chunk::new().disassemble().count(), 0);
    }
}
