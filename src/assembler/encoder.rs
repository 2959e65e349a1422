/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! The output buffer and the wire encoding of instructions and operands.
//!
//! Each instruction is emitted as
//!
//! ```text
//! [ opcode : 1 byte ] [ descriptor(s) + immediate for op1 ] [ same for op2 ]
//! ```
//!
//! The descriptor byte carries the operand kind in its low two bits; the rest
//! depends on the kind:
//!
//! ```text
//! Const          kind=0 | width code << 2 | 0
//! Indirect       kind=1 | width code << 2 | base << 4
//! Register       kind=2 | reg << 2
//! ScaledIndirect kind=3 | log2(scale) << 2 | base << 4, then an extra byte
//!                with the index register low and the width code high
//! ```
//!
//! Immediates follow little-endian, 0/1/2/4 bytes per the width code. INT is
//! the one exception to all of this: its opcode is followed by a bare vector
//! byte and nothing else.

use crate::assembler::instruction::{AddrMode, ConstSize, Instruction, Operand};
use crate::assembler::opcodes::OPCODE_INT;

/// Worst case: 1 opcode + 2 * (2 descriptor + 4 immediate).
pub const MAX_INSTR_SIZE: usize = 13;

/// Append-only output buffer. The location counter equals the number of
/// bytes emitted so far and is the address a label defined now would take.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        OutputBuffer::default()
    }

    pub fn loc_ctr(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn emit_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Overwrite the 4 bytes at `offset` with `value`, little-endian. Offsets
    /// past the emitted range are ignored; they can only come from a use-site
    /// whose instruction itself failed, and such runs never produce output.
    pub fn patch_word(&mut self, offset: u32, value: u32) {
        let offset = offset as usize;
        if let Some(slot) = self.bytes.get_mut(offset..offset + 4) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the machine code for one instruction into the buffer.
    pub fn save_instruction(&mut self, instr: &Instruction) {
        self.emit_byte(instr.wire_opcode());

        // INT doesn't have a descriptor byte.
        if instr.opcode == OPCODE_INT {
            if let Some(Operand {
                mode: AddrMode::Const { value, .. },
                ..
            }) = &instr.op1
            {
                self.emit_byte(*value as u8);
            }
            return;
        }

        if let Some(op) = &instr.op1 {
            self.save_operand(op);
        }
        if let Some(op) = &instr.op2 {
            self.save_operand(op);
        }
    }

    /// Write one operand's descriptor byte(s) and immediate.
    fn save_operand(&mut self, op: &Operand) {
        match &op.mode {
            AddrMode::Const { width, value } => {
                self.emit_byte(0b00 | width.wire_code() << 2);
                self.emit_const(*width, *value);
            }
            AddrMode::Indirect { base, width, disp } => {
                self.emit_byte(0b01 | width.wire_code() << 2 | (base & 0x0F) << 4);
                self.emit_const(*width, *disp);
            }
            AddrMode::Register { reg } => {
                self.emit_byte(0b10 | (reg & 0x0F) << 2);
            }
            AddrMode::ScaledIndirect {
                base,
                index,
                scale,
                width,
                disp,
            } => {
                self.emit_byte(0b11 | scale_code(*scale) << 2 | (base & 0x0F) << 4);
                self.emit_byte((index & 0x0F) | width.wire_code() << 4);
                self.emit_const(*width, *disp);
            }
        }
    }

    fn emit_const(&mut self, width: ConstSize, value: i32) {
        let bytes = (value as u32).to_le_bytes();
        self.emit_bytes(&bytes[..width.width()]);
    }
}

/// 2-bit wire form of an index scale in {1, 2, 4, 8}.
fn scale_code(scale: u8) -> u8 {
    scale.trailing_zeros() as u8 & 0x03
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::instruction::OperandSize;
    use crate::assembler::opcodes::instr_info;

    fn instr_of(name: &str) -> Instruction {
        Instruction::new(instr_info(name).unwrap())
    }

    fn const_op(width: ConstSize, value: i32) -> Operand {
        Operand {
            mode: AddrMode::Const { width, value },
            size: OperandSize::Long,
        }
    }

    #[test]
    fn test_register_descriptor() {
        let mut buf = OutputBuffer::new();
        let mut xchg = instr_of("XCHG");
        xchg.op1 = Some(Operand::register(0, OperandSize::Long));
        xchg.op2 = Some(Operand::register(3, OperandSize::Long));
        buf.save_instruction(&xchg);
        assert_eq!(buf.as_bytes(), &[0xA8, 0x02, 0x0E]);
    }

    #[test]
    fn test_const_immediate_little_endian() {
        let mut buf = OutputBuffer::new();
        let mut push = instr_of("PUSH");
        push.op1 = Some(const_op(ConstSize::Half, 0x1234));
        buf.save_instruction(&push);
        // kind 0, width code 2.
        assert_eq!(buf.as_bytes(), &[0xA2, 0x08, 0x34, 0x12]);
    }

    #[test]
    fn test_negative_word_immediate() {
        let mut buf = OutputBuffer::new();
        let mut push = instr_of("PUSH");
        push.op1 = Some(const_op(ConstSize::Word, -1));
        buf.save_instruction(&push);
        assert_eq!(buf.as_bytes(), &[0xA2, 0x0C, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_indirect_with_and_without_displacement() {
        let mut buf = OutputBuffer::new();
        let mut pop = instr_of("POP");
        pop.op1 = Some(Operand {
            mode: AddrMode::Indirect {
                base: 2,
                width: ConstSize::Skip,
                disp: 0,
            },
            size: OperandSize::Long,
        });
        buf.save_instruction(&pop);
        // No immediate bytes for a skipped displacement.
        assert_eq!(buf.as_bytes(), &[0xA0, 0x21]);

        let mut buf = OutputBuffer::new();
        let mut pop = instr_of("POP");
        pop.op1 = Some(Operand {
            mode: AddrMode::Indirect {
                base: 2,
                width: ConstSize::Byte,
                disp: 8,
            },
            size: OperandSize::Long,
        });
        buf.save_instruction(&pop);
        assert_eq!(buf.as_bytes(), &[0xA0, 0x25, 0x08]);
    }

    #[test]
    fn test_scaled_indirect_extra_byte() {
        let mut buf = OutputBuffer::new();
        let mut pop = instr_of("POP");
        pop.op1 = Some(Operand {
            mode: AddrMode::ScaledIndirect {
                base: 1,
                index: 2,
                scale: 4,
                width: ConstSize::Skip,
                disp: 0,
            },
            size: OperandSize::Long,
        });
        buf.save_instruction(&pop);
        // desc = 3 | log2(4)<<2 | 1<<4; extra = index 2 | width 0 << 4.
        assert_eq!(buf.as_bytes(), &[0xA0, 0x1B, 0x02]);
    }

    #[test]
    fn test_int_has_no_descriptor() {
        let mut buf = OutputBuffer::new();
        let mut int = instr_of("INT");
        int.op1 = Some(const_op(ConstSize::Byte, 0x42));
        buf.save_instruction(&int);
        assert_eq!(buf.as_bytes(), &[0x8E, 0x42]);
    }

    #[test]
    fn test_patch_word() {
        let mut buf = OutputBuffer::new();
        buf.emit_bytes(&[0x80, 0x0C, 0xFF, 0xFF, 0xFF, 0xFF]);
        buf.patch_word(2, 6);
        assert_eq!(buf.as_bytes(), &[0x80, 0x0C, 0x06, 0x00, 0x00, 0x00]);
        // Patching twice writes the same bytes.
        buf.patch_word(2, 6);
        assert_eq!(buf.as_bytes(), &[0x80, 0x0C, 0x06, 0x00, 0x00, 0x00]);
        // Out-of-range offsets are ignored.
        buf.patch_word(5, 1);
        assert_eq!(buf.as_bytes(), &[0x80, 0x0C, 0x06, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_max_instruction_size() {
        let mut buf = OutputBuffer::new();
        let mut mov = instr_of("MOV");
        let wide = Operand {
            mode: AddrMode::ScaledIndirect {
                base: 1,
                index: 2,
                scale: 8,
                width: ConstSize::Word,
                disp: -4,
            },
            size: OperandSize::Long,
        };
        mov.op1 = Some(wide.clone());
        mov.op2 = Some(wide);
        buf.save_instruction(&mov);
        assert_eq!(buf.as_bytes().len(), MAX_INSTR_SIZE);
    }
}
