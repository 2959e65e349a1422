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

//! The static mnemonic table of the Luna-32 instruction set.

/// Operand-shape contract of an instruction.
///
/// ```text
/// N - RET  (no operands)
/// A - ADD  any,     reg/ind
/// X - XCHG reg/ind, reg/ind
/// I - IN   const,   reg/ind
/// P - POP  reg/ind
/// U - PUSH any
/// T - INT  const
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prototype {
    N,
    A,
    X,
    I,
    P,
    U,
    T,
}

/// A record of the mnemonic lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrRecord {
    pub name: &'static str,
    pub opcode: u8,
    pub proto: Prototype,
}

/// Placeholder opcode of the synthetic mnemonics; always rewritten before
/// emission.
pub const SYNTHETIC_OPCODE: u8 = 0xFF;

/// INT carries its vector as a bare byte with no descriptor.
pub const OPCODE_INT: u8 = 0x8E;

use Prototype::*;

const fn rec(name: &'static str, opcode: u8, proto: Prototype) -> InstrRecord {
    InstrRecord { name, opcode, proto }
}

pub static INSTR_LOOKUP: &[InstrRecord] = &[
    rec("ADD", 0x00, A),
    rec("SUB", 0x02, A),
    rec("ADC", 0x04, A),
    rec("SBB", 0x06, A),
    rec("RSUB", 0x08, A),
    rec("NOR", 0x20, A),
    rec("NAND", 0x24, A),
    rec("OR", 0x28, A),
    rec("ORN", 0x2A, A),
    rec("AND", 0x2C, A),
    rec("ANDN", 0x2E, A),
    rec("MOV", 0x30, A),
    rec("XNOR", 0x34, A),
    rec("NOT", 0x38, P),
    rec("XOR", 0x3C, A),
    rec("CMP", 0x42, A),
    rec("TEST", 0x6C, A),
    //
    rec("JMP", 0x80, U),
    rec("JE", 0x81, U),
    rec("JZ", 0x81, U),
    rec("JNE", 0x82, U),
    rec("JNZ", 0x82, U),
    rec("JL", 0x83, U),
    rec("JLE", 0x84, U),
    rec("JG", 0x85, U),
    rec("JGE", 0x86, U),
    rec("JLU", 0x87, U),
    rec("JLEU", 0x88, U),
    rec("JGU", 0x89, U),
    rec("JGEU", 0x8A, U),
    //
    rec("CALL", 0x8B, U),
    rec("RET", 0x8C, N),
    rec("HLT", 0x8D, N),
    rec("INT", 0x8E, T),
    rec("IRET", 0x8F, N),
    //
    rec("LOM", 0x70, U),
    rec("ROM", 0x71, P),
    rec("LOI", 0x72, U),
    rec("ROI", 0x73, P),
    rec("ROP", 0x75, P),
    rec("LFL", 0x76, U),
    rec("RFL", 0x77, P),
    rec("LOT", 0x78, U),
    rec("ROT", 0x79, P),
    rec("LOS", 0x7A, U),
    rec("ROS", 0x7B, P),
    rec("LOF", 0x7C, U),
    rec("ROF", 0x7D, P),
    //
    rec("POP", 0xA0, P),
    rec("PUSH", 0xA2, U),
    rec("IN", 0xA4, I),
    rec("OUT", 0xA6, I),
    rec("XCHG", 0xA8, X),
    rec("POPR", 0xAA, N),
    rec("PUSHR", 0xAB, N),
    //
    rec("MOVE", 0xB0, A),
    rec("MOVZ", 0xB0, A),
    rec("MOVNE", 0xB2, A),
    rec("MOVNZ", 0xB2, A),
    rec("MOVL", 0xB4, A),
    rec("MOVLE", 0xB6, A),
    rec("MOVG", 0xB8, A),
    rec("MOVGE", 0xBA, A),
    rec("MOVLU", 0xBC, A),
    rec("MOVLEU", 0xBE, A),
    rec("MOVGU", 0xC0, A),
    rec("MOVGEU", 0xC2, A),
    //
    // Synthetic instructions, rewritten by `unalias` before emission.
    rec("NOP", SYNTHETIC_OPCODE, N),
    rec("INC", SYNTHETIC_OPCODE, P),
    rec("DEC", SYNTHETIC_OPCODE, P),
    rec("NEG", SYNTHETIC_OPCODE, P),
    rec("CLR", SYNTHETIC_OPCODE, P),
];

/// Get the record for an instruction name. Names compare case-insensitively.
pub fn instr_info(name: &str) -> Option<&'static InstrRecord> {
    INSTR_LOOKUP
        .iter()
        .find(|record| record.name.eq_ignore_ascii_case(name))
}

/// Whether `name` is a known mnemonic.
pub fn is_instruction(name: &str) -> bool {
    instr_info(name).is_some()
}

/// Whether the opcode has a short form at `opcode + 1`. Opcodes in
/// `[0x70, 0x8F]` (special-register transfers, jumps, calls, INT and the
/// other control instructions) are long-only.
pub fn toggleable(opcode: u8) -> bool {
    !(0x70..=0x8F).contains(&opcode)
}
