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

//! The assembly pass: one forward walk over the source, parsing each line,
//! checking it, and emitting machine code, followed by label resolution.
//!
//! Errors never stop the walk. Each one becomes a diagnostic, the rest of the
//! offending line is abandoned, and the pass continues on the next line so a
//! single run reports as much as it can. Emission also continues after
//! errors, keeping later addresses (and therefore later diagnostics)
//! accurate; the buffer is discarded whenever any diagnostic fired.

pub mod encoder;
pub mod instruction;
pub mod opcodes;
pub mod symbol_table;

use crate::ast::{
    DataArg, DataDirective, DirectiveStmt, IndTerm, InstructionStmt, OperandExpr, SourceLine,
    Span, Spanned, Statement,
};
use crate::errors::{AssemblyFailure, Diagnostic};
use crate::limits;
use crate::parser;
use crate::registers::Register;
use encoder::OutputBuffer;
use instruction::{AddrMode, ConstSize, Instruction, Operand, OperandSize};
use opcodes::{InstrRecord, OPCODE_INT, Prototype};
use symbol_table::{SymbolTable, UseSite};

/// All state of one assembly run: the output buffer with its location
/// counter, the label tables, and the diagnostics reported so far.
#[derive(Default)]
pub struct Assembler {
    buffer: OutputBuffer,
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    /// Assemble `source` to machine code, or collect every diagnostic the
    /// run produced.
    pub fn run(mut self, source: &str) -> Result<Vec<u8>, AssemblyFailure> {
        for (index, text) in source.lines().enumerate() {
            match parser::parse_line(text, index + 1) {
                Ok(line) => self.process_line(&line),
                Err(diagnostic) => self.diagnostics.push(diagnostic),
            }
        }

        // Resolution runs even after errors so unresolved labels are
        // reported too; its patches are discarded along with the buffer.
        self.symbols
            .resolve_labels(&mut self.buffer, &mut self.diagnostics);

        if self.diagnostics.is_empty() {
            Ok(self.buffer.into_bytes())
        } else {
            Err(AssemblyFailure {
                diagnostics: self.diagnostics,
            })
        }
    }

    fn error_at(&mut self, line: &SourceLine, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(
            message,
            line.number,
            span.lo,
            span.hi,
            line.text.as_str(),
        ));
    }

    fn use_site(&self, line: &SourceLine, span: Span) -> UseSite {
        UseSite {
            line: line.number,
            lo: span.lo,
            hi: span.hi,
            snippet: line.text.clone(),
        }
    }

    fn process_line(&mut self, line: &SourceLine) {
        if let Some(label) = &line.label {
            // A label being defined takes the current location counter.
            if !self.symbols.save_label(&label.node, self.buffer.loc_ctr()) {
                self.error_at(line, label.span, format!("duplicate label `{}`", label.node));
            }
        }

        match &line.statement {
            Some(Statement::Instruction(stmt)) => self.instruction(line, stmt),
            Some(Statement::Directive(stmt)) => self.directive(line, stmt),
            None => {}
        }
    }

    // --- instructions ---

    fn instruction(&mut self, line: &SourceLine, stmt: &InstructionStmt) {
        let written = &stmt.mnemonic.node;
        let Some(record) = opcodes::instr_info(written) else {
            self.error_at(
                line,
                stmt.mnemonic.span,
                format!("unknown instruction mnemonic `{}`", written),
            );
            return;
        };

        let mut instr = Instruction::new(record);

        if let Some(suffix) = &stmt.size_suffix {
            if !self.apply_size_suffix(line, record, suffix, &mut instr) {
                return;
            }
        }

        if stmt.operands.len() > 2 {
            self.error_at(
                line,
                stmt.operands[2].span,
                "instruction takes at most two operands",
            );
            return;
        }

        // Everything below encodes at the current location counter; a label
        // reference's patch site is measured from here.
        let start = self.buffer.loc_ctr();

        let mut exprs = stmt.operands.iter();
        if let Some(expr) = exprs.next() {
            let Some(op) = self.build_operand(line, expr, record, instr.size, start) else {
                return;
            };
            instr.op1 = Some(op);
        }
        if let Some(expr) = exprs.next() {
            let Some(op) = self.build_operand(line, expr, record, instr.size, start) else {
                return;
            };
            instr.op2 = Some(op);
        }

        // Check shapes against the written mnemonic's prototype, then
        // rewrite synthetics, then settle sizes.
        if !instruction::type_agreement(&instr) {
            self.error_at(
                line,
                stmt.mnemonic.span,
                "instruction operands do not agree with its prototype",
            );
            return;
        }

        instruction::unalias(&mut instr, written);

        if !instruction::size_agreement(&mut instr) {
            self.error_at(
                line,
                stmt.mnemonic.span,
                "instruction operands' sizes are not in agreement",
            );
            return;
        }

        self.buffer.save_instruction(&instr);
    }

    fn apply_size_suffix(
        &mut self,
        line: &SourceLine,
        record: &InstrRecord,
        suffix: &Spanned<String>,
        instr: &mut Instruction,
    ) -> bool {
        if record.proto == Prototype::N || !opcodes::toggleable(record.opcode) {
            self.error_at(line, suffix.span, "instruction cannot have a length modifier");
            return false;
        }

        match suffix.node.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('s') => instr.size = OperandSize::Short,
            Some('l') => instr.size = OperandSize::Long,
            _ => {
                self.error_at(
                    line,
                    suffix.span,
                    "invalid length modifier, expecting `s` or `l`",
                );
                return false;
            }
        }

        true
    }

    // --- operands ---

    fn build_operand(
        &mut self,
        line: &SourceLine,
        expr: &Spanned<OperandExpr>,
        record: &InstrRecord,
        instr_size: OperandSize,
        instr_start: u32,
    ) -> Option<Operand> {
        match &expr.node {
            OperandExpr::Number(value) => Some(const_operand(*value, instr_size)),
            OperandExpr::Register(register) => Some(register_operand(*register)),
            OperandExpr::Ident(name) => {
                self.label_operand(line, expr.span, name, record, instr_start)
            }
            OperandExpr::Indirect(terms) => {
                self.indirect_operand(line, expr.span, terms, instr_size)
            }
        }
    }

    fn label_operand(
        &mut self,
        line: &SourceLine,
        span: Span,
        name: &str,
        record: &InstrRecord,
        instr_start: u32,
    ) -> Option<Operand> {
        let value = match self.symbols.label_address(name) {
            Some(address) => address as i32,
            None => {
                // INT's bare vector byte has no room for a 4-byte patch.
                if record.opcode == OPCODE_INT {
                    self.error_at(
                        line,
                        span,
                        format!("label `{}` must be defined before this use", name),
                    );
                    return None;
                }

                // Patch site skips the opcode and descriptor bytes; the
                // placeholder is overwritten during resolution.
                let site = self.use_site(line, span);
                self.symbols.save_undef_label(name, instr_start + 2, site);
                -1
            }
        };

        Some(Operand {
            mode: AddrMode::Const {
                width: ConstSize::Word,
                value,
            },
            size: OperandSize::Long,
        })
    }

    fn indirect_operand(
        &mut self,
        line: &SourceLine,
        span: Span,
        terms: &[Spanned<IndTerm>],
        instr_size: OperandSize,
    ) -> Option<Operand> {
        let mut disp: i64 = 0;
        // At most two distinct registers, each with its accumulated scale.
        let mut regs: Vec<(u8, i64)> = Vec::new();

        for term in terms {
            let (register, scale) = match &term.node {
                IndTerm::Const(value) => {
                    disp += *value;
                    continue;
                }
                IndTerm::Reg(register) => (register, 1),
                IndTerm::Scaled(register, scale) => (register, *scale),
            };

            match regs.iter().position(|(id, _)| *id == register.id) {
                Some(slot) => regs[slot].1 += scale,
                None if regs.len() == 2 => {
                    self.error_at(
                        line,
                        term.span,
                        "cannot encode an indirect access with three registers",
                    );
                    return None;
                }
                None => regs.push((register.id, scale)),
            }
        }

        let width = if disp == 0 {
            ConstSize::Skip
        } else {
            match limits::fit_size(disp) {
                Some(width) => width,
                None => {
                    self.error_at(line, span, "indirect displacement larger than 32 bits");
                    return None;
                }
            }
        };
        let disp = disp as i32;

        let mode = match regs.as_slice() {
            [] => {
                self.error_at(line, span, "an indirect access needs at least one register");
                return None;
            }

            // A lone register: scale 1 is a plain indirect; 2, 3, 5, and 9
            // fold into base + index with the register serving as both.
            &[(base, scale)] => match scale {
                1 => AddrMode::Indirect { base, width, disp },
                2 | 3 | 5 | 9 => AddrMode::ScaledIndirect {
                    base,
                    index: base,
                    scale: (scale - 1) as u8,
                    width,
                    disp,
                },
                _ => {
                    self.error_at(
                        line,
                        span,
                        format!("cannot encode an indirect access with scale {}", scale),
                    );
                    return None;
                }
            },

            // Two registers: whichever has scale 1 is the base, and the
            // other's scale must be encodable.
            &[(reg1, scale1), (reg2, scale2)] => {
                let (base, index, scale) = if scale1 == 1 {
                    (reg1, reg2, scale2)
                } else if scale2 == 1 {
                    (reg2, reg1, scale1)
                } else {
                    self.error_at(
                        line,
                        span,
                        "an indirect access needs a base register with scale 1",
                    );
                    return None;
                };

                if !matches!(scale, 1 | 2 | 4 | 8) {
                    self.error_at(line, span, "index register scale must be 1, 2, 4, or 8");
                    return None;
                }

                AddrMode::ScaledIndirect {
                    base,
                    index,
                    scale: scale as u8,
                    width,
                    disp,
                }
            }

            _ => unreachable!("more than two registers already rejected"),
        };

        Some(Operand {
            mode,
            size: instr_size,
        })
    }

    // --- data directives ---

    fn directive(&mut self, line: &SourceLine, stmt: &DirectiveStmt) {
        match stmt.kind {
            DataDirective::Str => self.data_str(stmt),
            DataDirective::Byte => self.data_byte(line, stmt),
            DataDirective::Half => self.data_half(line, stmt),
            DataDirective::Word => self.data_word(line, stmt),
        }
    }

    fn data_str(&mut self, stmt: &DirectiveStmt) {
        for arg in &stmt.args {
            match &arg.node {
                DataArg::Str(bytes) => self.buffer.emit_bytes(bytes),
                other => unreachable!("non-string argument to `ds`: {:?}", other),
            }
        }
    }

    fn data_byte(&mut self, line: &SourceLine, stmt: &DirectiveStmt) {
        for arg in &stmt.args {
            let value = match &arg.node {
                DataArg::Number(value) => *value,
                other => unreachable!("non-numeric argument to `db`: {:?}", other),
            };

            if !(limits::SBYTE_MIN..=limits::UBYTE_MAX).contains(&value) {
                self.error_at(line, arg.span, "value does not fit in a byte");
                return;
            }

            self.buffer.emit_byte(value as u8);
        }
    }

    fn data_half(&mut self, line: &SourceLine, stmt: &DirectiveStmt) {
        for arg in &stmt.args {
            let value = match &arg.node {
                DataArg::Number(value) => *value,
                other => unreachable!("non-numeric argument to `dh`: {:?}", other),
            };

            if !(limits::SHALF_MIN..=limits::UHALF_MAX).contains(&value) {
                self.error_at(line, arg.span, "value does not fit in a half word");
                return;
            }

            self.buffer.emit_bytes(&(value as u16).to_le_bytes());
        }
    }

    fn data_word(&mut self, line: &SourceLine, stmt: &DirectiveStmt) {
        for arg in &stmt.args {
            let value = match &arg.node {
                DataArg::Number(value) => *value,
                DataArg::Ident(name) => match self.symbols.label_address(name) {
                    Some(address) => address as i64,
                    None => {
                        // The word being emitted is itself the patch site.
                        let site = self.use_site(line, arg.span);
                        self.symbols
                            .save_undef_label(name, self.buffer.loc_ctr(), site);
                        -1
                    }
                },
                other => unreachable!("string argument to `dw`: {:?}", other),
            };

            if !(limits::SWORD_MIN..=limits::UWORD_MAX).contains(&value) {
                self.error_at(line, arg.span, "value does not fit in a word");
                return;
            }

            self.buffer.emit_bytes(&(value as u32).to_le_bytes());
        }
    }
}

fn const_operand(value: i64, instr_size: OperandSize) -> Operand {
    // A negative constant may narrow to a byte when the instruction is
    // short; everything else takes its tightest width.
    let width = if instr_size == OperandSize::Short
        && value < 0
        && value >= limits::SBYTE_MIN
    {
        ConstSize::Byte
    } else {
        limits::fit_size(value).expect("literal range checked during parsing")
    };

    Operand {
        mode: AddrMode::Const {
            width,
            value: value as i32,
        },
        size: if width == ConstSize::Byte {
            OperandSize::Short
        } else {
            OperandSize::Long
        },
    }
}

fn register_operand(register: Register) -> Operand {
    Operand::register(
        register.id,
        if register.short {
            OperandSize::Short
        } else {
            OperandSize::Long
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(source: &str) -> Result<Vec<u8>, AssemblyFailure> {
        Assembler::new().run(source)
    }

    fn messages(source: &str) -> Vec<String> {
        assemble(source)
            .unwrap_err()
            .diagnostics
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_empty_source_is_empty_output() {
        assert_eq!(assemble("").unwrap(), Vec::<u8>::new());
        assert_eq!(assemble("\n\n; nothing\n").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_unknown_mnemonic() {
        let msgs = messages("frob r0\n");
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("unknown instruction mnemonic `frob`"));
    }

    #[test]
    fn test_multiple_errors_in_source_order() {
        let msgs = messages("frob r0\nmov 1, 2\nint.s 3\n");
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].contains("unknown instruction"));
        assert!(msgs[1].contains("prototype"));
        assert!(msgs[2].contains("length modifier"));
    }

    #[test]
    fn test_prototype_violations() {
        assert!(messages("ret r0\n")[0].contains("prototype"));
        assert!(messages("mov r0, 1\n")[0].contains("prototype"));
        assert!(messages("xchg 1, r0\n")[0].contains("prototype"));
        assert!(messages("in r0, r1\n")[0].contains("prototype"));
        assert!(messages("pop 4\n")[0].contains("prototype"));
        assert!(messages("int r0\n")[0].contains("prototype"));
        assert!(messages("inc 5\n")[0].contains("prototype"));
    }

    #[test]
    fn test_three_operands_rejected() {
        assert!(messages("mov 1, r0, r1\n")[0].contains("at most two"));
    }

    #[test]
    fn test_size_mismatches() {
        assert!(messages("mov r0a, r1\n")[0].contains("sizes"));
        assert!(messages("mov.s 300, r0a\n")[0].contains("sizes"));
        assert!(messages("push.s r0\n")[0].contains("sizes"));
    }

    #[test]
    fn test_indirect_shape_errors() {
        assert!(messages("pop [4]\n")[0].contains("at least one register"));
        assert!(messages("pop [r0 + r1 + r2]\n")[0].contains("three registers"));
        assert!(messages("pop [r0 + 3*r1]\n")[0].contains("1, 2, 4, or 8"));
        assert!(messages("pop [r0*4]\n")[0].contains("scale 4"));
        assert!(messages("pop [2*r0 + 2*r1]\n")[0].contains("base register"));
    }

    #[test]
    fn test_duplicate_label() {
        let msgs = messages("x: hlt\nx: hlt\n");
        assert!(msgs[0].contains("duplicate label `x`"));
    }

    #[test]
    fn test_unresolved_label_reported_after_parse() {
        let msgs = messages("jmp nowhere\n");
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("unresolved label `nowhere`"));
    }

    #[test]
    fn test_no_output_when_any_error_fired() {
        // The first line is fine on its own; the second one fails.
        let result = assemble("hlt\ndb 999\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_emission_continues_after_errors() {
        // The bad line must not shift the label after it.
        let msgs = messages("db 999\nhlt\nl: jmp l2\n");
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].contains("byte"));
        assert!(msgs[1].contains("unresolved label `l2`"));
    }

    #[test]
    fn test_int_needs_defined_label() {
        let msgs = messages("int vec\n");
        assert!(msgs[0].contains("must be defined before"));
    }

    #[test]
    fn test_int_with_defined_label() {
        let code = assemble("vec:\nint vec\n").unwrap();
        assert_eq!(code, vec![0x8E, 0x00]);
    }

    #[test]
    fn test_directive_range_errors() {
        assert!(messages("db 256\n")[0].contains("byte"));
        assert!(messages("db -129\n")[0].contains("byte"));
        assert!(messages("dh 65536\n")[0].contains("half word"));
        assert!(messages("dh -32769\n")[0].contains("half word"));
    }

    #[test]
    fn test_error_positions() {
        let failure = assemble("   mov 1, 2\n").unwrap_err();
        let diag = &failure.diagnostics[0];
        assert_eq!(diag.line, 1);
        assert_eq!(diag.lo, 4); // points at the mnemonic
        assert_eq!(diag.snippet, "   mov 1, 2");
    }
}
