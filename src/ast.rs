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

use crate::registers::Register;

/// 1-based half-open column range within a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

// --- Assembly line structure ---

// One line of source, which can carry a label, a statement, both, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
    pub label: Option<Spanned<String>>,
    pub statement: Option<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Instruction(InstructionStmt),
    Directive(DirectiveStmt),
}

/// An instruction as written: mnemonic, optional `.s`/`.l` suffix, operands.
/// The mnemonic is not resolved here; the assembler looks it up so that
/// unknown-mnemonic errors point at the written name.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionStmt {
    pub mnemonic: Spanned<String>,
    pub size_suffix: Option<Spanned<String>>,
    pub operands: Vec<Spanned<OperandExpr>>,
}

// Represents the forms an operand can take in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandExpr {
    Number(i64),
    Register(Register),
    Ident(String),
    Indirect(Vec<Spanned<IndTerm>>),
}

/// One `+`-separated term of an indirect operand.
#[derive(Debug, Clone, PartialEq)]
pub enum IndTerm {
    Const(i64),
    Reg(Register),
    Scaled(Register, i64),
}

// --- Data directives ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirective {
    Str,  // ds "..."
    Byte, // db v, v, ...
    Half, // dh v, v, ...
    Word, // dw v | label, ...
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveStmt {
    pub kind: DataDirective,
    pub span: Span,
    pub args: Vec<Spanned<DataArg>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataArg {
    // Numeric and character literals both land here; a character carries its
    // escaped byte value.
    Number(i64),
    Str(Vec<u8>),
    Ident(String),
}
