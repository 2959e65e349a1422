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

mod directive;
mod operand_builders;

use crate::assembler::opcodes;
use crate::ast::{InstructionStmt, SourceLine, Span, Spanned, Statement};
use crate::errors::Diagnostic;
use crate::parser::Rule;
use crate::registers;
use pest::iterators::Pair;

/// Builds the AST for one source line out of its pest pairs. Carries the line
/// number and text so every diagnostic it produces is fully positioned.
pub struct AstBuilder<'a> {
    number: usize,
    text: &'a str,
}

impl<'a> AstBuilder<'a> {
    pub fn new(number: usize, text: &'a str) -> Self {
        AstBuilder { number, text }
    }

    fn span(&self, pair: &Pair<Rule>) -> Span {
        let span = pair.as_span();
        Span {
            lo: span.start() + 1,
            hi: span.end() + 1,
        }
    }

    fn err(&self, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(message, self.number, span.lo, span.hi, self.text)
    }

    pub fn build_line(&self, pair: Pair<Rule>) -> Result<SourceLine, Diagnostic> {
        let mut line = SourceLine {
            number: self.number,
            text: self.text.to_string(),
            label: None,
            statement: None,
        };

        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::label => line.label = Some(self.build_label(item)?),
                Rule::statement => line.statement = Some(self.build_statement(item)?),
                Rule::EOI => {}
                rule => unreachable!("unexpected rule in line: {:?}", rule),
            }
        }

        Ok(line)
    }

    fn build_label(&self, pair: Pair<Rule>) -> Result<Spanned<String>, Diagnostic> {
        let ident = pair
            .into_inner()
            .next()
            .expect("a label wraps its identifier");
        let span = self.span(&ident);
        let name = ident.as_str().to_string();

        // Mnemonics, registers, and directive keywords never name labels;
        // a reference to one could not be told apart from an operand.
        let reserved = opcodes::is_instruction(&name)
            || registers::is_register_name(&name)
            || matches!(
                name.to_ascii_lowercase().as_str(),
                "ds" | "db" | "dh" | "dw"
            );
        if reserved {
            return Err(self.err(span, format!("`{}` cannot be used as a label name", name)));
        }

        Ok(Spanned { node: name, span })
    }

    fn build_statement(&self, pair: Pair<Rule>) -> Result<Statement, Diagnostic> {
        let inner = pair
            .into_inner()
            .next()
            .expect("a statement wraps one form");
        match inner.as_rule() {
            Rule::instruction => Ok(Statement::Instruction(self.build_instruction(inner)?)),
            Rule::directive => Ok(Statement::Directive(self.build_directive(inner)?)),
            rule => unreachable!("unexpected statement rule: {:?}", rule),
        }
    }

    fn build_instruction(&self, pair: Pair<Rule>) -> Result<InstructionStmt, Diagnostic> {
        let mut inner = pair.into_inner();
        let mnemonic_pair = inner.next().expect("an instruction starts with its mnemonic");
        let mnemonic = Spanned {
            span: self.span(&mnemonic_pair),
            node: mnemonic_pair.as_str().to_string(),
        };

        let mut size_suffix = None;
        let mut operands = Vec::new();

        for item in inner {
            match item.as_rule() {
                Rule::size_suffix => {
                    let span = self.span(&item);
                    let ident = item
                        .into_inner()
                        .next()
                        .expect("a length modifier wraps its identifier");
                    size_suffix = Some(Spanned {
                        node: ident.as_str().to_string(),
                        span,
                    });
                }
                Rule::operand_list => {
                    for operand in item.into_inner() {
                        operands.push(self.build_operand(operand)?);
                    }
                }
                rule => unreachable!("unexpected rule in instruction: {:?}", rule),
            }
        }

        Ok(InstructionStmt {
            mnemonic,
            size_suffix,
            operands,
        })
    }
}
