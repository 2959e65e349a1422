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

use super::AstBuilder;
use crate::ast::{IndTerm, OperandExpr, Spanned};
use crate::errors::Diagnostic;
use crate::limits;
use crate::parser::Rule;
use crate::registers::{Register, register_id};
use pest::iterators::Pair;

impl AstBuilder<'_> {
    // Build an operand from a pest pair.
    pub(super) fn build_operand(
        &self,
        pair: Pair<Rule>,
    ) -> Result<Spanned<OperandExpr>, Diagnostic> {
        let span = self.span(&pair);
        let inner = pair.into_inner().next().expect("an operand wraps one form");

        let node = match inner.as_rule() {
            Rule::register => OperandExpr::Register(register_id(inner.as_str())),
            Rule::number => OperandExpr::Number(self.parse_number(&inner)?),
            Rule::ident => OperandExpr::Ident(inner.as_str().to_string()),
            Rule::indirect => OperandExpr::Indirect(self.build_indirect(inner)?),
            rule => unreachable!("unknown operand rule: {:?}", rule),
        };

        Ok(Spanned { node, span })
    }

    fn build_indirect(&self, pair: Pair<Rule>) -> Result<Vec<Spanned<IndTerm>>, Diagnostic> {
        pair.into_inner()
            .map(|term| self.build_ind_term(term))
            .collect()
    }

    fn build_ind_term(&self, pair: Pair<Rule>) -> Result<Spanned<IndTerm>, Diagnostic> {
        let span = self.span(&pair);
        let inner = pair
            .into_inner()
            .next()
            .expect("an indirect term wraps one form");

        let node = match inner.as_rule() {
            Rule::number => IndTerm::Const(self.parse_number(&inner)?),
            Rule::register => IndTerm::Reg(self.long_register(&inner)?),
            Rule::scaled_term => {
                let mut register = None;
                let mut scale = 1;
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::register => register = Some(self.long_register(&part)?),
                        Rule::number => scale = self.parse_number(&part)?,
                        rule => unreachable!("unexpected rule in scaled term: {:?}", rule),
                    }
                }
                IndTerm::Scaled(register.expect("a scaled term has a register"), scale)
            }
            rule => unreachable!("unknown indirect term rule: {:?}", rule),
        };

        Ok(Spanned { node, span })
    }

    // Only the 32-bit registers can be a base or an index.
    fn long_register(&self, pair: &Pair<Rule>) -> Result<Register, Diagnostic> {
        let register = register_id(pair.as_str());
        if register.short {
            return Err(self.err(
                self.span(pair),
                "expected an integer or a long register in an indirect access",
            ));
        }
        Ok(register)
    }

    /// Decode a numeric literal: optional sign, then a hex, binary, octal, or
    /// decimal body.
    pub(super) fn parse_number(&self, pair: &Pair<Rule>) -> Result<i64, Diagnostic> {
        let text = pair.as_str();
        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let lower = rest.to_ascii_lowercase();
        let (base, digits) = if let Some(hex) = lower.strip_prefix("0x") {
            (16, hex)
        } else if let Some(bin) = lower.strip_prefix("0b") {
            (2, bin)
        } else if lower.starts_with('0') {
            (8, lower.as_str())
        } else {
            (10, lower.as_str())
        };

        let too_big = || self.err(self.span(pair), "integer larger than 32 bits");

        let magnitude = i64::from_str_radix(digits, base).map_err(|_| too_big())?;
        let value = if negative { -magnitude } else { magnitude };

        if limits::fit_size(value).is_none() {
            return Err(too_big());
        }

        Ok(value)
    }

    /// Byte value of a character literal, escapes applied.
    pub(super) fn parse_char(&self, pair: &Pair<Rule>) -> i64 {
        let inner = pair
            .clone()
            .into_inner()
            .next()
            .expect("a character literal wraps its character");
        let text = inner.as_str();

        let value = match text.strip_prefix('\\') {
            Some(escaped) => escape_char(escaped.chars().next().expect("escaped character")),
            None => text.chars().next().expect("character literal body"),
        };

        value as i64
    }

    /// Bytes of a string literal, escapes applied. No terminator is added.
    pub(super) fn parse_string(&self, pair: &Pair<Rule>) -> Vec<u8> {
        let inner = pair
            .clone()
            .into_inner()
            .next()
            .expect("a string literal wraps its body");

        let mut out = String::with_capacity(inner.as_str().len());
        let mut chars = inner.as_str().chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(escape_char(next));
                }
            } else {
                out.push(c);
            }
        }

        out.into_bytes()
    }
}

/// Provide the escaped version of a character representation, i.e. `t` for
/// `\t`. Any character outside the escape set is itself.
fn escape_char(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'b' => '\u{0008}',
        'f' => '\u{000C}',
        'v' => '\u{000B}',
        '0' => '\0',
        other => other,
    }
}
