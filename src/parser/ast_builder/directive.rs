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
use crate::ast::{DataArg, DataDirective, DirectiveStmt, Spanned};
use crate::errors::Diagnostic;
use crate::parser::Rule;
use pest::iterators::Pair;

impl AstBuilder<'_> {
    pub(super) fn build_directive(&self, pair: Pair<Rule>) -> Result<DirectiveStmt, Diagnostic> {
        let inner = pair
            .into_inner()
            .next()
            .expect("a directive wraps one form");

        match inner.as_rule() {
            Rule::ds_dir => self.build_ds(inner),
            Rule::db_dir => self.build_data_list(inner, DataDirective::Byte),
            Rule::dh_dir => self.build_data_list(inner, DataDirective::Half),
            Rule::dw_dir => self.build_data_list(inner, DataDirective::Word),
            rule => unreachable!("unknown directive rule: {:?}", rule),
        }
    }

    fn build_ds(&self, pair: Pair<Rule>) -> Result<DirectiveStmt, Diagnostic> {
        let mut inner = pair.into_inner();
        let keyword = inner.next().expect("`ds` keyword");
        let span = self.span(&keyword);

        let Some(string) = inner.next() else {
            return Err(self.err(span, "expected a string literal after `ds`"));
        };

        let arg = Spanned {
            span: self.span(&string),
            node: DataArg::Str(self.parse_string(&string)),
        };

        Ok(DirectiveStmt {
            kind: DataDirective::Str,
            span,
            args: vec![arg],
        })
    }

    fn build_data_list(
        &self,
        pair: Pair<Rule>,
        kind: DataDirective,
    ) -> Result<DirectiveStmt, Diagnostic> {
        let mut inner = pair.into_inner();
        let keyword = inner.next().expect("data directive keyword");
        let span = self.span(&keyword);

        let mut args = Vec::new();
        for item in inner {
            let arg_span = self.span(&item);
            let node = match item.as_rule() {
                // `dh` lists bare numbers; `db`/`dw` wrap their alternatives.
                Rule::number => DataArg::Number(self.parse_number(&item)?),
                Rule::byte_val | Rule::word_val => {
                    let value = item
                        .into_inner()
                        .next()
                        .expect("a data value wraps one form");
                    match value.as_rule() {
                        Rule::number => DataArg::Number(self.parse_number(&value)?),
                        Rule::char_lit => DataArg::Number(self.parse_char(&value)),
                        Rule::ident => DataArg::Ident(value.as_str().to_string()),
                        rule => unreachable!("unknown data value rule: {:?}", rule),
                    }
                }
                rule => unreachable!("unknown data list rule: {:?}", rule),
            };
            args.push(Spanned {
                node,
                span: arg_span,
            });
        }

        Ok(DirectiveStmt { kind, span, args })
    }
}
