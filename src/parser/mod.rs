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

mod ast_builder;

use crate::ast::SourceLine;
use crate::errors::Diagnostic;
use ast_builder::AstBuilder;
use pest::Parser;
use pest::error::LineColLocation;
use pest_derive::Parser;

// Derive the parser from our grammar file.
#[derive(Parser)]
#[grammar = "./grammar.pest"]
pub struct LunaParser;

/// Parse one line of source into its AST. `number` is the 1-based line
/// number; errors carry it along with the column range inside `text`.
pub fn parse_line(text: &str, number: usize) -> Result<SourceLine, Diagnostic> {
    let mut pairs = LunaParser::parse(Rule::line, text)
        .map_err(|error| syntax_diagnostic(error, number, text))?;

    let line_pair = pairs.next().expect("the line rule produces one pair");
    AstBuilder::new(number, text).build_line(line_pair)
}

/// Turn a pest parse error into a positioned diagnostic with readable rule
/// names.
fn syntax_diagnostic(error: pest::error::Error<Rule>, number: usize, text: &str) -> Diagnostic {
    let error = error.renamed_rules(|rule| friendly_rule_name(*rule).to_string());

    let (lo, hi) = match error.line_col {
        LineColLocation::Pos((_, col)) => (col, col + 1),
        LineColLocation::Span((_, lo), (_, hi)) => (lo, hi),
    };

    Diagnostic::new(error.variant.message(), number, lo, hi, text)
}

fn friendly_rule_name(rule: Rule) -> &'static str {
    match rule {
        Rule::line => "line",
        Rule::label => "label",
        Rule::statement => "instruction or directive",
        Rule::instruction => "instruction",
        Rule::size_suffix => "length modifier",
        Rule::operand_list | Rule::operand => "operand",
        Rule::indirect => "indirect operand",
        Rule::ind_term | Rule::scaled_term => "indirect term",
        Rule::register | Rule::reg_num => "register",
        Rule::number | Rule::hex_num | Rule::bin_num | Rule::oct_num | Rule::dec_num => "number",
        Rule::char_lit | Rule::char_inner => "character literal",
        Rule::string | Rule::string_inner => "string literal",
        Rule::directive => "directive",
        Rule::byte_val => "numeric or character literal",
        Rule::word_val => "number or identifier",
        Rule::kw_ds | Rule::ds_dir => "`ds`",
        Rule::kw_db | Rule::db_dir => "`db`",
        Rule::kw_dh | Rule::dh_dir => "`dh`",
        Rule::kw_dw | Rule::dw_dir => "`dw`",
        Rule::ident | Rule::ident_start | Rule::ident_char => "identifier",
        Rule::EOI => "end of line",
        Rule::WHITESPACE | Rule::COMMENT => "whitespace",
    }
}

// ------------- unit tests -------------
