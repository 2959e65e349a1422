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

//! `lunasm` assembles Luna-32 assembly source into a flat binary: one
//! forward pass emits machine code and records forward label references, a
//! resolution step patches them, and the bytes come back only when the whole
//! source assembled cleanly.

pub mod assembler;
pub mod ast;
pub mod errors;
pub mod limits;
pub mod parser;
pub mod registers;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub use errors::{AssemblyFailure, Diagnostic};

/// Assemble a full source text. On failure the returned value carries every
/// diagnostic of the run, in source order, and no bytes exist.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblyFailure> {
    assembler::Assembler::new().run(source)
}

/// Assemble the file at `path`. Diagnostics are rendered against the file
/// name into the error.
pub fn assemble_file(path: &Path) -> Result<Vec<u8>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))?;

    let name = path.display().to_string();
    assemble(&source).map_err(|failure| anyhow::anyhow!("{}\n{}", failure.render(&name), failure))
}
