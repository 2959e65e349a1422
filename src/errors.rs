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

use std::fmt::Write as _;

use colored::Colorize;
use thiserror::Error;

/// A single error found in the source. Columns are 1-based; `lo..hi` is the
/// half-open range of the offending text within `snippet`, the full source
/// line it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub lo: usize,
    pub hi: usize,
    pub snippet: String,
}

impl Diagnostic {
    pub fn new(
        message: impl Into<String>,
        line: usize,
        lo: usize,
        hi: usize,
        snippet: impl Into<String>,
    ) -> Self {
        let lo = lo.max(1);
        Diagnostic {
            message: message.into(),
            line,
            lo,
            hi: hi.max(lo + 1),
            snippet: snippet.into(),
        }
    }

    /// Render the diagnostic with its source snippet and a caret underline:
    ///
    /// ```text
    /// prog.asm (3:9) error: unresolved label `end`
    ///         jmp end
    ///             ^~~
    /// ```
    pub fn render(&self, source_name: &str) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{} {} {}",
            format!("{} ({}:{})", source_name, self.line, self.lo).bold(),
            "error:".red().bold(),
            self.message,
        );

        // Clamp the span to the snippet so a column past the end of the line
        // can never slice out of bounds.
        let bytes = self.snippet.as_bytes();
        let lo = (self.lo - 1).min(bytes.len());
        let hi = (self.hi - 1).clamp(lo, bytes.len());

        let _ = writeln!(
            out,
            "\t{}{}{}",
            String::from_utf8_lossy(&bytes[..lo]),
            String::from_utf8_lossy(&bytes[lo..hi]).yellow().bold(),
            String::from_utf8_lossy(&bytes[hi..]),
        );

        let underline = format!("^{}", "~".repeat(self.hi - self.lo - 1));
        let _ = write!(
            out,
            "\t{}{}",
            " ".repeat(self.lo - 1),
            underline.yellow().bold()
        );

        out
    }
}

/// The failure value of an `assemble` call: every diagnostic reported during
/// the run, in source order. No output bytes exist when this is returned.
#[derive(Error, Debug)]
#[error("assembly failed with {} error(s)", .diagnostics.len())]
pub struct AssemblyFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl AssemblyFailure {
    /// Render every diagnostic for printing to stderr.
    pub fn render(&self, source_name: &str) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(source_name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
