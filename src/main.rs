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

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as clap_parser;
use lunasm::{assemble, assemble_file};

#[derive(clap_parser)]
#[clap(version = "0.1.0", author = "Connor Nolan")]
struct Opts {
    /// Output object file
    #[clap(short, long, default_value = "a.out")]
    output: PathBuf,
    /// Print a trace summary after assembling
    #[clap(short = 'D', long)]
    debug: bool,
    /// Input source file; standard input when omitted
    input: Option<PathBuf>,
}

fn main() -> ExitCode {
    let opts: Opts = Opts::parse();

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<()> {
    // Created up front so a failing run leaves an empty file, never stale or
    // partial bytes.
    fs::write(&opts.output, b"")
        .with_context(|| format!("failed to open output file: {}", opts.output.display()))?;

    let code = match &opts.input {
        Some(path) => assemble_file(path)?,
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read standard input")?;
            assemble(&source)
                .map_err(|failure| anyhow::anyhow!("{}\n{}", failure.render("(stdin)"), failure))?
        }
    };

    fs::write(&opts.output, &code)
        .with_context(|| format!("failed to write output file: {}", opts.output.display()))?;

    if opts.debug {
        eprintln!(
            "assembled {} byte(s) to {}",
            code.len(),
            opts.output.display()
        );
    }

    Ok(())
}
