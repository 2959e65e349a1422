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

//! Decoding of register names into register ids.
//!
//! Long registers are the 32-bit `r0`..`r15`, with `rr` (the return register,
//! id 14) and `rs` (the stack register, id 15) as aliases. Short registers are
//! the 8-bit sub-registers `r<n>a`..`r<n>d`, id `n * 4 + letter`.

/// A register operand as written in the source: its machine id and whether it
/// is one of the 8-bit sub-registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub id: u8,
    pub short: bool,
}

/// Get the corresponding register id for a register name the grammar already
/// validated. Names compare case-insensitively.
pub fn register_id(name: &str) -> Register {
    let lower = name.to_ascii_lowercase();

    // Move past the leading 'r'.
    let rest = &lower[1..];

    // Aliased registers first.
    match rest {
        "r" => return Register { id: 14, short: false },
        "s" => return Register { id: 15, short: false },
        _ => {}
    }

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let num: u8 = digits.parse().unwrap_or(0);

    match rest[digits.len()..].chars().next() {
        Some(letter @ 'a'..='d') => Register {
            id: num * 4 + (letter as u8 - b'a'),
            short: true,
        },
        _ => Register { id: num, short: false },
    }
}

/// Whether `name` would be read as a register rather than a plain identifier.
pub fn is_register_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let Some(rest) = lower.strip_prefix('r') else {
        return false;
    };

    if rest == "r" || rest == "s" {
        return true;
    }

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let Ok(num) = digits.parse::<u8>() else {
        return false;
    };
    if num > 15 {
        return false;
    }

    match &rest[digits.len()..] {
        "" => true,
        sub => matches!(sub, "a" | "b" | "c" | "d"),
    }
}
