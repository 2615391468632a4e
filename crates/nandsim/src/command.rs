//! The line-oriented command protocol.
//!
//! ```text
//! get <output>
//! set <input> <value...>
//! exit
//! ```
//!
//! Keywords are case-insensitive and runs of whitespace are collapsed. A
//! `set` value may span several words; they are re-joined with single
//! spaces before reaching the input's decode rule.

use std::str::FromStr;

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { name: String },
    Set { name: String, value: String },
    Exit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = text.split_whitespace().collect();

        match parts.as_slice() {
            [keyword] if keyword.eq_ignore_ascii_case("exit") => Ok(Command::Exit),
            [keyword, name] if keyword.eq_ignore_ascii_case("get") => Ok(Command::Get {
                name: (*name).to_string(),
            }),
            [keyword, name, value @ ..]
                if keyword.eq_ignore_ascii_case("set") && !value.is_empty() =>
            {
                Ok(Command::Set {
                    name: (*name).to_string(),
                    value: value.join(" "),
                })
            }
            _ => Err(CommandError::BadCommand),
        }
    }
}
