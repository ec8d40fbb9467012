//! Shell commands.
//!
//! This module defines the [`Command`] enum the interactive client understands and the
//! parser that turns a line of user input into one.
//!
//! # Overview
//!
//! - Dot commands (`.exit`, `.tables`, `.info <table>`) inspect the session.
//! - Everything else names a call: `read`, `write`, `delete`, `range`, `first`, `last`,
//!   `open`, `close`.
//!
//! Keys and columns are written as space separated `name=value` pairs. A `:` separates the
//! key from the columns in `write`, and the start key from the end key in `range`. Values
//! parse as integers, floats, `true`/`false`, `null` or, failing all of those, strings;
//! double quotes force a string.
//!
//! # Example
//! ```rust
//! use pundun::{Command, fields};
//!
//! let cmd: Command = "write users id=1 : name=bob age=42".try_into().unwrap();
//! assert_eq!(
//!     cmd,
//!     Command::Write {
//!         table: "users".into(),
//!         key: fields! { "id" => 1 },
//!         columns: fields! { "name" => "bob", "age" => 42 },
//!     }
//! );
//! ```
use thiserror::Error;

use crate::value::{Fields, Value};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized command '{0}'")]
    UnrecognizedCommand(String),

    #[error("invalid '{command}' command, {reason}")]
    InvalidCommandArguments { command: String, reason: String },

    #[error("no command provided")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Close the session and leave the shell.
    Exit,
    Tables,
    Info { table: String },
    Open { table: String },
    Close { table: String },
    Read { table: String, key: Fields },
    Write {
        table: String,
        key: Fields,
        columns: Fields,
    },
    Delete { table: String, key: Fields },
    Range {
        table: String,
        start: Fields,
        end: Fields,
        limit: u32,
    },
    First { table: String },
    Last { table: String },
}

impl TryFrom<&str> for Command {
    type Error = CommandError;

    fn try_from(line: &str) -> Result<Command, Self::Error> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args = words.collect::<Vec<&str>>();

        let invalid = |reason: &str| CommandError::InvalidCommandArguments {
            command: name.to_string(),
            reason: reason.to_string(),
        };
        let table = |args: &[&str]| -> Result<String, CommandError> {
            args.first()
                .map(|t| t.to_string())
                .ok_or_else(|| invalid("requires a table name"))
        };

        match name {
            ".exit" => Ok(Command::Exit),
            ".tables" => Ok(Command::Tables),
            ".info" => Ok(Command::Info { table: table(&args)? }),
            "open" => Ok(Command::Open { table: table(&args)? }),
            "close" => Ok(Command::Close { table: table(&args)? }),
            "first" => Ok(Command::First { table: table(&args)? }),
            "last" => Ok(Command::Last { table: table(&args)? }),
            "read" | "delete" => {
                let table = table(&args)?;
                let key = parse_fields(&args[1..]).map_err(|e| invalid(&e))?;
                if key.is_empty() {
                    return Err(invalid("requires a key. Example: read users id=1"));
                }
                if name == "read" {
                    Ok(Command::Read { table, key })
                } else {
                    Ok(Command::Delete { table, key })
                }
            }
            "write" => {
                let table = table(&args)?;
                let (key, columns) = split_on_colon(&args[1..]).ok_or_else(|| {
                    invalid("requires key and columns. Example: write users id=1 : name=bob")
                })?;
                let key = parse_fields(key).map_err(|e| invalid(&e))?;
                let columns = parse_fields(columns).map_err(|e| invalid(&e))?;
                if key.is_empty() {
                    return Err(invalid("requires a key"));
                }
                Ok(Command::Write {
                    table,
                    key,
                    columns,
                })
            }
            "range" => {
                let table = table(&args)?;
                let limit = args
                    .get(1)
                    .and_then(|l| l.parse::<u32>().ok())
                    .ok_or_else(|| {
                        invalid("requires a limit. Example: range users 10 id=1 : id=100")
                    })?;
                let (start, end) = split_on_colon(&args[2..])
                    .ok_or_else(|| invalid("requires start and end keys separated by ':'"))?;
                Ok(Command::Range {
                    table,
                    start: parse_fields(start).map_err(|e| invalid(&e))?,
                    end: parse_fields(end).map_err(|e| invalid(&e))?,
                    limit,
                })
            }
            other => Err(CommandError::UnrecognizedCommand(other.to_string())),
        }
    }
}

impl TryFrom<String> for Command {
    type Error = CommandError;

    fn try_from(line: String) -> Result<Command, Self::Error> {
        Command::try_from(line.as_str())
    }
}

fn split_on_colon<'a, 'b>(args: &'b [&'a str]) -> Option<(&'b [&'a str], &'b [&'a str])> {
    let at = args.iter().position(|a| *a == ":")?;
    Some((&args[..at], &args[at + 1..]))
}

fn parse_fields(pairs: &[&str]) -> Result<Fields, String> {
    pairs
        .iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected name=value, got '{pair}'"))?;
            if name.is_empty() {
                return Err(format!("missing field name in '{pair}'"));
            }
            Ok((name.to_string(), parse_value(value)))
        })
        .collect()
}

/// Best-effort typed value from shell input.
pub fn parse_value(raw: &str) -> Value {
    if let Some(quoted) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return Value::String(quoted.to_string());
    }
    match raw {
        "null" => Value::Null,
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::Int(i)
            } else if let Ok(d) = raw.parse::<f64>() {
                Value::Double(d)
            } else {
                Value::String(raw.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn command_from_string() {
        let inputs = vec![
            (".exit", Command::Exit),
            (".tables", Command::Tables),
            (
                ".info users",
                Command::Info {
                    table: "users".into(),
                },
            ),
            (
                "read users id=7",
                Command::Read {
                    table: "users".into(),
                    key: fields! { "id" => 7 },
                },
            ),
            (
                "range users 10 id=1 : id=100",
                Command::Range {
                    table: "users".into(),
                    start: fields! { "id" => 1 },
                    end: fields! { "id" => 100 },
                    limit: 10,
                },
            ),
            (
                "first  users ",
                Command::First {
                    table: "users".into(),
                },
            ),
        ];

        for (cmd, expected) in inputs {
            let command: Command = cmd.try_into().unwrap();
            assert_eq!(command, expected);
        }
    }

    #[test]
    fn values_parse_by_shape() {
        assert_eq!(parse_value("42"), Value::Int(42));
        assert_eq!(parse_value("-1.5"), Value::Double(-1.5));
        assert_eq!(parse_value("true"), Value::Boolean(true));
        assert_eq!(parse_value("null"), Value::Null);
        assert_eq!(parse_value("\"42\""), Value::String("42".into()));
        assert_eq!(parse_value("bob"), Value::String("bob".into()));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Command::try_from("   "), Err(CommandError::Empty));
        assert_eq!(
            Command::try_from(".bogus"),
            Err(CommandError::UnrecognizedCommand(".bogus".into()))
        );
        assert!(matches!(
            Command::try_from("read users"),
            Err(CommandError::InvalidCommandArguments { .. })
        ));
        assert!(matches!(
            Command::try_from("write users id=1 name=bob"),
            Err(CommandError::InvalidCommandArguments { .. })
        ));
        assert!(matches!(
            Command::try_from("read users id"),
            Err(CommandError::InvalidCommandArguments { .. })
        ));
    }
}
