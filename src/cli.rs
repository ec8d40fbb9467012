//! Interactive shell helpers.
//!
//! The utilities in this module drive the `pundun-cli` binary: read a [`Command`], run it
//! against a [`Session`] and print the outcome.
use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::{
    command::{Command, CommandError},
    error::Error,
    ops::{Cursor, KeyColumns},
    session::Session,
    value::{Fields, Value},
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("terminal io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Prompt the user for one command. End of input reads as [`Command::Exit`].
pub fn prompt<R, W>(mut reader: R, mut writer: W) -> Result<Command, CliError>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::default();
    write!(&mut writer, "> ")?;
    writer.flush()?;

    if reader.read_line(&mut line)? == 0 {
        return Ok(Command::Exit);
    }
    Ok(Command::try_from(line.trim_end())?)
}

/// Run `command` and print its result. Returns `false` once the shell should stop.
pub fn execute<W: Write>(session: &Session, command: Command, out: &mut W) -> Result<bool, Error> {
    match command {
        Command::Exit => return Ok(false),
        Command::Tables => {
            for table in session.list_tables()? {
                writeln!(out, "{table}")?;
            }
        }
        Command::Info { table } => {
            for (name, value) in session.table_info(&table, &[])? {
                writeln!(out, "{name}: {value}")?;
            }
        }
        Command::Open { table } => {
            session.open_table(&table)?;
            writeln!(out, "ok")?;
        }
        Command::Close { table } => {
            session.close_table(&table)?;
            writeln!(out, "ok")?;
        }
        Command::Read { table, key } => {
            let columns = session.read(&table, key)?;
            writeln!(out, "{}", show_fields(columns))?;
        }
        Command::Write {
            table,
            key,
            columns,
        } => {
            session.write(&table, key, columns)?;
            writeln!(out, "ok")?;
        }
        Command::Delete { table, key } => {
            session.delete(&table, key)?;
            writeln!(out, "ok")?;
        }
        Command::Range {
            table,
            start,
            end,
            limit,
        } => {
            let page = session.read_range(&table, start, end, limit)?;
            for entry in page.entries {
                writeln!(out, "{}", show_row(entry))?;
            }
            if let Some(next) = page.continuation {
                writeln!(out, "... continues at {}", show_fields(next))?;
            }
        }
        Command::First { table } => {
            let cursor = session.first(&table)?;
            writeln!(out, "{}", show_cursor(cursor))?;
        }
        Command::Last { table } => {
            let cursor = session.last(&table)?;
            writeln!(out, "{}", show_cursor(cursor))?;
        }
    }
    Ok(true)
}

fn show_fields(fields: Fields) -> String {
    Value::Map(fields).to_string()
}

fn show_row(row: KeyColumns) -> String {
    format!("{} => {}", show_fields(row.key), show_fields(row.columns))
}

fn show_cursor(cursor: Cursor) -> String {
    show_row(cursor.entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_prints_correctly() {
        let input = b".exit\n";
        let mut output = Vec::new();

        prompt(&input[..], &mut output).unwrap();

        let output = String::from_utf8(output).expect("not valid UTF-8");
        assert_eq!("> ", output);
    }

    #[test]
    fn prompt_parses_calls() {
        let input = b"first users\n";
        let mut output = Vec::new();

        let res = prompt(&input[..], &mut output).unwrap();
        assert_eq!(
            Command::First {
                table: "users".into()
            },
            res
        );
    }

    #[test]
    fn end_of_input_exits() {
        let mut output = Vec::new();
        let res = prompt(&b""[..], &mut output).unwrap();
        assert_eq!(Command::Exit, res);
    }

    #[test]
    fn prompt_unrecognized_command() {
        let input = b".something_wrong\n";
        let mut output = Vec::new();

        let err = prompt(&input[..], &mut output).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized command '.something_wrong'");
    }

    #[test]
    fn rows_render_as_maps() {
        let row = KeyColumns {
            key: crate::fields! { "id" => 1 },
            columns: crate::fields! { "name" => "bob" },
        };
        assert_eq!(show_row(row), "{id: 1} => {name: \"bob\"}");
    }
}
