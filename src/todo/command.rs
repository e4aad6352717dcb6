//! Line commands understood by the to-do sample.
//!
//! ```text
//! list add <title>
//! list remove <list>
//! todo add <list> <text>
//! todo remove <list> <todo>
//! show
//! ```
//!
//! `<list>` and `<todo>` are either an id or a 1-based position written `#n`.
//! Blank lines and lines starting with `//` are ignored.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid position '{0}', positions start at #1")]
    InvalidPosition(String),
}

/// Names a list or a todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Id(String),
    /// 1-based position.
    Position(usize),
}

impl FromStr for ItemRef {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('#') {
            Some(position) => match position.parse::<usize>() {
                Ok(n) if n > 0 => Ok(ItemRef::Position(n)),
                _ => Err(CommandError::InvalidPosition(s.to_string())),
            },
            None => Ok(ItemRef::Id(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddList { title: String },
    RemoveList { list: ItemRef },
    AddTodo { list: ItemRef, text: String },
    RemoveTodo { list: ItemRef, todo: ItemRef },
    Show,
}

const LIST_ADD: &str = "list add <title>";
const LIST_REMOVE: &str = "list remove <list>";
const TODO_ADD: &str = "todo add <list> <text>";
const TODO_REMOVE: &str = "todo remove <list> <todo>";

/// Parses one line. `Ok(None)` for lines that carry no command.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return Ok(None);
    }

    let (verb, rest) = split_word(line);
    let command = match verb {
        "show" => Command::Show,
        "list" => {
            let (action, rest) = split_word(rest);
            match action {
                "add" if !rest.is_empty() => Command::AddList {
                    title: rest.to_string(),
                },
                "add" => return Err(CommandError::Usage(LIST_ADD)),
                "remove" => match split_word(rest) {
                    (list, "") if !list.is_empty() => Command::RemoveList { list: list.parse()? },
                    _ => return Err(CommandError::Usage(LIST_REMOVE)),
                },
                _ => return Err(CommandError::Unknown(line.to_string())),
            }
        }
        "todo" => {
            let (action, rest) = split_word(rest);
            let (list, rest) = split_word(rest);
            match action {
                "add" if !list.is_empty() && !rest.is_empty() => Command::AddTodo {
                    list: list.parse()?,
                    text: rest.to_string(),
                },
                "add" => return Err(CommandError::Usage(TODO_ADD)),
                "remove" => match split_word(rest) {
                    (todo, "") if !list.is_empty() && !todo.is_empty() => Command::RemoveTodo {
                        list: list.parse()?,
                        todo: todo.parse()?,
                    },
                    _ => return Err(CommandError::Usage(TODO_REMOVE)),
                },
                _ => return Err(CommandError::Unknown(line.to_string())),
            }
        }
        _ => return Err(CommandError::Unknown(line.to_string())),
    };
    Ok(Some(command))
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}
