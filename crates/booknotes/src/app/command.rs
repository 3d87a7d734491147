//! Interactive session commands.
//!
//! Users type 1-based quote numbers; parsed commands carry 0-based store indices.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::model::{CalloutParseError, CalloutType};

/// Which quotes a callout change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutTarget {
    One(usize),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the loaded document with another file.
    Open(PathBuf),
    Parse,
    List,
    Show(usize),
    Select(Vec<usize>),
    Unselect,
    Delete(usize),
    Highlight { index: usize, text: String },
    Notes { index: usize, text: String },
    Callout { target: CalloutTarget, callout: CalloutType },
    Edit(usize),
    /// Merge the listed quotes, or the current selection when empty.
    Merge(Vec<usize>),
    Generate,
    Save,
    Copy,
    Write(Option<PathBuf>),
    Status,
    Restore,
    Clear,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{0}' needs a quote number")]
    MissingIndex(&'static str),
    #[error("'{0}' is not a quote number; quotes are numbered from 1")]
    InvalidIndex(String),
    #[error("'{0}' needs text after the quote number")]
    MissingText(&'static str),
    #[error("'{0}' needs a file path")]
    MissingPath(&'static str),
    #[error("'callout' needs a quote number (or 'all') and a type")]
    MissingCallout,
    #[error(transparent)]
    Callout(#[from] CalloutParseError),
}

pub const HELP: &str = "\
Commands (quotes are numbered from 1):
  open PATH             load another document (run 'parse' next)
  parse                 parse the loaded document
  list                  list quotes
  show N                show one quote in full
  select N [M ...]      toggle selection
  unselect              clear the selection
  delete N              delete a quote
  highlight N TEXT      replace the highlight text
  notes N TEXT          replace the notes (\\n starts a new line)
  callout N|all TYPE    change the callout type
  edit N                edit a quote in $EDITOR
  merge [N M ...]       merge quotes (defaults to the selection)
  generate              print the converted Markdown
  save                  save the document with progress back to its file
  copy                  copy the converted Markdown to the clipboard
  write [PATH]          write the converted Markdown to a file
  status                show saved progress and counts
  restore               re-apply saved progress
  clear                 discard the document and quotes
  help                  show this help
  quit                  leave the session";

impl Command {
    /// Parse one input line of the form `verb [args]`.
    pub fn parse(line: &str) -> Result<Self, CommandParseError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "open" | "load" if rest.is_empty() => {
                return Err(CommandParseError::MissingPath("open"));
            }
            "open" | "load" => Command::Open(PathBuf::from(rest)),
            "parse" => Command::Parse,
            "list" | "ls" => Command::List,
            "show" => Command::Show(single_index("show", rest)?),
            "select" => Command::Select(index_list("select", rest)?),
            "unselect" => Command::Unselect,
            "delete" | "rm" => Command::Delete(single_index("delete", rest)?),
            "highlight" => {
                let (index, text) = index_and_text("highlight", rest)?;
                Command::Highlight { index, text }
            }
            "notes" => {
                let (index, text) = index_and_text_allow_empty("notes", rest)?;
                Command::Notes {
                    index,
                    text: unescape_newlines(&text),
                }
            }
            "callout" => parse_callout(rest)?,
            "edit" => Command::Edit(single_index("edit", rest)?),
            "merge" => Command::Merge(if rest.is_empty() {
                Vec::new()
            } else {
                index_list("merge", rest)?
            }),
            "generate" | "convert" => Command::Generate,
            "save" => Command::Save,
            "copy" => Command::Copy,
            "write" => Command::Write((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "status" => Command::Status,
            "restore" => Command::Restore,
            "clear" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Convert a user-facing 1-based number into a store index.
pub fn parse_index(token: &str) -> Result<usize, CommandParseError> {
    match token.trim().parse::<usize>() {
        Ok(number) if number >= 1 => Ok(number - 1),
        _ => Err(CommandParseError::InvalidIndex(token.to_string())),
    }
}

fn single_index(verb: &'static str, rest: &str) -> Result<usize, CommandParseError> {
    let token = rest
        .split_whitespace()
        .next()
        .ok_or(CommandParseError::MissingIndex(verb))?;
    parse_index(token)
}

fn index_list(verb: &'static str, rest: &str) -> Result<Vec<usize>, CommandParseError> {
    let indices = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(parse_index)
        .collect::<Result<Vec<_>, _>>()?;
    if indices.is_empty() {
        return Err(CommandParseError::MissingIndex(verb));
    }
    Ok(indices)
}

fn index_and_text(verb: &'static str, rest: &str) -> Result<(usize, String), CommandParseError> {
    let (index, text) = index_and_text_allow_empty(verb, rest)?;
    if text.is_empty() {
        return Err(CommandParseError::MissingText(verb));
    }
    Ok((index, text))
}

fn index_and_text_allow_empty(
    verb: &'static str,
    rest: &str,
) -> Result<(usize, String), CommandParseError> {
    let (token, text) = match rest.split_once(char::is_whitespace) {
        Some((token, text)) => (token, text.trim()),
        None => (rest, ""),
    };
    if token.is_empty() {
        return Err(CommandParseError::MissingIndex(verb));
    }
    Ok((parse_index(token)?, text.to_string()))
}

fn parse_callout(rest: &str) -> Result<Command, CommandParseError> {
    let mut tokens = rest.split_whitespace();
    let (Some(target), Some(kind)) = (tokens.next(), tokens.next()) else {
        return Err(CommandParseError::MissingCallout);
    };
    let target = if target.eq_ignore_ascii_case("all") {
        CalloutTarget::All
    } else {
        CalloutTarget::One(parse_index(target)?)
    };
    Ok(Command::Callout {
        target,
        callout: kind.parse()?,
    })
}

fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}
