//! Flag parsing and tab completion for hierarchical REPL command trees.
//!
//! A [`Commands`] tree holds named commands, each owning a [`Flags`] registry.
//! [`Flags::parse`] turns tokens into a [`FlagMap`] plus positional leftovers;
//! [`Completer::complete`] turns a partial line into suggestions.

use serde::Serialize;
use tracing::debug;

pub mod command;
pub mod completer;
pub mod duration;
pub mod error;
pub mod flags;
pub mod ipmask;
pub mod mapping;
pub mod value;

pub use command::{Command, Commands, CompleterFn};
pub use completer::{split_words, Completer};
pub use error::{Error, Result};
pub use flags::{FlagMap, FlagMapItem, FlagSpec, Flags};
pub use ipmask::IpAndMask;
pub use value::{FlagKind, FlagValue, FromFlagValue};

// =====================
// Public API
// =====================

/// A fully parsed input line.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    /// Canonical names of the commands walked, root first.
    pub path: Vec<String>,
    pub flags: FlagMap,
    pub args: Vec<String>,
}

/// Resolves the leading words against `commands`, then parses the remaining
/// words with the resolved command's flags.
///
/// # Errors
///
/// `Error::UnknownCommand` when the first word names no command, plus any
/// error from command lookup or flag parsing.
pub fn parse_words(commands: &Commands, words: &[String]) -> Result<Invocation> {
    let mut path = Vec::new();
    let mut level = commands;
    let mut current = None;
    let mut rest = words;
    while let Some((word, tail)) = rest.split_first() {
        let Some(cmd) = level.get(word)? else {
            break;
        };
        path.push(cmd.name.clone());
        current = Some(cmd);
        level = &cmd.commands;
        rest = tail;
    }

    let Some(cmd) = current else {
        return Err(Error::UnknownCommand(
            words.first().cloned().unwrap_or_default(),
        ));
    };
    debug!(command = %path.join(" "), "resolved command");

    let (flags, args) = cmd.flags.parse_new(rest)?;
    Ok(Invocation { path, flags, args })
}

/// [`parse_words`] on a raw line split with [`split_words`].
///
/// # Errors
///
/// Same as [`parse_words`].
pub fn parse_line(commands: &Commands, line: &str) -> Result<Invocation> {
    parse_words(commands, &split_words(line))
}
