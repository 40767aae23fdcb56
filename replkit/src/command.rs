//! The command tree: named commands with aliases, flags and sub-commands.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::flags::Flags;

/// Custom completion hook: `(prefix, unresolved words) -> candidates`.
pub type CompleterFn = dyn Fn(&str, &[String]) -> Vec<String> + Send + Sync + 'static;

pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub flags: Flags,
    pub commands: Commands,
    completer: Option<Arc<CompleterFn>>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("help", &self.help)
            .field("flags", &self.flags)
            .field("commands", &self.commands)
            .field("completer", &self.completer.is_some())
            .finish()
    }
}

impl Command {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            help: help.to_string(),
            flags: Flags::new(),
            commands: Commands::new(),
            completer: None,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    #[must_use]
    pub fn with_completer<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &[String]) -> Vec<String> + Send + Sync + 'static,
    {
        self.completer = Some(Arc::new(f));
        self
    }

    pub fn set_completer(&mut self, f: Arc<CompleterFn>) {
        self.completer = Some(f);
    }

    #[must_use]
    pub fn completer(&self) -> Option<&CompleterFn> {
        self.completer.as_deref()
    }

    /// Adds a sub-command.
    ///
    /// # Errors
    ///
    /// Name collisions, see [`Commands::add`].
    pub fn add_command(&mut self, cmd: Command) -> Result<()> {
        self.commands.add(cmd)
    }

    fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.iter().any(|a| a == word)
    }

    /// Manual-style help for this command.
    #[must_use]
    pub fn help_text(&self) -> String {
        let mut out = if self.help.is_empty() {
            format!("{}\n", self.name)
        } else {
            format!("{} - {}\n", self.name, self.help)
        };
        if !self.aliases.is_empty() {
            out.push_str(&format!("\nALIASES:\n  {}\n", self.aliases.join(", ")));
        }
        if !self.commands.is_empty() {
            out.push_str("\nCOMMANDS:\n");
            push_table(&mut out, &self.commands.help_rows());
        }
        if !self.flags.is_empty() {
            out.push_str("\nFLAGS:\n");
            push_table(&mut out, &self.flags.help_lines());
        }
        out
    }
}

fn push_table(out: &mut String, rows: &[(String, String)]) {
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (left, right) in rows {
        out.push_str(&format!("  {:<width$}  {}\n", left, right, width = width));
    }
}

/// Sibling commands at one level of the tree.
#[derive(Debug, Default)]
pub struct Commands {
    list: Vec<Command>,
}

impl Commands {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command.
    ///
    /// # Errors
    ///
    /// `Error::Config` for an empty or spaced name, or a name/alias that is
    /// already taken by a sibling.
    pub fn add(&mut self, cmd: Command) -> Result<()> {
        if cmd.name.is_empty() || cmd.name.contains(char::is_whitespace) {
            return Err(Error::Config(format!("invalid command name: '{}'", cmd.name)));
        }
        for word in std::iter::once(&cmd.name).chain(cmd.aliases.iter()) {
            if let Some(other) = self.list.iter().find(|c| c.matches(word)) {
                return Err(Error::Config(format!(
                    "command '{}': name '{}' already used by '{}'",
                    cmd.name, word, other.name
                )));
            }
        }
        self.list.push(cmd);
        Ok(())
    }

    /// Looks up one word: exact name or alias first, then a unique name prefix.
    ///
    /// # Errors
    ///
    /// `Error::AmbiguousCommand` when the word prefixes several names.
    pub fn get(&self, word: &str) -> Result<Option<&Command>> {
        if let Some(cmd) = self.list.iter().find(|c| c.matches(word)) {
            return Ok(Some(cmd));
        }
        if word.is_empty() {
            return Ok(None);
        }
        let mut found: Option<&Command> = None;
        for cmd in self.list.iter().filter(|c| c.name.starts_with(word)) {
            if let Some(first) = found {
                return Err(Error::AmbiguousCommand {
                    word: word.to_string(),
                    first: first.name.clone(),
                    second: cmd.name.clone(),
                });
            }
            found = Some(cmd);
        }
        Ok(found)
    }

    /// Descends while words name commands. Returns the deepest command reached
    /// (`None` if the first word names nothing) and the words left over.
    ///
    /// # Errors
    ///
    /// `Error::AmbiguousCommand` from [`Commands::get`].
    pub fn find_command(&self, words: &[String]) -> Result<(Option<&Command>, Vec<String>)> {
        let mut cmds = self;
        let mut cmd = None;
        let mut rest = words;
        while let Some((word, tail)) = rest.split_first() {
            let Some(next) = cmds.get(word)? else {
                break;
            };
            cmd = Some(next);
            cmds = &next.commands;
            rest = tail;
        }
        Ok((cmd, rest.to_vec()))
    }

    /// Sorts commands by name and flags by long name, all the way down.
    pub fn sort(&mut self) {
        self.list.sort_by(|a, b| a.name.cmp(&b.name));
        for cmd in &mut self.list {
            cmd.flags.sort();
            cmd.commands.sort();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.list.iter()
    }

    /// `(name, help)` rows for listing.
    #[must_use]
    pub fn help_rows(&self) -> Vec<(String, String)> {
        self.list
            .iter()
            .map(|c| (c.name.clone(), c.help.clone()))
            .collect()
    }
}
