//! Tab completion over a command tree.

use tracing::{debug, trace};

use crate::command::Commands;
use crate::flags::Flags;

pub const DEFAULT_HELP_KEYWORD: &str = "help";
pub const DEFAULT_NEGATION_KEYWORD: &str = "no";

/// Produces completion candidates for a partially typed line.
///
/// Holds no state between calls; every request is answered from the tree and
/// the line alone.
pub struct Completer<'a> {
    commands: &'a Commands,
    help_keyword: String,
    negation_keyword: String,
}

impl<'a> Completer<'a> {
    #[must_use]
    pub fn new(commands: &'a Commands) -> Self {
        Self {
            commands,
            help_keyword: DEFAULT_HELP_KEYWORD.to_string(),
            negation_keyword: DEFAULT_NEGATION_KEYWORD.to_string(),
        }
    }

    #[must_use]
    pub fn with_help_keyword(mut self, keyword: &str) -> Self {
        self.help_keyword = keyword.to_string();
        self
    }

    #[must_use]
    pub fn with_negation_keyword(mut self, keyword: &str) -> Self {
        self.negation_keyword = keyword.to_string();
        self
    }

    /// Returns the suggestions for `line` with the cursor at character `pos`,
    /// and how many characters before the cursor they replace.
    ///
    /// Suggestions carry the untyped remainder of each candidate plus one
    /// trailing space. Output of a command's custom completer is passed on
    /// with only the prefix removed.
    #[must_use]
    pub fn complete(&self, line: &str, pos: usize) -> (Vec<String>, usize) {
        let before: String = line.chars().take(pos).collect();
        let mut words = split_words(&before);

        let mut prefix = String::new();
        if !before.ends_with(' ') {
            if let Some(last) = words.pop() {
                prefix = last;
            }
        }
        let prefix_len = prefix.chars().count();

        if words.first() == Some(&self.help_keyword) {
            words.remove(0);
        }
        if words.first() == Some(&self.negation_keyword) {
            words.remove(0);
        }

        let (cmds, flags): (&Commands, Option<&Flags>) = if words.is_empty() {
            (self.commands, None)
        } else {
            let (cmd, rest) = match self.commands.find_command(&words) {
                Ok((Some(cmd), rest)) => (cmd, rest),
                _ => return (Vec::new(), 0),
            };

            if let Some(custom) = cmd.completer() {
                let suggestions = custom(&prefix, &rest)
                    .into_iter()
                    .map(|w| match w.strip_prefix(prefix.as_str()) {
                        Some(tail) => tail.to_string(),
                        None => w,
                    })
                    .collect();
                return (suggestions, prefix_len);
            }

            if !rest.is_empty() {
                return (Vec::new(), 0);
            }
            (&cmd.commands, Some(&cmd.flags))
        };

        let mut suggestions = if prefix.is_empty() {
            self.all_candidates(cmds, flags, &words)
        } else {
            self.prefixed_candidates(cmds, flags, &prefix)
        };

        let mut seen = std::collections::HashSet::new();
        suggestions.retain(|s| seen.insert(s.clone()));
        for s in &mut suggestions {
            s.push(' ');
        }
        trace!(count = suggestions.len(), prefix = prefix.as_str(), "completion");
        (suggestions, prefix_len)
    }

    fn prefixed_candidates(&self, cmds: &Commands, flags: Option<&Flags>, prefix: &str) -> Vec<String> {
        let mut out = Vec::new();
        for cmd in cmds.iter() {
            for word in std::iter::once(&cmd.name).chain(cmd.aliases.iter()) {
                if let Some(tail) = word.strip_prefix(prefix) {
                    out.push(tail.to_string());
                }
            }
        }

        let Some(flags) = flags else {
            return out;
        };
        for f in flags.iter() {
            if f.short.len() > prefix.len() {
                if let Some(tail) = f.short.strip_prefix(prefix) {
                    out.push(tail.to_string());
                }
            }
            if f.long.len() > prefix.len() && f.long != self.negation_keyword {
                if let Some(tail) = f.long.strip_prefix(prefix) {
                    out.push(tail.to_string());
                }
            }
        }
        out
    }

    fn all_candidates(&self, cmds: &Commands, flags: Option<&Flags>, typed: &[String]) -> Vec<String> {
        let mut out: Vec<String> = cmds.iter().map(|c| c.name.clone()).collect();

        let Some(flags) = flags else {
            return out;
        };
        for f in flags.iter() {
            if f.long != self.negation_keyword && !typed.contains(&f.long) {
                out.push(f.long.clone());
            }
            if !f.short.is_empty() {
                out.push(f.short.clone());
            }
        }
        out
    }
}

/// Shell-style word splitting, falling back to plain whitespace splitting
/// when the quoting does not balance.
#[must_use]
pub fn split_words(line: &str) -> Vec<String> {
    shell_words::split(line).unwrap_or_else(|err| {
        debug!(%err, "unbalanced input, splitting on whitespace");
        line.split_whitespace().map(str::to_string).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    fn strs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn tree() -> Commands {
        let mut interface = Command::new("interface", "Configure an interface").alias("int");
        interface.flags.int('m', "mtu", 1500, "Maximum transmission unit");
        interface.flags.bool_l("no", false, "Negate");
        interface.flags.string_l("description", "", "Description");
        interface
            .add_command(Command::new("shutdown", "Disable the interface"))
            .unwrap();

        let ping = Command::new("ping", "Send echo requests").with_completer(|prefix, rest| {
            let mut out = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string(), "host".to_string()];
            out.retain(|c| c.starts_with(prefix));
            out.extend(rest.iter().map(|r| format!("seen-{r}")));
            out
        });

        let mut root = Commands::new();
        root.add(Command::new("status", "Status")).unwrap();
        root.add(Command::new("start", "Start")).unwrap();
        root.add(interface).unwrap();
        root.add(ping).unwrap();
        root
    }

    // ==================== root level tests ====================

    #[test]
    fn test_prefix_stripping_at_root() {
        let root = tree();
        let c = Completer::new(&root);
        let (s, len) = c.complete("st", 2);
        assert_eq!(sorted(s), strs(&["art ", "atus "]));
        assert_eq!(len, 2);
    }

    #[test]
    fn test_empty_line_lists_root_commands() {
        let root = tree();
        let (s, len) = Completer::new(&root).complete("", 0);
        assert_eq!(s, strs(&["status ", "start ", "interface ", "ping "]));
        assert_eq!(len, 0);
    }

    #[test]
    fn test_alias_matches_prefix() {
        let root = tree();
        let (s, _) = Completer::new(&root).complete("in", 2);
        assert_eq!(s, strs(&["terface ", "t "]));
    }

    #[test]
    fn test_cursor_in_middle_ignores_tail() {
        let root = tree();
        let (s, len) = Completer::new(&root).complete("st whatever", 2);
        assert_eq!(sorted(s), strs(&["art ", "atus "]));
        assert_eq!(len, 2);
    }

    // ==================== command level tests ====================

    #[test]
    fn test_empty_prefix_lists_subcommands_and_flags() {
        let root = tree();
        let line = "interface ";
        let (s, len) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&["shutdown ", "mtu ", "m ", "description "]));
        assert_eq!(len, 0);
    }

    #[test]
    fn test_empty_prefix_skips_flags_already_typed() {
        let mut mtu = Command::new("mtu", "Set the MTU");
        mtu.flags.int_l("mtu", 1500, "Maximum transmission unit");
        mtu.flags.bool_l("force", false, "Apply even if the link is up");
        let mut set = Command::new("set", "Set values");
        set.add_command(mtu).unwrap();
        let mut root = Commands::new();
        root.add(set).unwrap();

        let line = "set mtu ";
        let (s, _) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&["force "]));
    }

    #[test]
    fn test_prefix_matches_flags_and_subcommands() {
        let root = tree();
        let line = "interface s";
        let (s, len) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&["hutdown "]));
        assert_eq!(len, 1);

        let line = "interface m";
        let (s, _) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&["tu "]));
    }

    #[test]
    fn test_negation_flag_never_suggested() {
        let root = tree();
        let line = "interface n";
        let (s, _) = Completer::new(&root).complete(line, line.len());
        assert!(s.is_empty());
    }

    #[test]
    fn test_help_and_negation_words_are_skipped() {
        let root = tree();
        let line = "help interface s";
        let (s, _) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&["hutdown "]));

        let line = "no interface s";
        let (s, _) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&["hutdown "]));

        let line = "help no st";
        let (s, _) = Completer::new(&root).complete(line, line.len());
        assert_eq!(sorted(s), strs(&["art ", "atus "]));
    }

    #[test]
    fn test_custom_keywords() {
        let root = tree();
        let line = "? interface s";
        let (s, _) = Completer::new(&root)
            .with_help_keyword("?")
            .with_negation_keyword("undo")
            .complete(line, line.len());
        assert_eq!(s, strs(&["hutdown "]));
    }

    // ==================== failure tests ====================

    #[test]
    fn test_unknown_path_yields_nothing() {
        let root = tree();
        let line = "bogus ";
        assert_eq!(Completer::new(&root).complete(line, line.len()), (Vec::new(), 0));
    }

    #[test]
    fn test_ambiguous_path_yields_nothing() {
        let root = tree();
        let line = "st ";
        assert_eq!(Completer::new(&root).complete(line, line.len()), (Vec::new(), 0));
    }

    #[test]
    fn test_leftover_words_yield_nothing() {
        let root = tree();
        let line = "interface eth0 ";
        assert_eq!(Completer::new(&root).complete(line, line.len()), (Vec::new(), 0));
    }

    // ==================== custom completer tests ====================

    #[test]
    fn test_custom_completer_bypasses_defaults() {
        let root = tree();
        let line = "ping 10";
        let (s, len) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&[".0.0.1", ".0.0.2"]));
        assert_eq!(len, 2);
    }

    #[test]
    fn test_custom_completer_receives_rest_words() {
        let root = tree();
        let line = "ping count ";
        let (s, len) = Completer::new(&root).complete(line, line.len());
        assert_eq!(s, strs(&["10.0.0.1", "10.0.0.2", "host", "seen-count"]));
        assert_eq!(len, 0);
    }

    // ==================== tokenizer tests ====================

    #[test]
    fn test_split_words_quotes_and_fallback() {
        assert_eq!(split_words("a 'b c' d"), strs(&["a", "b c", "d"]));
        assert_eq!(split_words("a \"b c"), strs(&["a", "\"b", "c"]));
    }

    #[test]
    fn test_quoted_prefix_is_one_word() {
        let root = tree();
        let line = "ping \"ho";
        // Unbalanced quote falls back to whitespace words; the prefix keeps the quote.
        let (s, len) = Completer::new(&root).complete(line, line.len());
        assert!(s.is_empty());
        assert_eq!(len, 3);
    }
}
