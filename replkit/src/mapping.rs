use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::command::{Command, Commands, CompleterFn};
use crate::flags::FlagSpec;
use crate::value::FlagKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingRoot {
    /// Flags shared by name; commands opt in via `common_flags`.
    #[serde(default)]
    pub common_flags: HashMap<String, FlagDecl>,
    pub commands: Vec<CommandSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// One-line description for help listings.
    #[serde(default)]
    pub help: Option<String>,
    /// Name of a custom completer in the `CompleterRegistry`
    #[serde(default)]
    pub completer: Option<String>,
    #[serde(default)]
    pub flags: Vec<FlagDecl>,
    /// Keys of `MappingRoot::common_flags` to add to this command
    #[serde(default)]
    pub common_flags: Vec<String>,
    #[serde(default)]
    pub subcommands: Vec<CommandSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagDecl {
    pub long: String,
    #[serde(default)]
    pub short: Option<String>,
    #[serde(default = "default_kind", rename = "type")]
    pub kind: FlagKind,
    /// Default value in textual form; numbers and booleans are accepted too
    #[serde(default)]
    pub default: Option<serde_yaml::Value>,
    #[serde(default)]
    pub help: String,
    /// Overrides the placeholder shown after the name in help output
    #[serde(default)]
    pub help_args: Option<String>,
}

fn default_kind() -> FlagKind {
    FlagKind::String
}

impl FlagDecl {
    /// Turns the declaration into a registrable flag, coercing the default
    /// with the same rules the parser applies to typed input.
    pub fn to_spec(&self) -> Result<FlagSpec> {
        let default = match &self.default {
            None => self.kind.zero_value(),
            Some(value) => {
                let text = scalar_text(value).ok_or_else(|| {
                    anyhow!("default for flag '{}' must be a scalar", self.long)
                })?;
                self.kind
                    .parse_value(&self.long, &text)
                    .with_context(|| format!("Invalid default for flag '{}'", self.long))?
            }
        };
        let mut spec = FlagSpec::new(
            self.kind,
            self.short.as_deref().unwrap_or(""),
            &self.long,
            default,
            &self.help,
        );
        if let Some(args) = &self.help_args {
            spec.help_args = args.clone();
        }
        Ok(spec)
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Load a command mapping from a YAML string.
pub fn parse_mapping(yaml: &str) -> Result<MappingRoot> {
    let root: MappingRoot = serde_yaml::from_str(yaml).context("Failed to parse command mapping")?;
    Ok(root)
}

// =====================
// Custom completers
// =====================

#[derive(Default)]
pub struct CompleterRegistry {
    completers: HashMap<String, Arc<CompleterFn>>,
}

impl CompleterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&str, &[String]) -> Vec<String> + Send + Sync + 'static,
    {
        self.completers.insert(name.to_string(), Arc::new(f));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<CompleterFn>> {
        self.completers.get(name).cloned()
    }
}

/// Reports every completer named in the mapping that is not registered.
pub fn validate_completers(root: &MappingRoot, registry: &CompleterRegistry) -> Result<()> {
    fn walk(cmd: &CommandSpec, reg: &CompleterRegistry, acc: &mut Vec<String>) {
        if let Some(name) = &cmd.completer {
            if reg.get(name).is_none() {
                acc.push(name.clone());
            }
        }
        for sub in &cmd.subcommands {
            walk(sub, reg, acc);
        }
    }

    let mut missing: Vec<String> = Vec::new();
    for cmd in &root.commands {
        walk(cmd, registry, &mut missing);
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            "Missing custom completers: {}",
            missing.join(", ")
        ))
    }
}

// =====================
// Tree construction
// =====================

/// Builds the command tree described by `root`.
pub fn build_commands(root: &MappingRoot, registry: &CompleterRegistry) -> Result<Commands> {
    let mut commands = Commands::new();
    for spec in &root.commands {
        let cmd = build_command(root, registry, spec, &mut Vec::new())?;
        commands.add(cmd).context("Invalid command mapping")?;
    }
    Ok(commands)
}

fn build_command(
    root: &MappingRoot,
    registry: &CompleterRegistry,
    spec: &CommandSpec,
    path: &mut Vec<String>,
) -> Result<Command> {
    path.push(spec.name.clone());
    let path_str = path.join(" ");

    let mut cmd = Command::new(&spec.name, spec.help.as_deref().unwrap_or(""));
    cmd.aliases = spec.aliases.clone();

    let mut decls: Vec<&FlagDecl> = spec.flags.iter().collect();
    for key in &spec.common_flags {
        let Some(decl) = root.common_flags.get(key) else {
            bail!("Command '{}' uses unknown common flag '{}'", path_str, key);
        };
        decls.push(decl);
    }
    for decl in decls {
        let flag = decl
            .to_spec()
            .with_context(|| format!("Command '{}'", path_str))?;
        cmd.flags
            .try_register(flag)
            .with_context(|| format!("Command '{}'", path_str))?;
    }

    if let Some(name) = &spec.completer {
        let f = registry
            .get(name)
            .ok_or_else(|| anyhow!("No completer registered for {}", name))?;
        cmd.set_completer(f);
    }

    for sub in &spec.subcommands {
        let child = build_command(root, registry, sub, path)?;
        cmd.add_command(child)
            .with_context(|| format!("Command '{}'", path_str))?;
    }

    path.pop();
    Ok(cmd)
}

/// Parses, validates and builds in one step.
pub fn load_commands(yaml: &str, registry: &CompleterRegistry) -> Result<Commands> {
    let root = parse_mapping(yaml)?;
    validate_completers(&root, registry)?;
    build_commands(&root, registry)
}
