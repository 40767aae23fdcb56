use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use replkit::mapping::{load_commands, CompleterRegistry};
use replkit::{parse_line, parse_words, Commands, Completer};
use tracing::{debug, info};

const EMBEDDED_MAPPING: &str = include_str!("mapping.yaml");

const INTERFACES: &[&str] = &["eth0", "eth1", "lo", "wlan0"];
const HOSTS: &[&str] = &["10.0.0.1", "10.0.0.254", "gateway", "localhost"];

#[derive(Parser, Debug)]
#[command(name = "replkit-demo", version, about = "Router-style shell driven by a command mapping")]
struct Args {
    /// Load the command tree from this YAML file instead of the built-in one
    #[arg(long, global = true)]
    mapping_file: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print completion suggestions for a partial line
    Complete {
        line: String,
        /// Cursor position in characters; defaults to the end of the line
        #[arg(long)]
        pos: Option<usize>,
    },
    /// Parse a command line and print the result as JSON
    Parse {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        words: Vec<String>,
    },
    /// Print help for a command path
    Help { path: Vec<String> },
    /// Read lines from stdin and parse each one
    Shell,
}

fn main() {
    if let Err(err) = real_main() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    let mapping_yaml = if let Some(path) = args.mapping_file.as_deref() {
        fs::read_to_string(path).with_context(|| format!("Failed to read mapping file: {}", path))?
    } else {
        EMBEDDED_MAPPING.to_string()
    };

    let mut reg = CompleterRegistry::new();
    reg.register("interfaces", |prefix, _rest| matching(INTERFACES, prefix));
    reg.register("hosts", |prefix, _rest| matching(HOSTS, prefix));

    let mut commands = load_commands(&mapping_yaml, &reg)?;
    commands.sort();
    info!(commands = commands.len(), "command tree loaded");

    match args.command {
        Cmd::Complete { line, pos } => {
            let pos = pos.unwrap_or_else(|| line.chars().count());
            let (suggestions, len) = Completer::new(&commands).complete(&line, pos);
            let out = serde_json::json!({ "suggestions": suggestions, "length": len });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Cmd::Parse { words } => {
            let inv = if words.len() == 1 {
                parse_line(&commands, &words[0])?
            } else {
                parse_words(&commands, &words)?
            };
            println!("{}", serde_json::to_string_pretty(&inv)?);
        }
        Cmd::Help { path } => print_help(&commands, &path)?,
        Cmd::Shell => run_shell(&commands)?,
    }
    Ok(())
}

fn matching(candidates: &[&str], prefix: &str) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| c.starts_with(prefix))
        .map(|c| (*c).to_string())
        .collect()
}

fn print_help(commands: &Commands, path: &[String]) -> Result<()> {
    if path.is_empty() {
        println!("COMMANDS:");
        for (name, help) in commands.help_rows() {
            println!("  {:<12}  {}", name, help);
        }
        return Ok(());
    }
    let (cmd, rest) = commands.find_command(path)?;
    let Some(cmd) = cmd else {
        bail!("unknown command: {}", path.join(" "));
    };
    if !rest.is_empty() {
        bail!("{} has no sub-command {}", cmd.name, rest.join(" "));
    }
    print!("{}", cmd.help_text());
    Ok(())
}

fn run_shell(commands: &Commands) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(partial) = line.strip_suffix('?') {
            let (suggestions, _) = Completer::new(commands).complete(partial, partial.chars().count());
            writeln!(stdout, "{}", suggestions.join("| "))?;
            continue;
        }
        match parse_line(commands, line) {
            Ok(inv) => writeln!(stdout, "{}", serde_json::to_string(&inv)?)?,
            Err(err) => {
                debug!(%err, line, "parse failed");
                writeln!(stdout, "% {}", err)?;
            }
        }
    }
    Ok(())
}
