use anyhow::{bail, Result};
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: audit-claw [--config <path>] [serve]
       audit-claw [--config <path>] scan <target>

Commands:
  serve           Serve one observer over stdin/stdout (JSON lines). Default.
  scan <target>   Run an audit interactively in the terminal.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    Scan { target: String },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub command: Command,
}

/// Parses the arguments after the program name.
pub fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut positional = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("--config needs a path"),
            },
            "--help" | "-h" => {
                return Ok(CliArgs {
                    config,
                    command: Command::Help,
                })
            }
            other if other.starts_with('-') && positional.is_empty() => {
                bail!("Unknown option '{}'", other)
            }
            _ => positional.push(arg),
        }
    }

    let command = match positional.as_slice() {
        [] => Command::Serve,
        [cmd] if cmd == "serve" => Command::Serve,
        [cmd] if cmd == "help" => Command::Help,
        [cmd] if cmd == "scan" => bail!("scan needs a target"),
        [cmd, target] if cmd == "scan" => Command::Scan {
            target: target.clone(),
        },
        [cmd, ..] => bail!("Unexpected arguments starting at '{}'", cmd),
    };

    Ok(CliArgs { config, command })
}
