use anyhow::{Context, Result, bail};

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Seek(f64),
    Play,
    Pause,
    Select(usize),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "commands: seek <seconds> | play | pause | select <pair> | status | help | quit";

impl UserCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let arg = words.next();

        let command = match (verb, arg) {
            ("seek", Some(v)) => {
                let seconds: f64 = v.parse().with_context(|| format!("bad position '{v}'"))?;
                if !seconds.is_finite() || seconds < 0.0 {
                    bail!("bad position '{v}'");
                }
                UserCommand::Seek(seconds)
            }
            ("select", Some(v)) => {
                let index: usize = v.parse().with_context(|| format!("bad pair '{v}'"))?;
                // usize::MAX stands for "nothing selected"
                if index == usize::MAX {
                    bail!("bad pair '{v}'");
                }
                UserCommand::Select(index)
            }
            ("seek", None) | ("select", None) => bail!("'{verb}' needs an argument"),
            ("play", None) => UserCommand::Play,
            ("pause", None) => UserCommand::Pause,
            ("status", None) => UserCommand::Status,
            ("help" | "?", None) => UserCommand::Help,
            ("quit" | "exit" | "q", None) => UserCommand::Quit,
            _ => bail!("unknown command '{}'", line.trim()),
        };

        if words.next().is_some() {
            bail!("too many arguments");
        }
        Ok(command)
    }
}
