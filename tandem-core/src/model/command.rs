use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const SEPARATOR: char = ',';

/// Tag of a control command on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Seek,
    Play,
    Pause,
    Time,
}

impl CommandKind {
    pub fn tag(self) -> &'static str {
        match self {
            CommandKind::Seek => "seek",
            CommandKind::Play => "play",
            CommandKind::Pause => "pause",
            CommandKind::Time => "time",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "seek" => Some(CommandKind::Seek),
            "play" => Some(CommandKind::Play),
            "pause" => Some(CommandKind::Pause),
            "time" => Some(CommandKind::Time),
            _ => None,
        }
    }
}

/// One message on a control channel.
///
/// Wire form is `<tag>,<operand>`: `seek,12.5`, `play,`, `pause,`, `time,45.2`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ControlCommand {
    /// Jump the receiver's local media to this position, in seconds.
    Seek(f64),
    Play,
    Pause,
    /// Sender's current local playback position, in seconds.
    Time(f64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolDecodeError {
    #[error("empty control message")]
    Empty,

    #[error("unknown command tag '{0}'")]
    UnknownTag(String),

    #[error("bad operand '{operand}' for '{tag}'")]
    BadOperand { tag: &'static str, operand: String },
}

impl ControlCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            ControlCommand::Seek(_) => CommandKind::Seek,
            ControlCommand::Play => CommandKind::Play,
            ControlCommand::Pause => CommandKind::Pause,
            ControlCommand::Time(_) => CommandKind::Time,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            ControlCommand::Seek(v) | ControlCommand::Time(v) => Some(*v),
            ControlCommand::Play | ControlCommand::Pause => None,
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parses one wire message. Only the first separator splits tag from operand.
    pub fn decode(message: &str) -> Result<Self, ProtocolDecodeError> {
        if message.trim().is_empty() {
            return Err(ProtocolDecodeError::Empty);
        }

        let (tag, operand) = message
            .split_once(SEPARATOR)
            .unwrap_or((message, ""));
        let tag = tag.trim();

        let kind = CommandKind::from_tag(tag)
            .ok_or_else(|| ProtocolDecodeError::UnknownTag(tag.to_owned()))?;

        match kind {
            CommandKind::Play => Ok(ControlCommand::Play),
            CommandKind::Pause => Ok(ControlCommand::Pause),
            CommandKind::Seek => parse_seconds(kind, operand).map(ControlCommand::Seek),
            CommandKind::Time => parse_seconds(kind, operand).map(ControlCommand::Time),
        }
    }
}

fn parse_seconds(kind: CommandKind, operand: &str) -> Result<f64, ProtocolDecodeError> {
    let bad = || ProtocolDecodeError::BadOperand {
        tag: kind.tag(),
        operand: operand.to_owned(),
    };

    let value: f64 = operand.trim().parse().map_err(|_| bad())?;
    if !value.is_finite() {
        return Err(bad());
    }
    Ok(value)
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.kind().tag();
        match self.value() {
            Some(v) => write!(f, "{tag}{SEPARATOR}{v}"),
            None => write!(f, "{tag}{SEPARATOR}"),
        }
    }
}
