use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// A track received by an answerer.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct RemoteTrack {
    pub kind: MediaKind,
    pub track_id: String,
}

/// The remote media of one pair, as handed to the render sink.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    pub fn new(stream_id: impl Into<String>, first: RemoteTrack) -> Self {
        Self {
            stream_id: stream_id.into(),
            tracks: vec![first],
        }
    }

    pub fn has_kind(&self, kind: MediaKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }
}
