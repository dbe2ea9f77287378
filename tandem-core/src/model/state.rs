use crate::model::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Negotiation and connectivity state of one endpoint.
///
/// The first four variants are driven by the offer/answer exchange, the last four
/// mirror what the underlying peer connection reports.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointState {
    New,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl EndpointState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EndpointState::Failed | EndpointState::Closed)
    }
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndpointState::New => "new",
            EndpointState::HaveLocalOffer => "have-local-offer",
            EndpointState::HaveRemoteOffer => "have-remote-offer",
            EndpointState::Stable => "stable",
            EndpointState::Connected => "connected",
            EndpointState::Disconnected => "disconnected",
            EndpointState::Failed => "failed",
            EndpointState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Connection state as observed on the transport.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Control channel lifecycle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => f.write_str("connecting"),
            ChannelState::Open => f.write_str("open"),
            ChannelState::Closed => f.write_str("closed"),
        }
    }
}

/// Snapshot of one pair, published by the pair's event loop.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
pub struct PairStatus {
    pub offerer: EndpointState,
    pub answerer: EndpointState,
    pub channel: ChannelState,
    /// Candidates either endpoint failed to add. They do not stop the pair.
    pub candidate_errors: u32,
    /// Time from handing over the tracks to the first remote track, in ms.
    pub setup_ms: Option<u64>,
}

impl PairStatus {
    pub fn endpoint(&self, role: Role) -> EndpointState {
        match role {
            Role::Offerer => self.offerer,
            Role::Answerer => self.answerer,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.offerer == EndpointState::Connected && self.answerer == EndpointState::Connected
    }

    pub fn is_terminal(&self) -> bool {
        self.offerer.is_terminal() || self.answerer.is_terminal()
    }
}

impl Default for PairStatus {
    fn default() -> Self {
        Self {
            offerer: EndpointState::New,
            answerer: EndpointState::New,
            channel: ChannelState::Connecting,
            candidate_errors: 0,
            setup_ms: None,
        }
    }
}
