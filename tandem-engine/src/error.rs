use std::fmt;
use std::time::Duration;
use tandem_core::{ChannelState, EndpointState, PairIndex, Role};
use thiserror::Error;

/// Step of the offer/answer exchange an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStage {
    AttachTracks,
    CreateChannel,
    CreateOffer,
    CreateAnswer,
    SetLocalDescription,
    SetRemoteDescription,
}

impl fmt::Display for NegotiationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NegotiationStage::AttachTracks => "attach tracks",
            NegotiationStage::CreateChannel => "create control channel",
            NegotiationStage::CreateOffer => "create offer",
            NegotiationStage::CreateAnswer => "create answer",
            NegotiationStage::SetLocalDescription => "set local description",
            NegotiationStage::SetRemoteDescription => "set remote description",
        };
        f.write_str(s)
    }
}

/// Failure to produce or apply a session description. Fatal for the pair it names.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{pair} {role}: {stage} failed: {source:#}")]
    Operation {
        pair: PairIndex,
        role: Role,
        stage: NegotiationStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("{pair} {role}: cannot {action} while {state}")]
    InvalidTransition {
        pair: PairIndex,
        role: Role,
        action: &'static str,
        state: EndpointState,
    },
}

impl NegotiationError {
    pub fn pair(&self) -> PairIndex {
        match self {
            NegotiationError::Operation { pair, .. }
            | NegotiationError::InvalidTransition { pair, .. } => *pair,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            NegotiationError::Operation { role, .. }
            | NegotiationError::InvalidTransition { role, .. } => *role,
        }
    }
}

/// A remote candidate the transport refused. The pair keeps going.
#[derive(Debug, Error)]
#[error("{pair} {role}: failed to add ICE candidate: {source:#}")]
pub struct CandidateError {
    pub pair: PairIndex,
    pub role: Role,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum ChannelStateError {
    #[error("control channel '{label}' is {state}")]
    NotOpen { label: String, state: ChannelState },

    #[error("control channel '{label}' send failed: {source:#}")]
    SendFailed {
        label: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors surfaced to whoever owns the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no such pair: {0}")]
    UnknownPair(PairIndex),

    #[error("{0} event loop is no longer running")]
    PairStopped(PairIndex),

    #[error("{pair} {role}: failed to create peer connection: {source:#}")]
    Transport {
        pair: PairIndex,
        role: Role,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0} failed or was closed before connecting")]
    PairFailed(PairIndex),

    #[error("{pair} did not reach the expected state within {timeout:?}")]
    Timeout { pair: PairIndex, timeout: Duration },
}
