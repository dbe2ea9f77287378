use crate::media::LocalTrack;
use crate::transport::EndpointSender;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{IceCandidate, PairIndex, Role, SessionDescription, TransportConfig};

/// Which media the offer asks to receive even without a local track of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferOptions {
    pub offer_to_receive_audio: bool,
    pub offer_to_receive_video: bool,
}

impl Default for OfferOptions {
    fn default() -> Self {
        Self {
            offer_to_receive_audio: true,
            offer_to_receive_video: true,
        }
    }
}

impl From<&TransportConfig> for OfferOptions {
    fn from(config: &TransportConfig) -> Self {
        Self {
            offer_to_receive_audio: config.offer_to_receive_audio,
            offer_to_receive_video: config.offer_to_receive_video,
        }
    }
}

/// One peer connection. Asynchronous results of the connection itself (candidates,
/// channels, tracks, state) are reported on the endpoint queue the transport was
/// created with, never returned from these calls.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_local_track(&self, track: &LocalTrack) -> Result<()>;

    /// Creates the control channel. It is reported with `ChannelOpened` once open.
    async fn create_control_channel(&self, label: &str) -> Result<()>;

    async fn create_offer(&self, options: &OfferOptions) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds the transport for one side of a pair.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        pair: PairIndex,
        role: Role,
        events: EndpointSender,
    ) -> Result<Arc<dyn PeerTransport>>;
}
