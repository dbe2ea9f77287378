use crate::control::ControlChannel;
use std::fmt;
use std::sync::Arc;
use tandem_core::{IceCandidate, PeerConnectionState, RemoteTrack, SdpKind, SessionDescription};
use tokio::sync::mpsc;

/// Everything that can happen to one endpoint. Transport callbacks and the
/// negotiation coordinator post these onto the endpoint's queue; the pair event
/// loop consumes them in order.
pub enum EndpointEvent {
    /// A description this endpoint asked for has been produced.
    LocalDescriptionReady(SessionDescription),

    /// The sibling's description has been applied to this endpoint.
    RemoteDescriptionSet(SdpKind),

    /// The transport found a local candidate. `None` ends gathering.
    CandidateGenerated(Option<IceCandidate>),

    /// The sibling forwarded one of its candidates. `None` ends the sibling's gathering.
    CandidateReceived(Option<IceCandidate>),

    /// A control channel is ready for writing.
    ChannelOpened {
        channel: Arc<dyn ControlChannel>,
        initiated_locally: bool,
    },

    ChannelMessage(String),

    ChannelClosed { label: String },

    StateChanged(PeerConnectionState),

    TrackReceived { stream_id: String, track: RemoteTrack },
}

impl fmt::Debug for EndpointEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointEvent::LocalDescriptionReady(d) => {
                f.debug_tuple("LocalDescriptionReady").field(&d.kind()).finish()
            }
            EndpointEvent::RemoteDescriptionSet(kind) => {
                f.debug_tuple("RemoteDescriptionSet").field(kind).finish()
            }
            EndpointEvent::CandidateGenerated(c) => {
                f.debug_tuple("CandidateGenerated").field(c).finish()
            }
            EndpointEvent::CandidateReceived(c) => {
                f.debug_tuple("CandidateReceived").field(c).finish()
            }
            EndpointEvent::ChannelOpened {
                channel,
                initiated_locally,
            } => f
                .debug_struct("ChannelOpened")
                .field("label", &channel.label())
                .field("initiated_locally", initiated_locally)
                .finish(),
            EndpointEvent::ChannelMessage(text) => {
                f.debug_tuple("ChannelMessage").field(text).finish()
            }
            EndpointEvent::ChannelClosed { label } => {
                f.debug_struct("ChannelClosed").field("label", label).finish()
            }
            EndpointEvent::StateChanged(s) => f.debug_tuple("StateChanged").field(s).finish(),
            EndpointEvent::TrackReceived { stream_id, track } => f
                .debug_struct("TrackReceived")
                .field("stream_id", stream_id)
                .field("track", track)
                .finish(),
        }
    }
}

pub type EndpointSender = mpsc::UnboundedSender<EndpointEvent>;
pub type EndpointReceiver = mpsc::UnboundedReceiver<EndpointEvent>;

pub fn endpoint_queue() -> (EndpointSender, EndpointReceiver) {
    mpsc::unbounded_channel()
}
