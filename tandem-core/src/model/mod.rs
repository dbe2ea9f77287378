mod command;
mod media;
mod pair;
mod signaling;
mod state;

pub use command::{CommandKind, ControlCommand, ProtocolDecodeError};
pub use media::{MediaKind, RemoteStream, RemoteTrack};
pub use pair::{PairIndex, Role};
pub use signaling::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
pub use state::{ChannelState, EndpointState, PairStatus, PeerConnectionState};
