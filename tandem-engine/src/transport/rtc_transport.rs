use crate::control::RtcControlChannel;
use crate::media::LocalTrack;
use crate::transport::{EndpointEvent, EndpointSender, OfferOptions, PeerTransport, TransportFactory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tandem_core::{
    IceCandidate, MediaKind, PairIndex, PeerConnectionState, RemoteTrack, Role, SdpKind,
    SessionDescription, TransportConfig,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`RtcTransport`]s from one shared [`TransportConfig`].
#[derive(Clone, Default)]
pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        pair: PairIndex,
        role: Role,
        events: EndpointSender,
    ) -> Result<Arc<dyn PeerTransport>> {
        let transport = RtcTransport::new(pair, role, &self.config, events).await?;
        Ok(Arc::new(transport))
    }
}

/// webrtc-rs peer connection for one endpoint.
pub struct RtcTransport {
    pair: PairIndex,
    role: Role,
    peer_connection: Arc<RTCPeerConnection>,
    events: EndpointSender,
    /// Kinds that already have a sending track, so the offer does not add a
    /// receive-only transceiver for them.
    sending_kinds: Mutex<HashSet<MediaKind>>,
}

impl RtcTransport {
    pub async fn new(
        pair: PairIndex,
        role: Role,
        config: &TransportConfig,
        events: EndpointSender,
    ) -> Result<Self> {
        // 1. Media engine with the default codec set
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        // 2. Default interceptors (NACK, RTCP reports)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        // 3. API object
        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 4. ICE servers; an empty list leaves host candidates only
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        // 5. Peer connection
        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // --- Callbacks ---
        // Each one only posts to the endpoint queue; the pair loop does the work.

        // A. Connection state, as reported by the transport
        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                if let Some(state) = map_connection_state(s) {
                    let _ = state_tx.send(EndpointEvent::StateChanged(state));
                }
                Box::pin(async {})
            },
        ));

        // B. Trickle ICE: every gathered candidate goes to the sibling, `None` marks
        // the end of gathering
        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let candidate = match c {
                Some(candidate) => match to_ice_candidate(&candidate) {
                    Ok(candidate) => Some(Some(candidate)),
                    Err(e) => {
                        warn!("{} {}: dropping unreadable local candidate: {:#}", pair, role, e);
                        None
                    }
                },
                None => Some(None),
            };
            if let Some(candidate) = candidate {
                let _ = ice_tx.send(EndpointEvent::CandidateGenerated(candidate));
            }
            Box::pin(async {})
        }));

        // C. Control channel created by the other side (answerer only)
        let dc_tx = events.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            debug!("{} {}: received data channel '{}'", pair, role, dc.label());
            wire_data_channel(dc, dc_tx.clone(), false);
            Box::pin(async {})
        }));

        // D. Remote media
        let track_tx = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let Some(kind) = map_codec_type(track.kind()) else {
                        return;
                    };
                    let remote = RemoteTrack {
                        kind,
                        track_id: track.id().to_string(),
                    };
                    info!("{} {}: remote {} track {}", pair, role, kind, remote.track_id);
                    let _ = tx.send(EndpointEvent::TrackReceived {
                        stream_id: track.stream_id().to_string(),
                        track: remote,
                    });

                    // Nothing downstream reads RTP; keep the receive buffer drained.
                    tokio::spawn(async move { while track.read_rtp().await.is_ok() {} });
                })
            },
        ));

        Ok(Self {
            pair,
            role,
            peer_connection,
            events,
            sending_kinds: Mutex::new(HashSet::new()),
        })
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn add_local_track(&self, track: &LocalTrack) -> Result<()> {
        let local: Arc<dyn TrackLocal + Send + Sync> = track.sample_track().clone();
        let sender = self
            .peer_connection
            .add_track(local)
            .await
            .with_context(|| format!("add {} track {}", track.kind(), track.id()))?;

        // RTCP has to be read for the interceptors to work.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });

        self.sending_kinds.lock().await.insert(track.kind());
        Ok(())
    }

    async fn create_control_channel(&self, label: &str) -> Result<()> {
        let dc = self
            .peer_connection
            .create_data_channel(label, None)
            .await
            .context("Failed to create data channel")?;
        debug!("{} {}: created data channel '{}'", self.pair, self.role, label);
        wire_data_channel(dc, self.events.clone(), true);
        Ok(())
    }

    async fn create_offer(&self, options: &OfferOptions) -> Result<SessionDescription> {
        let sending = self.sending_kinds.lock().await.clone();
        let wanted = [
            (MediaKind::Audio, options.offer_to_receive_audio),
            (MediaKind::Video, options.offer_to_receive_video),
        ];
        for (kind, receive) in wanted {
            if !receive || sending.contains(&kind) {
                continue;
            }
            self.peer_connection
                .add_transceiver_from_kind(
                    codec_type(kind),
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await
                .with_context(|| format!("add receive-only {kind} transceiver"))?;
        }

        // Tracks and transceivers must be in place before the offer is created
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        // Same JSON shape on both sides
        let init: RTCIceCandidateInit = serde_json::to_value(candidate)
            .and_then(serde_json::from_value)
            .context("Failed to convert ICE candidate")?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Routes open/message/close of a data channel onto the endpoint queue.
fn wire_data_channel(dc: Arc<RTCDataChannel>, events: EndpointSender, initiated_locally: bool) {
    let open_tx = events.clone();
    let dc_on_open = dc.clone();
    // Only an open channel is handed to the controller
    dc.on_open(Box::new(move || {
        let channel = Arc::new(RtcControlChannel::new(dc_on_open.clone()));
        let _ = open_tx.send(EndpointEvent::ChannelOpened {
            channel,
            initiated_locally,
        });
        Box::pin(async {})
    }));

    let msg_tx = events.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let text = String::from_utf8_lossy(&msg.data).into_owned();
        let _ = msg_tx.send(EndpointEvent::ChannelMessage(text));
        Box::pin(async {})
    }));

    let close_tx = events;
    let label = dc.label().to_owned();
    dc.on_close(Box::new(move || {
        let _ = close_tx.send(EndpointEvent::ChannelClosed {
            label: label.clone(),
        });
        Box::pin(async {})
    }));
}

fn to_rtc_description(desc: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = desc.sdp().to_owned();
    let rtc = match desc.kind() {
        SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
    };
    Ok(rtc)
}

fn to_ice_candidate(candidate: &RTCIceCandidate) -> Result<IceCandidate> {
    let init = candidate.to_json()?;
    let json = serde_json::to_value(init)?;
    Ok(serde_json::from_value(json)?)
}

fn map_connection_state(state: RTCPeerConnectionState) -> Option<PeerConnectionState> {
    match state {
        RTCPeerConnectionState::New => Some(PeerConnectionState::New),
        RTCPeerConnectionState::Connecting => Some(PeerConnectionState::Connecting),
        RTCPeerConnectionState::Connected => Some(PeerConnectionState::Connected),
        RTCPeerConnectionState::Disconnected => Some(PeerConnectionState::Disconnected),
        RTCPeerConnectionState::Failed => Some(PeerConnectionState::Failed),
        RTCPeerConnectionState::Closed => Some(PeerConnectionState::Closed),
        _ => None,
    }
}

fn map_codec_type(kind: RTPCodecType) -> Option<MediaKind> {
    match kind {
        RTPCodecType::Audio => Some(MediaKind::Audio),
        RTPCodecType::Video => Some(MediaKind::Video),
        _ => None,
    }
}

fn codec_type(kind: MediaKind) -> RTPCodecType {
    match kind {
        MediaKind::Audio => RTPCodecType::Audio,
        MediaKind::Video => RTPCodecType::Video,
    }
}
