use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tandem_engine::{
    ChannelState, ChannelStateError, ControlChannel, EndpointEvent, EndpointSender, IceCandidate,
    LocalTrack, MediaKind, OfferOptions, PairIndex, PeerConnectionState, PeerTransport,
    RemoteTrack, Role, SessionDescription, TransportFactory,
};

/// Knobs for [`MockTransportFactory`].
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Candidates each endpoint gathers.
    pub candidates_per_endpoint: u16,
    /// Gather the offerer's candidates while creating the offer, so they reach the
    /// answerer before it has a remote description.
    pub early_candidates: bool,
    /// Pairs whose offer creation fails.
    pub fail_offer_for: HashSet<PairIndex>,
    /// Endpoints that refuse the first candidate they are asked to add.
    pub refuse_first_candidate_for: HashSet<(PairIndex, Role)>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            candidates_per_endpoint: 2,
            early_candidates: false,
            fail_offer_for: HashSet::new(),
            refuse_first_candidate_for: HashSet::new(),
        }
    }
}

/// In-memory transports. The two endpoints of a pair share one [`MockLink`], which
/// "connects" once both descriptions are in place on both sides and every candidate
/// has been handed to the transport.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    config: MockConfig,
    links: Arc<Mutex<HashMap<PairIndex, Arc<MockLink>>>>,
    create_failures: Arc<AtomicUsize>,
}

impl MockTransportFactory {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            links: Arc::new(Mutex::new(HashMap::new())),
            create_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The next transport creation fails.
    pub fn fail_next_create(&self) {
        self.create_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn link(&self, pair: PairIndex) -> Arc<MockLink> {
        self.links
            .lock()
            .unwrap()
            .entry(pair)
            .or_insert_with(|| Arc::new(MockLink::new()))
            .clone()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        pair: PairIndex,
        role: Role,
        events: EndpointSender,
    ) -> Result<Arc<dyn PeerTransport>> {
        let failing = self
            .create_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            bail!("scripted transport failure");
        }
        let link = self.link(pair);
        link.side(role, |side| side.events = Some(events.clone()));
        Ok(Arc::new(MockTransport {
            pair,
            role,
            config: self.config.clone(),
            events,
            link,
        }))
    }
}

#[derive(Default)]
struct SideState {
    events: Option<EndpointSender>,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    tracks: Vec<(MediaKind, String, String)>,
    applied: Vec<IceCandidate>,
    rejected: usize,
    refused: usize,
    sent: Vec<String>,
    closed: bool,
}

#[derive(Default)]
struct LinkState {
    offerer: SideState,
    answerer: SideState,
    channel_label: Option<String>,
    connected: bool,
}

impl LinkState {
    fn side_mut(&mut self, role: Role) -> &mut SideState {
        match role {
            Role::Offerer => &mut self.offerer,
            Role::Answerer => &mut self.answerer,
        }
    }

    fn side(&self, role: Role) -> &SideState {
        match role {
            Role::Offerer => &self.offerer,
            Role::Answerer => &self.answerer,
        }
    }
}

/// Shared state of one mock pair.
pub struct MockLink {
    state: Mutex<LinkState>,
    channel_open: Arc<AtomicBool>,
}

impl MockLink {
    fn new() -> Self {
        Self {
            state: Mutex::new(LinkState::default()),
            channel_open: Arc::new(AtomicBool::new(false)),
        }
    }

    fn side<R>(&self, role: Role, f: impl FnOnce(&mut SideState) -> R) -> R {
        f(self.state.lock().unwrap().side_mut(role))
    }

    /// Candidates `role` added to its transport, in order.
    pub fn applied_candidates(&self, role: Role) -> Vec<IceCandidate> {
        self.state.lock().unwrap().side(role).applied.clone()
    }

    /// Candidates `role` was asked to add before it had a remote description.
    pub fn rejected_candidates(&self, role: Role) -> usize {
        self.state.lock().unwrap().side(role).rejected
    }

    /// Candidates `role` refused on purpose (see `refuse_first_candidate_for`).
    pub fn refused_candidates(&self, role: Role) -> usize {
        self.state.lock().unwrap().side(role).refused
    }

    /// Messages `role` wrote to the control channel.
    pub fn sent_messages(&self, role: Role) -> Vec<String> {
        self.state.lock().unwrap().side(role).sent.clone()
    }

    /// Local tracks attached to `role`.
    pub fn local_tracks(&self, role: Role) -> usize {
        self.state.lock().unwrap().side(role).tracks.len()
    }

    pub fn channel_label(&self) -> Option<String> {
        self.state.lock().unwrap().channel_label.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    /// Drops the control channel as if the remote end went away.
    pub fn close_channel(&self) {
        self.channel_open.store(false, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let label = state.channel_label.clone().unwrap_or_default();
        for role in Role::BOTH {
            if let Some(events) = &state.side(role).events {
                let _ = events.send(EndpointEvent::ChannelClosed {
                    label: label.clone(),
                });
            }
        }
    }

    /// Reports a transport state change on `role`.
    pub fn report_state(&self, role: Role, observed: PeerConnectionState) {
        self.side(role, |side| {
            if let Some(events) = &side.events {
                let _ = events.send(EndpointEvent::StateChanged(observed));
            }
        });
    }

    fn record_sent(&self, role: Role, text: &str) {
        self.side(role, |side| side.sent.push(text.to_owned()));
    }

    fn try_connect(self: &Arc<Self>, candidates_per_endpoint: u16) {
        let mut state = self.state.lock().unwrap();
        if state.connected {
            return;
        }

        let wanted = candidates_per_endpoint as usize;
        let ready = Role::BOTH.iter().all(|role| {
            let side = state.side(*role);
            side.local.is_some()
                && side.remote.is_some()
                && side.applied.len() + side.refused >= wanted
        });
        if !ready {
            return;
        }
        state.connected = true;

        let (Some(offerer_events), Some(answerer_events)) =
            (state.offerer.events.clone(), state.answerer.events.clone())
        else {
            return;
        };

        for events in [&offerer_events, &answerer_events] {
            let _ = events.send(EndpointEvent::StateChanged(PeerConnectionState::Connecting));
            let _ = events.send(EndpointEvent::StateChanged(PeerConnectionState::Connected));
        }

        for (kind, track_id, stream_id) in &state.offerer.tracks {
            let _ = answerer_events.send(EndpointEvent::TrackReceived {
                stream_id: stream_id.clone(),
                track: RemoteTrack {
                    kind: *kind,
                    track_id: track_id.clone(),
                },
            });
        }

        let Some(label) = state.channel_label.clone() else {
            return;
        };
        self.channel_open.store(true, Ordering::SeqCst);
        drop(state);

        for (role, events, peer_events) in [
            (Role::Offerer, offerer_events.clone(), answerer_events.clone()),
            (Role::Answerer, answerer_events, offerer_events),
        ] {
            let channel = MockChannel {
                label: label.clone(),
                role,
                open: self.channel_open.clone(),
                peer_events,
                link: self.clone(),
            };
            let _ = events.send(EndpointEvent::ChannelOpened {
                channel: Arc::new(channel),
                initiated_locally: role == Role::Offerer,
            });
        }
    }
}

pub struct MockTransport {
    pair: PairIndex,
    role: Role,
    config: MockConfig,
    events: EndpointSender,
    link: Arc<MockLink>,
}

impl MockTransport {
    fn gather(&self) {
        for n in 0..self.config.candidates_per_endpoint {
            let candidate = IceCandidate {
                candidate: format!(
                    "candidate:{n} 1 udp 2130706431 127.0.0.1 {} typ host",
                    40000 + self.pair.get() * 100 + n as usize
                ),
                sdp_mid: Some("0".to_owned()),
                sdp_m_line_index: Some(0),
                username_fragment: Some(format!("{}-{}", self.pair, self.role)),
            };
            let _ = self.events.send(EndpointEvent::CandidateGenerated(Some(candidate)));
        }
        let _ = self.events.send(EndpointEvent::CandidateGenerated(None));
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn add_local_track(&self, track: &LocalTrack) -> Result<()> {
        let entry = (track.kind(), track.id().to_owned(), track.stream_id().to_owned());
        self.link.side(self.role, |side| side.tracks.push(entry));
        Ok(())
    }

    async fn create_control_channel(&self, label: &str) -> Result<()> {
        self.link.state.lock().unwrap().channel_label = Some(label.to_owned());
        Ok(())
    }

    async fn create_offer(&self, options: &OfferOptions) -> Result<SessionDescription> {
        if self.config.fail_offer_for.contains(&self.pair) {
            bail!("scripted offer failure");
        }
        if self.config.early_candidates {
            self.gather();
        }
        Ok(SessionDescription::offer(format!(
            "v=0 {} audio={} video={}",
            self.pair, options.offer_to_receive_audio, options.offer_to_receive_video
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let has_remote = self.link.side(self.role, |side| side.remote.is_some());
        if !has_remote {
            bail!("no remote offer");
        }
        Ok(SessionDescription::answer(format!("v=0 {} answer", self.pair)))
    }

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<()> {
        self.link.side(self.role, |side| side.local = Some(desc.clone()));
        let gathered_early = self.config.early_candidates && self.role == Role::Offerer;
        if !gathered_early {
            self.gather();
        }
        self.link.try_connect(self.config.candidates_per_endpoint);
        Ok(())
    }

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<()> {
        self.link.side(self.role, |side| side.remote = Some(desc.clone()));
        self.link.try_connect(self.config.candidates_per_endpoint);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        let refuse_first = self
            .config
            .refuse_first_candidate_for
            .contains(&(self.pair, self.role));
        let outcome = self.link.side(self.role, |side| {
            if side.remote.is_none() {
                side.rejected += 1;
                return Err(anyhow!("remote description not set"));
            }
            if refuse_first && side.refused == 0 && side.applied.is_empty() {
                side.refused += 1;
                return Err(anyhow!("scripted candidate failure"));
            }
            side.applied.push(candidate.clone());
            Ok(())
        });
        self.link.try_connect(self.config.candidates_per_endpoint);
        outcome
    }

    async fn close(&self) -> Result<()> {
        let already = self.link.side(self.role, |side| std::mem::replace(&mut side.closed, true));
        if !already {
            self.link.channel_open.store(false, Ordering::SeqCst);
            let _ = self
                .events
                .send(EndpointEvent::StateChanged(PeerConnectionState::Closed));
        }
        Ok(())
    }
}

/// One end of the in-memory control channel; writes land on the peer's queue.
pub struct MockChannel {
    label: String,
    role: Role,
    open: Arc<AtomicBool>,
    peer_events: EndpointSender,
    link: Arc<MockLink>,
}

#[async_trait]
impl ControlChannel for MockChannel {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> ChannelState {
        if self.open.load(Ordering::SeqCst) {
            ChannelState::Open
        } else {
            ChannelState::Closed
        }
    }

    async fn send_text(&self, text: &str) -> Result<(), ChannelStateError> {
        let state = self.state();
        if state != ChannelState::Open {
            return Err(ChannelStateError::NotOpen {
                label: self.label.clone(),
                state,
            });
        }
        self.link.record_sent(self.role, text);
        let _ = self
            .peer_events
            .send(EndpointEvent::ChannelMessage(text.to_owned()));
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}
