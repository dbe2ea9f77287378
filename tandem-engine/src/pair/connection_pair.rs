use crate::error::{NegotiationError, SessionError};
use crate::media::MediaTracks;
use crate::negotiation::{Endpoint, EndpointSlot, NegotiationCoordinator};
use crate::pair::{PairCommand, PairHandle};
use crate::sync::PlaybackSyncController;
use crate::transport::{
    EndpointEvent, EndpointReceiver, EndpointSender, TransportFactory, endpoint_queue,
};
use tandem_core::{ChannelState, EndpointState, PairIndex, PairStatus, Role, TransportConfig};
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Offerer and answerer of one pair, negotiated against each other in-process.
///
/// All events of both endpoints are handled by one task, in queue order, so the
/// endpoint state machines never see concurrent updates.
pub struct ConnectionPair {
    index: PairIndex,
    coordinator: NegotiationCoordinator,

    /// Offerer first, answerer second.
    slots: [EndpointSlot; 2],
    offerer_rx: EndpointReceiver,
    answerer_rx: EndpointReceiver,

    command_rx: mpsc::Receiver<PairCommand>,
    status_tx: watch::Sender<PairStatus>,

    controller: PlaybackSyncController,
    tracks_attached: bool,
    channel_state: ChannelState,

    /// Set when the tracks are handed over.
    started_at: Option<Instant>,
    setup_time: Option<Duration>,
}

impl ConnectionPair {
    /// Builds both transports. Negotiation starts once the tracks are handed over.
    pub async fn connect(
        index: PairIndex,
        factory: &dyn TransportFactory,
        config: &TransportConfig,
        controller: PlaybackSyncController,
    ) -> Result<(Self, PairHandle), SessionError> {
        let (offerer_tx, offerer_rx) = endpoint_queue();
        let (answerer_tx, answerer_rx) = endpoint_queue();

        let offerer = build_slot(index, Role::Offerer, factory, offerer_tx).await?;
        let answerer = build_slot(index, Role::Answerer, factory, answerer_tx).await?;

        let (command_tx, command_rx) = mpsc::channel(32);
        let (status_tx, status_rx) = watch::channel(PairStatus::default());

        let pair = Self {
            index,
            coordinator: NegotiationCoordinator::new(index, config),
            slots: [offerer, answerer],
            offerer_rx,
            answerer_rx,
            command_rx,
            status_tx,
            controller,
            tracks_attached: false,
            channel_state: ChannelState::Connecting,
            started_at: None,
            setup_time: None,
        };
        let handle = PairHandle::new(index, command_tx, status_rx);
        Ok((pair, handle))
    }

    pub fn index(&self) -> PairIndex {
        self.index
    }

    /// Event loop. Run it with `tokio::spawn`.
    pub async fn run(mut self) {
        info!("{} event loop started", self.index);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(PairCommand::TracksReady(tracks)) => self.handle_tracks_ready(tracks).await,
                        Some(PairCommand::Close { done }) => {
                            self.shutdown().await;
                            let _ = done.send(());
                            break;
                        }
                        None => {
                            info!("{}: all handles dropped, shutting down", self.index);
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                Some(event) = self.offerer_rx.recv() => {
                    self.handle_event(Role::Offerer, event).await;
                }

                Some(event) = self.answerer_rx.recv() => {
                    self.handle_event(Role::Answerer, event).await;
                }
            }

            self.publish_status();
        }

        info!("{} event loop finished", self.index);
    }

    async fn handle_tracks_ready(&mut self, tracks: MediaTracks) {
        if self.tracks_attached {
            warn!("{}: tracks already attached, ignoring repeated trigger", self.index);
            return;
        }
        self.tracks_attached = true;
        self.started_at = Some(Instant::now());

        info!(
            "{}: {} video / {} audio tracks ready, negotiating",
            self.index,
            tracks.video.len(),
            tracks.audio.len()
        );
        let (offerer, _) = sides(&mut self.slots, Role::Offerer);
        let result = self.coordinator.start(offerer, &tracks).await;
        if let Err(e) = result {
            self.fail(e);
        }
    }

    async fn handle_event(&mut self, role: Role, event: EndpointEvent) {
        debug!("{} {}: {:?}", self.index, role, event);
        let index = self.index;

        match event {
            // Offer or answer created: store it here, hand it to the sibling
            EndpointEvent::LocalDescriptionReady(desc) => {
                let (this, sibling) = sides(&mut self.slots, role);
                let result = self
                    .coordinator
                    .apply_local_description(this, sibling, desc)
                    .await;
                if let Err(e) = result {
                    self.fail(e);
                }
            }

            // The answerer answers; for the offerer the exchange is done
            EndpointEvent::RemoteDescriptionSet(kind) => {
                let (this, _) = sides(&mut self.slots, role);
                let result = self.coordinator.on_remote_description_set(this, kind).await;
                if let Err(e) = result {
                    self.fail(e);
                }
            }

            // Trickle ICE
            EndpointEvent::CandidateGenerated(candidate) => {
                let (this, sibling) = sides(&mut self.slots, role);
                self.coordinator.forward_candidate(this, sibling, candidate);
            }

            EndpointEvent::CandidateReceived(candidate) => {
                let (this, _) = sides(&mut self.slots, role);
                // Reported and counted; the pair keeps going
                if let Err(e) = self.coordinator.receive_candidate(this, candidate).await {
                    warn!("{}", e);
                }
            }

            // Control channel lifecycle goes to the sync controller
            EndpointEvent::ChannelOpened {
                channel,
                initiated_locally,
            } => {
                info!(
                    "{} {}: control channel '{}' open ({})",
                    index,
                    role,
                    channel.label(),
                    if initiated_locally { "created here" } else { "received" }
                );
                self.channel_state = ChannelState::Open;
                self.controller.bind_channel(index, role, channel);
            }

            EndpointEvent::ChannelMessage(text) => {
                self.controller.handle_inbound(index, role, &text);
            }

            EndpointEvent::ChannelClosed { label } => {
                warn!("{} {}: control channel '{}' closed, pair degraded", index, role, label);
                self.channel_state = ChannelState::Closed;
                self.controller.unbind_channel(index, role);
            }

            // Observed only, never driven
            EndpointEvent::StateChanged(observed) => {
                let (this, _) = sides(&mut self.slots, role);
                match this.endpoint.observe(observed) {
                    Some(EndpointState::Failed) => {
                        error!("{} {}: peer connection failed", index, role);
                    }
                    Some(state) => info!("{} {}: {}", index, role, state),
                    None => debug!("{} {}: transport reports {:?}", index, role, observed),
                }
            }

            EndpointEvent::TrackReceived { stream_id, track } => match role {
                Role::Answerer => {
                    self.record_setup_time();
                    self.controller.register_remote_track(index, &stream_id, track);
                }
                Role::Offerer => {
                    debug!("{} offerer: ignoring remote {} track", index, track.kind);
                }
            },
        }
    }

    /// Logs how long the first remote track took to arrive after the tracks were
    /// handed over. Only the first track counts.
    fn record_setup_time(&mut self) {
        if self.setup_time.is_some() {
            return;
        }
        if let Some(started_at) = self.started_at {
            let elapsed = started_at.elapsed();
            info!("{}: setup time {} ms", self.index, elapsed.as_millis());
            self.setup_time = Some(elapsed);
        }
    }

    /// A negotiation failure stops the named endpoint. The sibling and the other
    /// pair are left alone.
    fn fail(&mut self, err: NegotiationError) {
        error!("{}", err);
        let (this, _) = sides(&mut self.slots, err.role());
        this.endpoint.fail();
    }

    async fn shutdown(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Err(e) = slot.transport.close().await {
                warn!(
                    "{} {}: close failed: {:#}",
                    self.index,
                    slot.endpoint.role(),
                    e
                );
            }
            slot.endpoint.close();
            self.controller.unbind_channel(self.index, slot.endpoint.role());
        }
        self.channel_state = ChannelState::Closed;
        self.publish_status();
        info!("{} closed", self.index);
    }

    fn publish_status(&self) {
        let [offerer, answerer] = &self.slots;
        let status = PairStatus {
            offerer: offerer.endpoint.state(),
            answerer: answerer.endpoint.state(),
            channel: self.channel_state,
            candidate_errors: offerer.endpoint.candidate_errors()
                + answerer.endpoint.candidate_errors(),
            setup_ms: self.setup_time.map(|d| d.as_millis() as u64),
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

async fn build_slot(
    index: PairIndex,
    role: Role,
    factory: &dyn TransportFactory,
    queue: EndpointSender,
) -> Result<EndpointSlot, SessionError> {
    let transport = factory
        .create(index, role, queue.clone())
        .await
        .map_err(|source| SessionError::Transport {
            pair: index,
            role,
            source,
        })?;
    Ok(EndpointSlot::new(Endpoint::new(index, role), transport, queue))
}

/// `(this, sibling)` for `role`.
fn sides(slots: &mut [EndpointSlot; 2], role: Role) -> (&mut EndpointSlot, &mut EndpointSlot) {
    let [offerer, answerer] = slots;
    match role {
        Role::Offerer => (offerer, answerer),
        Role::Answerer => (answerer, offerer),
    }
}
