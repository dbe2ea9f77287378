use crate::error::{CandidateError, NegotiationError, NegotiationStage};
use crate::media::MediaTracks;
use crate::negotiation::{CandidateDisposition, Endpoint};
use crate::transport::{EndpointEvent, EndpointSender, OfferOptions, PeerTransport};
use std::sync::Arc;
use tandem_core::{IceCandidate, PairIndex, Role, SdpKind, SessionDescription, TransportConfig};
use tracing::{debug, info, warn};

/// One endpoint together with its transport and the sender side of its queue.
pub struct EndpointSlot {
    pub endpoint: Endpoint,
    pub transport: Arc<dyn PeerTransport>,
    pub queue: EndpointSender,
}

impl EndpointSlot {
    pub fn new(endpoint: Endpoint, transport: Arc<dyn PeerTransport>, queue: EndpointSender) -> Self {
        Self {
            endpoint,
            transport,
            queue,
        }
    }

    fn post(&self, event: EndpointEvent) {
        if self.queue.send(event).is_err() {
            debug!(
                "{} {}: queue closed, event dropped",
                self.endpoint.pair(),
                self.endpoint.role()
            );
        }
    }

    fn operation_error(&self, stage: NegotiationStage, source: anyhow::Error) -> NegotiationError {
        NegotiationError::Operation {
            pair: self.endpoint.pair(),
            role: self.endpoint.role(),
            stage,
            source,
        }
    }
}

/// Offer/answer/ICE exchange between the two endpoints of a pair. Every step ends by
/// posting an event, so the exchange advances one queued event at a time.
#[derive(Debug, Clone)]
pub struct NegotiationCoordinator {
    pair: PairIndex,
    offer_options: OfferOptions,
    channel_label: String,
}

impl NegotiationCoordinator {
    pub fn new(pair: PairIndex, config: &TransportConfig) -> Self {
        Self {
            pair,
            offer_options: OfferOptions::from(config),
            channel_label: config.control_channel_label.clone(),
        }
    }

    /// Attaches the tracks, opens the control channel and creates the offer.
    pub async fn start(
        &self,
        offerer: &mut EndpointSlot,
        tracks: &MediaTracks,
    ) -> Result<(), NegotiationError> {
        offerer.endpoint.next_on_local(SdpKind::Offer)?;

        for track in tracks.iter() {
            offerer
                .transport
                .add_local_track(track)
                .await
                .map_err(|e| offerer.operation_error(NegotiationStage::AttachTracks, e))?;
        }

        offerer
            .transport
            .create_control_channel(&self.channel_label)
            .await
            .map_err(|e| offerer.operation_error(NegotiationStage::CreateChannel, e))?;

        let offer = offerer
            .transport
            .create_offer(&self.offer_options)
            .await
            .map_err(|e| offerer.operation_error(NegotiationStage::CreateOffer, e))?;

        debug!("{} offerer: offer created ({} tracks)", self.pair, tracks.len());
        offerer.post(EndpointEvent::LocalDescriptionReady(offer));
        Ok(())
    }

    /// Stores `desc` on `this` and applies it as the sibling's remote description.
    pub async fn apply_local_description(
        &self,
        this: &mut EndpointSlot,
        sibling: &mut EndpointSlot,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let next = this.endpoint.next_on_local(desc.kind())?;
        this.transport
            .set_local_description(&desc)
            .await
            .map_err(|e| this.operation_error(NegotiationStage::SetLocalDescription, e))?;
        this.endpoint.local_applied(next);
        info!(
            "{} {}: local {} set, now {}",
            self.pair,
            this.endpoint.role(),
            desc.kind(),
            next
        );

        let sibling_next = sibling.endpoint.next_on_remote(desc.kind())?;
        sibling
            .transport
            .set_remote_description(&desc)
            .await
            .map_err(|e| sibling.operation_error(NegotiationStage::SetRemoteDescription, e))?;

        // Candidates that arrived before this description are applied now, in the
        // order they came in. A refused one is reported and the rest still go in.
        let queued = sibling.endpoint.remote_applied(sibling_next);
        info!(
            "{} {}: remote {} set, now {}, flushing {} queued candidates",
            self.pair,
            sibling.endpoint.role(),
            desc.kind(),
            sibling_next,
            queued.len()
        );
        for candidate in queued {
            if let Err(e) = sibling.transport.add_ice_candidate(&candidate).await {
                sibling.endpoint.record_candidate_error();
                let err = CandidateError {
                    pair: self.pair,
                    role: sibling.endpoint.role(),
                    source: e,
                };
                warn!("{}", err);
            }
        }

        sibling.post(EndpointEvent::RemoteDescriptionSet(desc.kind()));
        Ok(())
    }

    /// The answerer answers a remote offer. A remote answer completes the exchange.
    pub async fn on_remote_description_set(
        &self,
        this: &mut EndpointSlot,
        kind: SdpKind,
    ) -> Result<(), NegotiationError> {
        match (this.endpoint.role(), kind) {
            (Role::Answerer, SdpKind::Offer) => {
                this.endpoint.next_on_local(SdpKind::Answer)?;
                let answer = this
                    .transport
                    .create_answer()
                    .await
                    .map_err(|e| this.operation_error(NegotiationStage::CreateAnswer, e))?;
                debug!("{} answerer: answer created", self.pair);
                this.post(EndpointEvent::LocalDescriptionReady(answer));
            }
            (Role::Offerer, SdpKind::Answer) => {
                info!("{}: offer/answer exchange complete", self.pair);
            }
            (role, kind) => {
                warn!("{} {}: unexpected remote {} notification", self.pair, role, kind);
            }
        }
        Ok(())
    }

    /// Trickles a locally gathered candidate to the sibling.
    pub fn forward_candidate(
        &self,
        this: &mut EndpointSlot,
        sibling: &EndpointSlot,
        candidate: Option<IceCandidate>,
    ) {
        let forwarded = this.endpoint.candidate_generated(candidate);
        if forwarded.is_none() {
            debug!("{} {}: candidate gathering complete", self.pair, this.endpoint.role());
        }
        sibling.post(EndpointEvent::CandidateReceived(forwarded));
    }

    /// Applies a candidate from the sibling, or queues it until the remote
    /// description is set. A refused candidate does not fail the endpoint.
    pub async fn receive_candidate(
        &self,
        this: &mut EndpointSlot,
        candidate: Option<IceCandidate>,
    ) -> Result<(), CandidateError> {
        let role = this.endpoint.role();
        match this.endpoint.candidate_received(candidate) {
            CandidateDisposition::Apply(candidate) => {
                if let Err(source) = this.transport.add_ice_candidate(&candidate).await {
                    this.endpoint.record_candidate_error();
                    return Err(CandidateError {
                        pair: self.pair,
                        role,
                        source,
                    });
                }
            }
            CandidateDisposition::Queued => {
                debug!(
                    "{} {}: candidate queued until remote description ({} waiting)",
                    self.pair,
                    role,
                    this.endpoint.pending_candidates()
                );
            }
            CandidateDisposition::EndOfCandidates => {
                debug!("{} {}: sibling finished gathering", self.pair, role);
            }
            CandidateDisposition::Ignored => {
                debug!("{} {}: closed, candidate ignored", self.pair, role);
            }
        }
        Ok(())
    }
}
