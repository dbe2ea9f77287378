use crate::error::NegotiationError;
use std::collections::VecDeque;
use tandem_core::{EndpointState, IceCandidate, PairIndex, PeerConnectionState, Role, SdpKind};

/// What to do with a candidate forwarded by the sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateDisposition {
    /// Remote description is in place; add it to the transport now.
    Apply(IceCandidate),
    /// Held until the remote description is set.
    Queued,
    /// End-of-candidates marker. Nothing to add.
    EndOfCandidates,
    /// The endpoint is closed.
    Ignored,
}

/// Negotiation state machine of one endpoint. Holds no transport; the pair event
/// loop asks it what the next state would be, performs the transport call, and
/// only then commits.
#[derive(Debug)]
pub struct Endpoint {
    pair: PairIndex,
    role: Role,
    state: EndpointState,
    has_remote_description: bool,
    local_candidates: Vec<IceCandidate>,
    pending_remote: VecDeque<IceCandidate>,
    local_gathering_complete: bool,
    remote_gathering_complete: bool,
    candidate_errors: u32,
}

impl Endpoint {
    pub fn new(pair: PairIndex, role: Role) -> Self {
        Self {
            pair,
            role,
            state: EndpointState::New,
            has_remote_description: false,
            local_candidates: Vec::new(),
            pending_remote: VecDeque::new(),
            local_gathering_complete: false,
            remote_gathering_complete: false,
            candidate_errors: 0,
        }
    }

    pub fn pair(&self) -> PairIndex {
        self.pair
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn sibling(&self) -> Role {
        self.role.sibling()
    }

    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// Candidates this endpoint produced, in generation order.
    pub fn local_candidates(&self) -> &[IceCandidate] {
        &self.local_candidates
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_remote.len()
    }

    pub fn local_gathering_complete(&self) -> bool {
        self.local_gathering_complete
    }

    pub fn remote_gathering_complete(&self) -> bool {
        self.remote_gathering_complete
    }

    /// Candidates the transport refused to add.
    pub fn candidate_errors(&self) -> u32 {
        self.candidate_errors
    }

    /// A refused candidate is counted and otherwise has no effect on the state.
    pub fn record_candidate_error(&mut self) {
        self.candidate_errors += 1;
    }

    /// State after storing a local description of `kind`.
    pub fn next_on_local(&self, kind: SdpKind) -> Result<EndpointState, NegotiationError> {
        match (self.role, kind, self.state) {
            (Role::Offerer, SdpKind::Offer, EndpointState::New) => {
                Ok(EndpointState::HaveLocalOffer)
            }
            (Role::Answerer, SdpKind::Answer, EndpointState::HaveRemoteOffer) => {
                Ok(EndpointState::Stable)
            }
            _ => Err(self.invalid(match kind {
                SdpKind::Offer => "set local offer",
                SdpKind::Answer => "set local answer",
            })),
        }
    }

    /// State after applying the sibling's description of `kind`.
    pub fn next_on_remote(&self, kind: SdpKind) -> Result<EndpointState, NegotiationError> {
        match (self.role, kind, self.state) {
            (Role::Answerer, SdpKind::Offer, EndpointState::New) => {
                Ok(EndpointState::HaveRemoteOffer)
            }
            (Role::Offerer, SdpKind::Answer, EndpointState::HaveLocalOffer) => {
                Ok(EndpointState::Stable)
            }
            _ => Err(self.invalid(match kind {
                SdpKind::Offer => "set remote offer",
                SdpKind::Answer => "set remote answer",
            })),
        }
    }

    /// Commits a state returned by [`Endpoint::next_on_local`].
    pub fn local_applied(&mut self, next: EndpointState) {
        self.state = next;
    }

    /// Commits a state returned by [`Endpoint::next_on_remote`] and hands back the
    /// candidates that were waiting for it, oldest first.
    pub fn remote_applied(&mut self, next: EndpointState) -> Vec<IceCandidate> {
        self.state = next;
        self.has_remote_description = true;
        self.pending_remote.drain(..).collect()
    }

    /// Records a locally gathered candidate and returns what to forward to the sibling.
    pub fn candidate_generated(&mut self, candidate: Option<IceCandidate>) -> Option<IceCandidate> {
        match &candidate {
            Some(c) if !c.is_end_of_candidates() => self.local_candidates.push(c.clone()),
            _ => self.local_gathering_complete = true,
        }
        candidate
    }

    pub fn candidate_received(&mut self, candidate: Option<IceCandidate>) -> CandidateDisposition {
        if self.state == EndpointState::Closed {
            return CandidateDisposition::Ignored;
        }

        let candidate = match candidate {
            Some(c) if !c.is_end_of_candidates() => c,
            _ => {
                self.remote_gathering_complete = true;
                return CandidateDisposition::EndOfCandidates;
            }
        };

        if self.has_remote_description {
            CandidateDisposition::Apply(candidate)
        } else {
            self.pending_remote.push_back(candidate);
            CandidateDisposition::Queued
        }
    }

    /// Folds an observed transport state in. Returns the new state when it changed.
    pub fn observe(&mut self, observed: PeerConnectionState) -> Option<EndpointState> {
        let next = match observed {
            PeerConnectionState::New | PeerConnectionState::Connecting => return None,
            PeerConnectionState::Connected => EndpointState::Connected,
            PeerConnectionState::Disconnected => EndpointState::Disconnected,
            PeerConnectionState::Failed => EndpointState::Failed,
            PeerConnectionState::Closed => EndpointState::Closed,
        };

        match self.state {
            EndpointState::Closed => return None,
            EndpointState::Failed if next != EndpointState::Closed => return None,
            _ => {}
        }

        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next)
    }

    pub fn fail(&mut self) {
        if self.state != EndpointState::Closed {
            self.state = EndpointState::Failed;
        }
    }

    pub fn close(&mut self) {
        self.state = EndpointState::Closed;
        self.pending_remote.clear();
    }

    fn invalid(&self, action: &'static str) -> NegotiationError {
        NegotiationError::InvalidTransition {
            pair: self.pair,
            role: self.role,
            action,
            state: self.state,
        }
    }
}
