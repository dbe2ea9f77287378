use crate::control::ControlChannel;
use crate::media::{MediaElement, PositionDisplay, RenderSink};
use crate::sync::SelectionState;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tandem_core::{ChannelState, ControlCommand, PairIndex, RemoteStream, RemoteTrack, Role};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// What the controller knows about one pair.
struct PairLink {
    media: Arc<dyn MediaElement>,
    offerer_channel: Option<Arc<dyn ControlChannel>>,
    answerer_channel: Option<Arc<dyn ControlChannel>>,
    remote_stream: Option<RemoteStream>,
}

impl PairLink {
    fn channel(&self, role: Role) -> Option<&Arc<dyn ControlChannel>> {
        match role {
            Role::Offerer => self.offerer_channel.as_ref(),
            Role::Answerer => self.answerer_channel.as_ref(),
        }
    }

    fn channel_mut(&mut self, role: Role) -> &mut Option<Arc<dyn ControlChannel>> {
        match role {
            Role::Offerer => &mut self.offerer_channel,
            Role::Answerer => &mut self.answerer_channel,
        }
    }
}

struct Inner {
    links: DashMap<PairIndex, PairLink>,
    selection: Arc<SelectionState>,
    display: Arc<dyn PositionDisplay>,
    render: Arc<dyn RenderSink>,
}

/// Keeps playback of every pair in step with the selected viewer.
///
/// The offerer end of each control channel reports its local position and obeys
/// seek/play/pause; the answerer end feeds the position display and carries the
/// user's commands. Cheap to clone; every clone sees the same pairs.
#[derive(Clone)]
pub struct PlaybackSyncController {
    inner: Arc<Inner>,
}

impl PlaybackSyncController {
    pub fn new(
        selection: Arc<SelectionState>,
        display: Arc<dyn PositionDisplay>,
        render: Arc<dyn RenderSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                links: DashMap::new(),
                selection,
                display,
                render,
            }),
        }
    }

    pub fn selection(&self) -> &Arc<SelectionState> {
        &self.inner.selection
    }

    pub fn selected(&self) -> Option<PairIndex> {
        self.inner.selection.get()
    }

    pub fn register_pair(&self, pair: PairIndex, media: Arc<dyn MediaElement>) {
        self.inner.links.insert(
            pair,
            PairLink {
                media,
                offerer_channel: None,
                answerer_channel: None,
                remote_stream: None,
            },
        );
    }

    pub fn is_registered(&self, pair: PairIndex) -> bool {
        self.inner.links.contains_key(&pair)
    }

    /// Takes `channel` as the send handle of `role` unless one is already held.
    pub fn bind_channel(&self, pair: PairIndex, role: Role, channel: Arc<dyn ControlChannel>) -> bool {
        let Some(mut link) = self.inner.links.get_mut(&pair) else {
            warn!("{} {}: channel opened for unregistered pair", pair, role);
            return false;
        };

        let slot = link.channel_mut(role);
        if slot.is_some() {
            debug!("{} {}: already holds a control channel", pair, role);
            return false;
        }

        info!("{} {}: control channel '{}' bound", pair, role, channel.label());
        *slot = Some(channel);
        true
    }

    pub fn unbind_channel(&self, pair: PairIndex, role: Role) {
        if let Some(mut link) = self.inner.links.get_mut(&pair) {
            link.channel_mut(role).take();
        }
    }

    pub fn channel_state(&self, pair: PairIndex, role: Role) -> ChannelState {
        self.inner
            .links
            .get(&pair)
            .and_then(|link| link.channel(role).map(|c| c.state()))
            .unwrap_or(ChannelState::Closed)
    }

    /// Dispatches one message received by `role` of `pair`. Undecodable and
    /// misdirected messages are logged and dropped.
    pub fn handle_inbound(&self, pair: PairIndex, role: Role, text: &str) {
        let command = match ControlCommand::decode(text) {
            Ok(command) => command,
            Err(e) => {
                warn!("{} {}: ignoring control message {:?}: {}", pair, role, text, e);
                return;
            }
        };

        let Some(media) = self.inner.links.get(&pair).map(|link| link.media.clone()) else {
            warn!("{} {}: message for unregistered pair", pair, role);
            return;
        };

        match (role, command) {
            (Role::Offerer, ControlCommand::Seek(seconds)) => {
                debug!("{}: remote seek to {}", pair, seconds);
                media.seek(seconds);
            }
            (Role::Offerer, ControlCommand::Play) => {
                debug!("{}: remote play", pair);
                media.play();
            }
            (Role::Offerer, ControlCommand::Pause) => {
                debug!("{}: remote pause", pair);
                media.pause();
            }
            (Role::Answerer, ControlCommand::Time(seconds)) => {
                if self.inner.selection.is_selected(pair) {
                    self.inner.display.show_position(pair, seconds);
                } else {
                    trace!("{}: time {} dropped, pair not selected", pair, seconds);
                }
            }
            (role, command) => {
                warn!("{} {}: unexpected '{}', ignoring", pair, role, command);
            }
        }
    }

    /// Sends `time,<position>` on every open offerer channel. Returns how many went out.
    pub async fn broadcast_time(&self) -> usize {
        let targets: Vec<_> = self
            .inner
            .links
            .iter()
            .filter_map(|entry| {
                let channel = entry.value().offerer_channel.clone()?;
                channel
                    .is_open()
                    .then(|| (*entry.key(), entry.value().media.clone(), channel))
            })
            .collect();

        let mut sent = 0;
        for (pair, media, channel) in targets {
            let command = ControlCommand::Time(media.current_time());
            match channel.send_command(&command).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("{}: time broadcast failed: {}", pair, e),
            }
        }
        sent
    }

    /// Runs [`Self::broadcast_time`] every `interval`, first one interval from now.
    /// Abort the handle to stop.
    pub fn spawn_broadcast(&self, interval: Duration) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let sent = controller.broadcast_time().await;
                trace!("time broadcast to {} pairs", sent);
            }
        })
    }

    pub async fn seek(&self, seconds: f64) -> bool {
        self.send_to_selected(ControlCommand::Seek(seconds)).await
    }

    pub async fn play(&self) -> bool {
        self.send_to_selected(ControlCommand::Play).await
    }

    pub async fn pause(&self) -> bool {
        self.send_to_selected(ControlCommand::Pause).await
    }

    /// Selection takes effect for the next `time` message; the pair's stream is
    /// shown right away when it has one.
    pub fn select_pair(&self, pair: PairIndex) -> bool {
        if !self.inner.selection.select(pair) {
            warn!("{} cannot be selected", pair);
            return false;
        }
        if self.is_registered(pair) {
            info!("{} selected", pair);
        } else {
            info!("{} selected before it exists", pair);
        }

        let stream = self
            .inner
            .links
            .get(&pair)
            .and_then(|link| link.remote_stream.clone());
        if let Some(stream) = stream {
            self.inner.render.render(pair, &stream);
        }
        true
    }

    /// Records a track received by the answerer. Only the first track of a pair
    /// reaches the render sink.
    pub fn register_remote_track(&self, pair: PairIndex, stream_id: &str, track: RemoteTrack) {
        let added = {
            let Some(mut link) = self.inner.links.get_mut(&pair) else {
                warn!("{}: track for unregistered pair", pair);
                return;
            };
            match &mut link.remote_stream {
                Some(stream) => {
                    if !stream.tracks.iter().any(|t| t.track_id == track.track_id) {
                        stream.tracks.push(track);
                    }
                    None
                }
                None => {
                    let stream = RemoteStream::new(stream_id, track);
                    link.remote_stream = Some(stream.clone());
                    Some(stream)
                }
            }
        };

        if let Some(stream) = added {
            info!("{}: remote stream {} available", pair, stream.stream_id);
            self.inner.render.remote_stream_added(pair, &stream);
        }
    }

    pub fn remote_stream(&self, pair: PairIndex) -> Option<RemoteStream> {
        self.inner
            .links
            .get(&pair)
            .and_then(|link| link.remote_stream.clone())
    }

    async fn send_to_selected(&self, command: ControlCommand) -> bool {
        let Some(pair) = self.inner.selection.get() else {
            debug!("no pair selected, dropping '{}'", command);
            return false;
        };

        let channel = self
            .inner
            .links
            .get(&pair)
            .and_then(|link| link.answerer_channel.clone());
        let Some(channel) = channel.filter(|c| c.is_open()) else {
            debug!("{}: no open control channel, dropping '{}'", pair, command);
            return false;
        };

        match channel.send_command(&command).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: {}", pair, e);
                false
            }
        }
    }
}
