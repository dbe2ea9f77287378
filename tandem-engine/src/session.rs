use crate::error::SessionError;
use crate::media::{MediaElement, MediaTracks, PositionDisplay, RenderSink};
use crate::pair::{ConnectionPair, PairHandle};
use crate::sync::{PlaybackSyncController, SelectionState};
use crate::transport::TransportFactory;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tandem_core::{PairIndex, TandemConfig};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the pairs of one process and the controller they share.
#[derive(Clone)]
pub struct Session {
    config: Arc<TandemConfig>,
    factory: Arc<dyn TransportFactory>,
    controller: PlaybackSyncController,
    pairs: Arc<DashMap<PairIndex, PairHandle>>,
    next_index: Arc<AtomicUsize>,
}

impl Session {
    pub fn new(
        config: TandemConfig,
        factory: Arc<dyn TransportFactory>,
        display: Arc<dyn PositionDisplay>,
        render: Arc<dyn RenderSink>,
    ) -> Self {
        let selection = Arc::new(SelectionState::new());
        Self {
            config: Arc::new(config),
            factory,
            controller: PlaybackSyncController::new(selection, display, render),
            pairs: Arc::new(DashMap::new()),
            next_index: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &TandemConfig {
        &self.config
    }

    pub fn controller(&self) -> &PlaybackSyncController {
        &self.controller
    }

    /// Creates the next pair around `media` and spawns its event loop. Indices are
    /// handed out from 0 in creation order.
    pub async fn add_pair(&self, media: Arc<dyn MediaElement>) -> Result<PairHandle, SessionError> {
        let index = PairIndex(self.next_index.fetch_add(1, Ordering::SeqCst));

        let connected = ConnectionPair::connect(
            index,
            self.factory.as_ref(),
            &self.config.transport,
            self.controller.clone(),
        )
        .await;
        let (pair, handle) = match connected {
            Ok(built) => built,
            Err(e) => {
                // Give the index back unless a later pair already took the next one
                let _ = self.next_index.compare_exchange(
                    index.get() + 1,
                    index.get(),
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                return Err(e);
            }
        };

        // Nothing reaches the controller before `run`, so registering here is in time
        self.controller.register_pair(index, media);
        info!("Creating {}", index);
        tokio::spawn(pair.run());
        self.pairs.insert(index, handle.clone());
        Ok(handle)
    }

    pub fn pair(&self, index: PairIndex) -> Result<PairHandle, SessionError> {
        self.pairs
            .get(&index)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::UnknownPair(index))
    }

    /// Handles of every pair, ordered by index.
    pub fn pairs(&self) -> Vec<PairHandle> {
        let mut handles: Vec<_> = self.pairs.iter().map(|e| e.value().clone()).collect();
        handles.sort_by_key(|h| h.index());
        handles
    }

    pub async fn tracks_ready(&self, index: PairIndex, tracks: MediaTracks) -> Result<(), SessionError> {
        self.pair(index)?.tracks_ready(tracks).await
    }

    /// Starts the periodic `time` broadcast at the configured interval.
    pub fn start_broadcast(&self) -> JoinHandle<()> {
        self.controller
            .spawn_broadcast(self.config.sync.broadcast_interval())
    }

    /// Closes every pair and waits for their event loops to finish.
    pub async fn shutdown(&self) {
        let handles = self.pairs();
        self.pairs.clear();

        let results = join_all(handles.iter().map(|h| h.close())).await;
        for (handle, result) in handles.iter().zip(results) {
            if let Err(e) = result {
                warn!("{}: {}", handle.index(), e);
            }
        }
        info!("Session closed");
    }
}
