use crate::error::SessionError;
use crate::media::MediaTracks;
use crate::pair::PairCommand;
use std::time::Duration;
use tandem_core::{PairIndex, PairStatus};
use tokio::sync::{mpsc, oneshot, watch};

/// Outside view of a running pair.
#[derive(Clone)]
pub struct PairHandle {
    index: PairIndex,
    command_tx: mpsc::Sender<PairCommand>,
    status_rx: watch::Receiver<PairStatus>,
}

impl PairHandle {
    pub(crate) fn new(
        index: PairIndex,
        command_tx: mpsc::Sender<PairCommand>,
        status_rx: watch::Receiver<PairStatus>,
    ) -> Self {
        Self {
            index,
            command_tx,
            status_rx,
        }
    }

    pub fn index(&self) -> PairIndex {
        self.index
    }

    pub fn status(&self) -> PairStatus {
        *self.status_rx.borrow()
    }

    pub async fn tracks_ready(&self, tracks: MediaTracks) -> Result<(), SessionError> {
        self.command_tx
            .send(PairCommand::TracksReady(tracks))
            .await
            .map_err(|_| SessionError::PairStopped(self.index))
    }

    /// Closes both endpoints and waits for the event loop to finish.
    pub async fn close(&self) -> Result<(), SessionError> {
        let (done, closed) = oneshot::channel();
        self.command_tx
            .send(PairCommand::Close { done })
            .await
            .map_err(|_| SessionError::PairStopped(self.index))?;
        closed
            .await
            .map_err(|_| SessionError::PairStopped(self.index))
    }

    pub async fn wait_for<F>(&self, pred: F, timeout: Duration) -> Result<PairStatus, SessionError>
    where
        F: FnMut(&PairStatus) -> bool,
    {
        let mut rx = self.status_rx.clone();
        match tokio::time::timeout(timeout, rx.wait_for(pred)).await {
            Ok(Ok(status)) => Ok(*status),
            Ok(Err(_)) => Err(SessionError::PairStopped(self.index)),
            Err(_) => Err(SessionError::Timeout {
                pair: self.index,
                timeout,
            }),
        }
    }

    /// Waits until both endpoints report connected. Fails early once either side
    /// fails or closes.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<PairStatus, SessionError> {
        let status = self
            .wait_for(|s| s.is_connected() || s.is_terminal(), timeout)
            .await?;
        if status.is_connected() {
            Ok(status)
        } else {
            Err(SessionError::PairFailed(self.index))
        }
    }
}
