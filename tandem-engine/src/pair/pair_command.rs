use crate::media::MediaTracks;
use tokio::sync::oneshot;

/// Commands a pair's event loop accepts from outside.
pub enum PairCommand {
    /// The media source has its tracks; attach them and start negotiating.
    /// Only the first one counts.
    TracksReady(MediaTracks),

    /// Close both peer connections and stop the event loop.
    Close { done: oneshot::Sender<()> },
}
