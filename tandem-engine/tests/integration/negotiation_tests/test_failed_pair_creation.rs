use std::sync::Arc;

use tandem_engine::{MediaTracks, PairIndex, Session, SessionError, TandemConfig};

use crate::integration::{CONNECT_TIMEOUT, init_tracing};
use crate::utils::{MockConfig, MockTransportFactory, RecordingDisplay, RecordingMedia, RecordingRender};

#[tokio::test]
async fn test_failed_pair_creation() {
    init_tracing();

    let factory = MockTransportFactory::new(MockConfig::default());
    let session = Session::new(
        TandemConfig::default(),
        Arc::new(factory.clone()),
        Arc::new(RecordingDisplay::default()),
        Arc::new(RecordingRender::default()),
    );

    factory.fail_next_create();
    let failed = session.add_pair(Arc::new(RecordingMedia::new(10.0))).await;
    assert!(matches!(
        failed,
        Err(SessionError::Transport {
            pair: PairIndex(0),
            ..
        })
    ));

    // Nothing is left behind for the failed pair.
    assert!(!session.controller().is_registered(PairIndex(0)));
    assert!(session.pairs().is_empty());
    assert!(session.pair(PairIndex(0)).is_err());

    // The next pair takes the same index and works.
    let handle = session
        .add_pair(Arc::new(RecordingMedia::new(20.0)))
        .await
        .expect("Failed to add pair");
    assert_eq!(handle.index(), PairIndex(0));
    assert!(session.controller().is_registered(PairIndex(0)));

    handle
        .tracks_ready(MediaTracks::audio_video())
        .await
        .expect("Failed to hand over tracks");
    handle
        .wait_connected(CONNECT_TIMEOUT)
        .await
        .expect("pair should connect");

    session.shutdown().await;
}
