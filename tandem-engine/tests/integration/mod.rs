//! Integration tests for tandem-engine.
//!
//! Tests are organized by functionality:
//! - `negotiation_tests` - offer/answer/ICE exchange over mock transports
//! - `sync_tests` - control channel commands, time gating, degradation
//! - `rtc_tests` - one pair over real webrtc-rs peer connections

pub mod sync_tests;

use std::sync::Arc;
use std::time::Duration;

use tracing::Level;

use tandem_engine::{
    ChannelState, MediaTracks, PairHandle, PairIndex, Role, Session, TandemConfig,
};

use crate::utils::{
    MockConfig, MockTransportFactory, RecordingDisplay, RecordingMedia, RecordingRender,
    wait_until,
};

/// Timeout for a mock pair to connect.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A session over mock transports together with its recording doubles.
pub struct TestSession {
    pub session: Session,
    pub factory: MockTransportFactory,
    pub handles: Vec<PairHandle>,
    pub media: Vec<Arc<RecordingMedia>>,
    pub display: Arc<RecordingDisplay>,
    pub render: Arc<RecordingRender>,
}

impl TestSession {
    pub fn handle(&self, pair: usize) -> &PairHandle {
        &self.handles[pair]
    }

    pub async fn wait_all_connected(&self) {
        for handle in &self.handles {
            handle
                .wait_connected(CONNECT_TIMEOUT)
                .await
                .expect("pair did not connect");
        }
    }

    /// Waits until both ends of every pair hold an open control channel.
    pub async fn wait_channels_open(&self) {
        let controller = self.session.controller();
        let open = wait_until(CONNECT_TIMEOUT.as_millis() as u64, || {
            self.handles.iter().all(|h| {
                Role::BOTH
                    .iter()
                    .all(|role| controller.channel_state(h.index(), *role) == ChannelState::Open)
            })
        })
        .await;
        assert!(open, "control channels did not open");
    }
}

/// Creates `pairs` pairs whose media sit at 10 s, 20 s, ... and hands each one an
/// audio/video track set.
pub async fn create_test_session(config: MockConfig, pairs: usize) -> TestSession {
    let factory = MockTransportFactory::new(config);
    let display = Arc::new(RecordingDisplay::default());
    let render = Arc::new(RecordingRender::default());
    let session = Session::new(
        TandemConfig::default(),
        Arc::new(factory.clone()),
        display.clone(),
        render.clone(),
    );

    let mut handles = Vec::new();
    let mut media = Vec::new();
    for i in 0..pairs {
        let element = Arc::new(RecordingMedia::new(10.0 * (i + 1) as f64));
        let handle = session
            .add_pair(element.clone())
            .await
            .expect("Failed to add pair");
        assert_eq!(handle.index(), PairIndex(i));
        handle
            .tracks_ready(MediaTracks::audio_video())
            .await
            .expect("Failed to hand over tracks");
        handles.push(handle);
        media.push(element);
    }

    TestSession {
        session,
        factory,
        handles,
        media,
        display,
        render,
    }
}
