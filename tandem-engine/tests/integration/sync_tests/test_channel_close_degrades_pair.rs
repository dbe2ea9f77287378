use tandem_engine::{ChannelState, EndpointState, PairIndex, Role};

use crate::integration::{CONNECT_TIMEOUT, create_test_session, init_tracing};
use crate::utils::MockConfig;

#[tokio::test]
async fn test_channel_close_degrades_pair() {
    init_tracing();

    let test = create_test_session(MockConfig::default(), 2).await;
    test.wait_all_connected().await;
    test.wait_channels_open().await;

    test.factory.link(PairIndex(0)).close_channel();
    test.handle(0)
        .wait_for(|s| s.channel == ChannelState::Closed, CONNECT_TIMEOUT)
        .await
        .expect("channel close not observed");

    let controller = test.session.controller();
    assert_eq!(controller.channel_state(PairIndex(0), Role::Answerer), ChannelState::Closed);

    controller.select_pair(PairIndex(0));
    assert!(!controller.seek(5.0).await);
    assert_eq!(controller.broadcast_time().await, 1);

    // The other pair keeps working.
    controller.select_pair(PairIndex(1));
    assert!(controller.play().await);

    test.session.shutdown().await;
    for handle in &test.handles {
        let status = handle.status();
        assert_eq!(status.offerer, EndpointState::Closed);
        assert_eq!(status.answerer, EndpointState::Closed);
    }
}
