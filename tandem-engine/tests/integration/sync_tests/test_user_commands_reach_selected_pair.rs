use tandem_engine::{PairIndex, Role};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{MediaCall, MockConfig, wait_until};

#[tokio::test]
async fn test_user_commands_reach_selected_pair() {
    init_tracing();

    let test = create_test_session(MockConfig::default(), 2).await;
    test.wait_all_connected().await;
    test.wait_channels_open().await;

    let controller = test.session.controller();

    // Nothing selected yet: dropped without queueing.
    assert!(!controller.play().await);

    controller.select_pair(PairIndex(1));
    assert!(controller.seek(30.0).await);
    assert!(controller.pause().await);

    assert!(
        wait_until(2000, || test.media[1].calls()
            == vec![MediaCall::Seek(30.0), MediaCall::Pause])
        .await
    );
    assert!(test.media[0].calls().is_empty());

    let link = test.factory.link(PairIndex(1));
    assert_eq!(link.sent_messages(Role::Answerer), vec!["seek,30", "pause,"]);
    assert!(test.factory.link(PairIndex(0)).sent_messages(Role::Answerer).is_empty());

    test.session.shutdown().await;
}
