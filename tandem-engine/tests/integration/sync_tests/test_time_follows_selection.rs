use tandem_engine::PairIndex;

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{MockConfig, wait_until};

#[tokio::test]
async fn test_time_follows_selection() {
    init_tracing();

    let test = create_test_session(MockConfig::default(), 2).await;
    test.wait_all_connected().await;
    test.wait_channels_open().await;
    let controller = test.session.controller();

    // Broadcasting goes out regardless of selection, but nothing is shown.
    assert_eq!(controller.broadcast_time().await, 2);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(test.display.positions().is_empty());

    assert!(wait_until(2000, || test.render.added().len() == 2).await);
    controller.select_pair(PairIndex(0));
    assert_eq!(test.render.rendered(), vec![PairIndex(0)]);
    assert_eq!(controller.broadcast_time().await, 2);

    assert!(wait_until(2000, || !test.display.positions().is_empty()).await);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(test.display.positions(), vec![(PairIndex(0), 10.0)]);

    test.session.shutdown().await;
}
