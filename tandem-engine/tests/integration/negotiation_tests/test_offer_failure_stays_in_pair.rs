use std::collections::HashSet;
use std::time::Duration;

use tandem_engine::{EndpointState, PairIndex, SessionError};

use crate::integration::{CONNECT_TIMEOUT, create_test_session, init_tracing};
use crate::utils::MockConfig;

#[tokio::test]
async fn test_offer_failure_stays_in_pair() {
    init_tracing();

    let config = MockConfig {
        fail_offer_for: HashSet::from([PairIndex(0)]),
        ..Default::default()
    };
    let test = create_test_session(config, 2).await;

    let failed = test.handle(0).wait_connected(Duration::from_secs(2)).await;
    assert!(matches!(failed, Err(SessionError::PairFailed(PairIndex(0)))));

    let status = test.handle(0).status();
    assert_eq!(status.offerer, EndpointState::Failed);
    assert_eq!(status.answerer, EndpointState::New);
    assert_eq!(status.setup_ms, None);

    // The sibling pair negotiates as if nothing happened.
    let other = test
        .handle(1)
        .wait_connected(CONNECT_TIMEOUT)
        .await
        .expect("pair 1 should connect");
    assert!(other.is_connected());
    assert!(!test.factory.link(PairIndex(0)).is_connected());

    test.session.shutdown().await;
}
