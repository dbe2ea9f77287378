use tandem_engine::{PairIndex, Role};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::MockConfig;

#[tokio::test]
async fn test_candidates_before_remote_description() {
    init_tracing();

    let config = MockConfig {
        candidates_per_endpoint: 3,
        early_candidates: true,
        ..Default::default()
    };
    let test = create_test_session(config, 1).await;
    test.wait_all_connected().await;

    let link = test.factory.link(PairIndex(0));

    // Nothing was handed to the transport before its remote description existed.
    assert_eq!(link.rejected_candidates(Role::Answerer), 0);
    assert_eq!(link.rejected_candidates(Role::Offerer), 0);

    let applied: Vec<_> = link
        .applied_candidates(Role::Answerer)
        .into_iter()
        .map(|c| c.candidate)
        .collect();
    assert_eq!(applied.len(), 3);
    for (n, candidate) in applied.iter().enumerate() {
        assert!(
            candidate.starts_with(&format!("candidate:{n} ")),
            "candidate {n} out of order: {candidate}"
        );
    }

    test.session.shutdown().await;
}
