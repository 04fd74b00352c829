use duet_session::CallState;

use crate::integration::init_tracing;
use crate::utils::{ALICE, BAD_SDP, BOB, SessionRig, incoming_call_frame};

#[tokio::test]
async fn test_answer_failure_keeps_state() {
    init_tracing();

    let mut rig = SessionRig::new(BOB).await;
    rig.deliver(&incoming_call_frame(ALICE, BAD_SDP)).await;

    assert_eq!(rig.session.state(), CallState::Idle);
    assert!(rig.session.correspondent().is_none());
    assert!(rig.relay.frames().await.is_empty());

    let failures = rig.observer.failures().await;
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("negotiation failed"));

    // A good offer afterwards still works
    rig.deliver(&incoming_call_frame(ALICE, "offer-ok")).await;
    assert_eq!(rig.session.state(), CallState::Answering);
}
