use duet_session::CallState;

use crate::integration::init_tracing;
use crate::utils::{ALICE, BOB, CAROL, SessionRig, call_accept_frame};

#[tokio::test]
async fn test_call_accept_from_stranger_is_ignored() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.call(BOB).await;
    rig.deliver(&call_accept_frame(Some(CAROL), "answer-C")).await;

    assert_eq!(rig.session.state(), CallState::Offering);
    assert!(rig.peer().remote().is_none());
}

#[tokio::test]
async fn test_duplicate_call_accept_is_only_logged() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.connected_call(BOB).await;
    rig.deliver(&call_accept_frame(Some(BOB), "answer-again")).await;

    assert_eq!(rig.session.state(), CallState::Connected);
    assert!(rig.observer.failures().await.is_empty());
}

#[tokio::test]
async fn test_call_accept_while_idle_is_ignored() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.deliver(&call_accept_frame(Some(BOB), "answer-A")).await;

    assert_eq!(rig.session.state(), CallState::Idle);
    assert!(rig.observer.get_events().await.is_empty());
}
