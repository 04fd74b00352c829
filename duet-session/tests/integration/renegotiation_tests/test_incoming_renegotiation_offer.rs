use duet_core::SessionDescription;
use duet_session::CallState;

use crate::integration::init_tracing;
use crate::utils::{ALICE, BOB, SessionRig, call_accept_frame, incoming_call_frame};

#[tokio::test]
async fn test_incoming_renegotiation_offer() {
    init_tracing();

    let mut rig = SessionRig::new(BOB).await;
    rig.deliver(&incoming_call_frame(ALICE, "offer-1")).await;
    assert!(rig.peer().fire_remote_track("alice-stream", &["alice-audio"]));
    rig.settle().await;
    assert_eq!(rig.session.state(), CallState::Connected);

    // Caller added tracks and offers again: last writer wins
    rig.deliver(&incoming_call_frame(ALICE, "offer-2")).await;

    let sent = rig.relay.frames_named("call-accept").await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1]["data"]["peerId"], ALICE);
    assert_eq!(rig.peer().remote(), Some(SessionDescription::offer("offer-2")));
    assert_eq!(rig.session.state(), CallState::Connected);
}

#[tokio::test]
async fn test_answerer_renegotiation_connects_on_accept() {
    init_tracing();

    let mut rig = SessionRig::new(BOB).await;
    rig.deliver(&incoming_call_frame(ALICE, "offer-1")).await;
    assert_eq!(rig.session.state(), CallState::Answering);

    // The answerer's own renegotiation offer gets answered by the caller
    assert!(rig.peer().fire_renegotiation());
    rig.settle().await;
    assert_eq!(rig.relay.count("call-user").await, 1);

    rig.deliver(&call_accept_frame(Some(ALICE), "alice-answer")).await;

    assert_eq!(rig.session.state(), CallState::Connected);
    assert_eq!(
        rig.observer.states().await,
        vec![
            (CallState::Idle, CallState::Answering),
            (CallState::Answering, CallState::Connected),
        ]
    );
}
