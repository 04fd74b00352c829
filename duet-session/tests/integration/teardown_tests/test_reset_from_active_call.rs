use duet_core::EndedBy;
use duet_session::{CallState, LocalMedia};

use crate::integration::init_tracing;
use crate::utils::{ALICE, BOB, SessionRig};

#[tokio::test]
async fn test_reset_from_active_call() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.call(BOB).await;
    let old_peer = rig.peer();

    rig.session.reset().await;

    assert_eq!(rig.session.state(), CallState::Idle);
    assert_eq!(rig.session.generation(), 1);
    assert!(rig.session.correspondent().is_none());
    assert_eq!(rig.relay.count("end-call").await, 1);
    assert_eq!(old_peer.close_calls(), 1);
    assert_eq!(rig.observer.ended_by().await, Some(EndedBy::Local));
    assert_eq!(
        rig.observer.states().await,
        vec![
            (CallState::Idle, CallState::Offering),
            (CallState::Offering, CallState::Ended),
            (CallState::Ended, CallState::Idle),
        ]
    );

    // The fresh facade can place a new call
    rig.call(BOB).await;
    assert_eq!(rig.session.state(), CallState::Offering);
    assert_eq!(rig.relay.count("call-user").await, 2);
}

#[tokio::test]
async fn test_reset_while_idle_keeps_local_media() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.attach(LocalMedia::audio_video()).await;
    let old_peer = rig.peer();

    rig.session.reset().await;

    assert_eq!(old_peer.close_calls(), 1);
    assert_eq!(rig.peer().sender_ids().len(), 2);
    assert_eq!(rig.session.state(), CallState::Idle);
    // Idle -> Idle is not a state change
    assert!(rig.observer.states().await.is_empty());
}

#[tokio::test]
async fn test_reset_survives_factory_failure() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.connected_call(BOB).await;
    rig.factory.set_failing(true);

    rig.session.reset().await;

    // The call still ended; the session waits for another reset
    assert_eq!(rig.session.state(), CallState::Ended);
    assert_eq!(rig.factory.created(), 1);
    assert!(
        rig.observer
            .failures()
            .await
            .iter()
            .any(|f| f.contains("failed to create peer connection"))
    );

    rig.factory.set_failing(false);
    rig.session.reset().await;
    assert_eq!(rig.session.state(), CallState::Idle);
}
