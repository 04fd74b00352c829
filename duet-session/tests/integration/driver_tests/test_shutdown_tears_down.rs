use std::sync::Arc;

use duet_core::{InboundKind, PeerIdentity};
use duet_session::{CallCommand, CallError, CallHandle, CallState, SignalingClient};

use crate::integration::init_tracing;
use crate::utils::{
    ALICE, BOB, MockPeerFactory, MockRelay, RecordingObserver, SESSION_TIMEOUT_MS, SessionRig,
};

#[tokio::test]
async fn test_shutdown_tears_down() {
    init_tracing();

    let relay = MockRelay::new_stored_only();
    let signaling = SignalingClient::new(Box::new(relay.clone()));
    let factory = Arc::new(MockPeerFactory::new());
    let observer = RecordingObserver::new();

    let (handle, task) = CallHandle::spawn(
        PeerIdentity::from(ALICE),
        signaling.clone(),
        factory.clone(),
        Arc::new(observer.clone()),
    )
    .await
    .expect("Failed to spawn session");

    for kind in InboundKind::ALL {
        assert_eq!(signaling.handler_count(kind), 1);
    }

    handle
        .connect_to(PeerIdentity::from(BOB))
        .await
        .expect("Session closed");
    assert!(observer.wait_for_state(CallState::Offering, SESSION_TIMEOUT_MS).await);

    handle.shutdown().await.expect("Session closed");
    tokio::time::timeout(std::time::Duration::from_millis(SESSION_TIMEOUT_MS), task)
        .await
        .expect("Session did not stop")
        .expect("Session task panicked");

    // Active call is hung up, facade closed once, relay handlers gone
    assert_eq!(relay.count("end-call").await, 1);
    assert_eq!(factory.latest().close_calls(), 1);
    for kind in InboundKind::ALL {
        assert_eq!(signaling.handler_count(kind), 0);
    }

    let err = handle.end_call().await.unwrap_err();
    assert!(matches!(err, CallError::SessionClosed));
}

#[tokio::test]
async fn test_shutdown_command_only_stops_the_loop() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.call(BOB).await;

    let flow = rig.session.handle_command(CallCommand::Shutdown).await;

    // Teardown belongs to `run`; stepping the command leaves the call alone
    assert!(flow.is_break());
    assert_eq!(rig.session.state(), CallState::Offering);
    assert_eq!(rig.peer().close_calls(), 0);
    assert_eq!(rig.relay.count("end-call").await, 0);

    let flow = rig.session.handle_command(CallCommand::EndCall).await;
    assert!(flow.is_continue());
    assert_eq!(rig.session.state(), CallState::Ended);
}
