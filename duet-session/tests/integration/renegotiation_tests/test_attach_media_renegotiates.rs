use duet_session::{CallState, LocalMedia, LocalTrack};

use crate::integration::init_tracing;
use crate::utils::{ALICE, BOB, SessionRig};

#[tokio::test]
async fn test_attach_media_renegotiates() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.connected_call(BOB).await;

    let media = LocalMedia::audio_video();
    rig.attach(media.clone()).await;

    assert_eq!(rig.peer().sender_ids().len(), 2);
    assert_eq!(rig.relay.count("call-user").await, 2);

    // Same stream again: no duplicate senders, nothing to renegotiate
    rig.attach(media.clone()).await;
    assert_eq!(rig.peer().sender_ids().len(), 2);
    assert_eq!(rig.relay.count("call-user").await, 2);

    // A new track on the stream is added on its own
    let extra = media.clone().with_track(LocalTrack::audio(media.stream_id()));
    rig.attach(extra).await;
    assert_eq!(rig.peer().sender_ids().len(), 3);
    assert_eq!(rig.relay.count("call-user").await, 3);

    assert_eq!(rig.session.state(), CallState::Connected);
}

#[tokio::test]
async fn test_remote_stream_replaces_previous() {
    init_tracing();

    let mut rig = SessionRig::new(ALICE).await;
    rig.call(BOB).await;
    let peer = rig.peer();

    // Remote media alone is enough to consider the call connected
    assert!(peer.fire_remote_track("first", &["a1"]));
    rig.settle().await;
    assert_eq!(rig.session.state(), CallState::Connected);

    assert!(peer.fire_remote_track("second", &["a2", "v2"]));
    rig.settle().await;

    let media = rig.session.remote_media().expect("remote media");
    assert_eq!(media.stream_id(), "second");
    assert_eq!(media.tracks().len(), 2);
    assert_eq!(
        rig.observer.last_remote_media().await,
        Some(Some("second".to_owned()))
    );
}
