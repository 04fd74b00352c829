use async_trait::async_trait;
use duet_core::{EndedBy, PeerIdentity, RoomId};
use duet_session::{CallError, CallObserver, CallState, RemoteMedia};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Event types that can be recorded by RecordingObserver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    StateChanged { from: CallState, to: CallState },
    PeerIdentified(PeerIdentity),
    /// Stream id of the presented media, `None` when it was cleared.
    RemoteMedia(Option<String>),
    CallEnded(EndedBy),
    RoomJoined(RoomId),
    /// Display form of the reported error.
    Failure(String),
}

/// A test implementation of CallObserver that records all events.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded events.
    pub async fn get_events(&self) -> Vec<ObservedEvent> {
        self.events.lock().await.clone()
    }

    /// Wait until at least `count` events are recorded.
    pub async fn wait_for_events(&self, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.events.lock().await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// Wait until the session reports a transition into `state`.
    pub async fn wait_for_state(&self, state: CallState, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.states().await.iter().any(|(_, to)| *to == state) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// Wait until at least `count` transitions are recorded.
    pub async fn wait_for_transitions(&self, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.states().await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// All recorded transitions, in order.
    pub async fn states(&self) -> Vec<(CallState, CallState)> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub async fn failures(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Failure(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn ended_by(&self) -> Option<EndedBy> {
        self.events.lock().await.iter().find_map(|e| match e {
            ObservedEvent::CallEnded(by) => Some(by.clone()),
            _ => None,
        })
    }

    pub async fn last_remote_media(&self) -> Option<Option<String>> {
        self.events.lock().await.iter().rev().find_map(|e| match e {
            ObservedEvent::RemoteMedia(media) => Some(media.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl CallObserver for RecordingObserver {
    async fn on_state_changed(&self, from: CallState, to: CallState) {
        tracing::info!("[RecordingObserver] {} -> {}", from, to);
        self.events
            .lock()
            .await
            .push(ObservedEvent::StateChanged { from, to });
    }

    async fn on_peer_identified(&self, peer: &PeerIdentity) {
        self.events
            .lock()
            .await
            .push(ObservedEvent::PeerIdentified(peer.clone()));
    }

    async fn on_remote_media(&self, media: Option<Arc<RemoteMedia>>) {
        let stream_id = media.map(|m| m.stream_id().to_owned());
        self.events
            .lock()
            .await
            .push(ObservedEvent::RemoteMedia(stream_id));
    }

    async fn on_call_ended(&self, ended_by: &EndedBy) {
        tracing::info!("[RecordingObserver] call ended by {}", ended_by);
        self.events
            .lock()
            .await
            .push(ObservedEvent::CallEnded(ended_by.clone()));
    }

    async fn on_room_joined(&self, room: &RoomId) {
        self.events
            .lock()
            .await
            .push(ObservedEvent::RoomJoined(room.clone()));
    }

    async fn on_failure(&self, error: &CallError) {
        tracing::info!("[RecordingObserver] failure: {}", error);
        self.events
            .lock()
            .await
            .push(ObservedEvent::Failure(error.to_string()));
    }
}
