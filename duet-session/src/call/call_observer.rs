use crate::call::call_state::CallState;
use crate::error::CallError;
use crate::media::RemoteMedia;
use async_trait::async_trait;
use duet_core::{EndedBy, PeerIdentity, RoomId};
use std::sync::Arc;

/// Внешние наблюдаемые изменения сессии (UI, консоль, тесты).
#[async_trait]
pub trait CallObserver: Send + Sync + 'static {
    async fn on_state_changed(&self, from: CallState, to: CallState);

    /// Собеседник стал известен (отправили или приняли offer).
    async fn on_peer_identified(&self, peer: &PeerIdentity);

    /// `None` означает, что удаленный поток пропал.
    async fn on_remote_media(&self, media: Option<Arc<RemoteMedia>>);

    async fn on_call_ended(&self, ended_by: &EndedBy);

    async fn on_room_joined(&self, _room: &RoomId) {}

    async fn on_failure(&self, _error: &CallError) {}
}
