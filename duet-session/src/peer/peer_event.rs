use crate::media::RemoteMedia;
use std::sync::Arc;

/// События от WebRTC соединения для главного цикла сессии.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    RemoteTrack(Arc<RemoteMedia>),
    RenegotiationNeeded,
    ConnectionLost,
}

/// Событие с номером поколения соединения, которое его породило.
/// События от уже замененного соединения отбрасываются.
#[derive(Debug, Clone)]
pub struct TaggedPeerEvent {
    pub generation: u64,
    pub event: PeerEvent,
}
