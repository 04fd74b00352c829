use crate::media::LocalMedia;
use duet_core::{PeerIdentity, RoomId};

/// Намерения пользователя, поступающие в сессию через `CallHandle`.
#[derive(Debug)]
pub enum CallCommand {
    JoinRoom { room: RoomId },
    /// Позвонить пиру: создать offer и отправить `call-user`.
    ConnectTo { peer: PeerIdentity },
    /// Передать сессии локальные треки.
    AttachLocalMedia { media: LocalMedia },
    /// Захват медиа не удался (нет устройств или отказ пользователя).
    MediaUnavailable { reason: String },
    EndCall,
    Reset,
    Shutdown,
}
