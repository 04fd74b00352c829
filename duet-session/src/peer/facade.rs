use crate::error::NegotiationError;
use crate::media::{LocalMedia, RemoteMedia};
use async_trait::async_trait;
use duet_core::SessionDescription;
use std::sync::Arc;

pub type RemoteTrackHandler = Box<dyn Fn(Arc<RemoteMedia>) + Send + Sync>;
pub type RenegotiationHandler = Box<dyn Fn() + Send + Sync>;
pub type ConnectionLostHandler = Box<dyn Fn() + Send + Sync>;

/// Узкий интерфейс к одному WebRTC соединению, которым пользуется сессия звонка.
///
/// Операции, меняющие дескрипшены, не должны пересекаться: реализация сразу
/// отвечает `NegotiationError::Busy`, если другая такая операция еще идет.
#[async_trait]
pub trait PeerConnectionFacade: Send + Sync {
    /// Создать offer, установить его как LocalDescription и вернуть.
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    /// Применить удаленный offer, создать и установить answer.
    async fn create_answer(
        &self,
        remote_offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError>;

    /// Применить answer на ранее отправленный offer.
    async fn set_remote_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError>;

    /// Добавляет только еще не зарегистрированные треки. Возвращает число добавленных.
    async fn attach_tracks(&self, media: &LocalMedia) -> Result<usize, NegotiationError>;

    async fn local_description(&self) -> Option<SessionDescription>;

    async fn remote_description(&self) -> Option<SessionDescription>;

    async fn on_remote_track(&self, handler: RemoteTrackHandler);

    async fn on_renegotiation_needed(&self, handler: RenegotiationHandler);

    /// Соединение упало или закрылось не по нашей инициативе.
    async fn on_connection_lost(&self, handler: ConnectionLostHandler);

    /// Идемпотентно. Снимает все обработчики до закрытия.
    async fn close(&self);
}

/// Creates a fresh facade for every call attempt.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self) -> anyhow::Result<Arc<dyn PeerConnectionFacade>>;
}
