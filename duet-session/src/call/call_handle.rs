use crate::call::call_command::CallCommand;
use crate::call::call_observer::CallObserver;
use crate::call::call_session::CallSession;
use crate::error::CallError;
use crate::media::{LocalMedia, MediaSource};
use crate::peer::PeerFactory;
use crate::signaling::SignalingClient;
use duet_core::{PeerIdentity, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Отправитель намерений в запущенную `CallSession`.
/// Сессия завершается, когда все копии handle уничтожены.
#[derive(Clone)]
pub struct CallHandle {
    command_tx: mpsc::Sender<CallCommand>,
}

impl CallHandle {
    /// Создает сессию и запускает ее главный цикл в отдельной задаче.
    pub async fn spawn(
        self_id: PeerIdentity,
        signaling: SignalingClient,
        peer_factory: Arc<dyn PeerFactory>,
        observer: Arc<dyn CallObserver>,
    ) -> anyhow::Result<(Self, JoinHandle<()>)> {
        info!("Starting call session for {}", self_id);
        let (command_tx, command_rx) = mpsc::channel(100);

        let session =
            CallSession::new(self_id, command_rx, signaling, peer_factory, observer).await?;
        let task = tokio::spawn(session.run());

        Ok((Self { command_tx }, task))
    }

    async fn send(&self, cmd: CallCommand) -> Result<(), CallError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| CallError::SessionClosed)
    }

    pub async fn join_room(&self, room: RoomId) -> Result<(), CallError> {
        self.send(CallCommand::JoinRoom { room }).await
    }

    pub async fn connect_to(&self, peer: PeerIdentity) -> Result<(), CallError> {
        self.send(CallCommand::ConnectTo { peer }).await
    }

    pub async fn attach_local_media(&self, media: LocalMedia) -> Result<(), CallError> {
        self.send(CallCommand::AttachLocalMedia { media }).await
    }

    pub async fn media_unavailable(&self, reason: impl Into<String>) -> Result<(), CallError> {
        self.send(CallCommand::MediaUnavailable {
            reason: reason.into(),
        })
        .await
    }

    /// Захватить медиа из источника и передать его сессии.
    /// При неудаче сессия узнает, что медиа недоступно, а вызывающий получает `None`.
    pub async fn acquire_media(
        &self,
        source: &dyn MediaSource,
    ) -> Result<Option<LocalMedia>, CallError> {
        match source.acquire().await {
            Ok(media) => {
                self.attach_local_media(media.clone()).await?;
                Ok(Some(media))
            }
            Err(e) => {
                warn!("Failed to acquire local media: {}", e);
                self.media_unavailable(e.to_string()).await?;
                Ok(None)
            }
        }
    }

    pub async fn end_call(&self) -> Result<(), CallError> {
        self.send(CallCommand::EndCall).await
    }

    pub async fn reset(&self) -> Result<(), CallError> {
        self.send(CallCommand::Reset).await
    }

    pub async fn shutdown(&self) -> Result<(), CallError> {
        self.send(CallCommand::Shutdown).await
    }
}
