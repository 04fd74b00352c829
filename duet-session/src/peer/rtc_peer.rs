use crate::error::NegotiationError;
use crate::media::{LocalMedia, RemoteMedia, RemoteTrack};
use crate::peer::facade::{
    ConnectionLostHandler, PeerConnectionFacade, PeerFactory, RemoteTrackHandler,
    RenegotiationHandler,
};
use crate::peer::peer_config::PeerConfig;
use anyhow::Context;
use async_trait::async_trait;
use duet_core::{SdpKind, SessionDescription};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// Слоты пользовательских обработчиков. Колбэки движка регистрируются один раз
/// и всегда смотрят сюда, поэтому `close` может снять все разом.
#[derive(Default)]
struct PeerHandlers {
    remote_track: Mutex<Option<RemoteTrackHandler>>,
    renegotiation: Mutex<Option<RenegotiationHandler>>,
    connection_lost: Mutex<Option<ConnectionLostHandler>>,
    /// Последний объявленный удаленный поток.
    remote_media: Mutex<Option<Arc<RemoteMedia>>>,
}

impl PeerHandlers {
    async fn clear(&self) {
        self.remote_track.lock().await.take();
        self.renegotiation.lock().await.take();
        self.connection_lost.lock().await.take();
        self.remote_media.lock().await.take();
    }
}

/// Реализация фасада поверх `webrtc::RTCPeerConnection`.
pub struct RtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
    /// Замок переговоров. Берется через `try_lock`: пересечение = `Busy`.
    negotiation: Mutex<()>,
    handlers: Arc<PeerHandlers>,
    /// Выставляется при локальном `close`, чтобы не считать закрытие потерей связи.
    closed: Arc<AtomicBool>,
    config: PeerConfig,
}

impl RtcPeer {
    pub async fn new(config: PeerConfig) -> anyhow::Result<Self> {
        // 1. MediaEngine с кодеками по умолчанию (Opus, VP8 и т.д.)
        let mut m = MediaEngine::default();
        m.register_default_codecs()
            .context("Failed to register default codecs")?;
        // 2. Интерцепторы (NACK, RTCP отчеты)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 3. ICE серверы (STUN/TURN)
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let peer = Self {
            peer_connection,
            negotiation: Mutex::new(()),
            handlers: Arc::new(PeerHandlers::default()),
            closed: Arc::new(AtomicBool::new(false)),
            config,
        };
        peer.install_engine_callbacks();
        Ok(peer)
    }

    fn install_engine_callbacks(&self) {
        // A. Входящие треки: один поток копит треки, новый поток заменяет старый
        let track_handlers = self.handlers.clone();
        self.peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let handlers = track_handlers.clone();
                Box::pin(async move {
                    let stream_id = track.stream_id();
                    info!(
                        "Remote {} track {} on stream {}",
                        track.kind(),
                        track.id(),
                        stream_id
                    );

                    let media = {
                        let mut current = handlers.remote_media.lock().await;
                        let next = Arc::new(RemoteMedia::advance(
                            current.as_deref(),
                            &stream_id,
                            RemoteTrack::from_engine(track),
                        ));
                        *current = Some(next.clone());
                        next
                    };

                    if let Some(handler) = handlers.remote_track.lock().await.as_ref() {
                        handler(media);
                    }
                })
            },
        ));

        // B. Локальные изменения требуют нового offer
        let nego_handlers = self.handlers.clone();
        self.peer_connection
            .on_negotiation_needed(Box::new(move || {
                let handlers = nego_handlers.clone();
                Box::pin(async move {
                    debug!("Negotiation needed");
                    if let Some(handler) = handlers.renegotiation.lock().await.as_ref() {
                        handler();
                    }
                })
            }));

        // C. Мониторинг состояния. Disconnected бывает временным, его не трогаем
        let state_handlers = self.handlers.clone();
        let closed = self.closed.clone();
        self.peer_connection
            .on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
                let handlers = state_handlers.clone();
                let closed = closed.clone();
                Box::pin(async move {
                    info!("Peer Connection State changed: {}", s);
                    let lost = matches!(
                        s,
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
                    );
                    if !lost || closed.load(Ordering::SeqCst) {
                        return;
                    }
                    if let Some(handler) = handlers.connection_lost.lock().await.as_ref() {
                        handler();
                    }
                })
            }));
    }

    fn ensure_open(&self) -> Result<(), NegotiationError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(NegotiationError::Closed)
        } else {
            Ok(())
        }
    }

    /// Установить локальный дескрипшн и дождаться сбора кандидатов (без trickle ICE).
    async fn set_local_and_gather(
        &self,
        desc: RTCSessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let mut gathered = self.peer_connection.gathering_complete_promise().await;
        self.peer_connection.set_local_description(desc).await?;

        match self.config.gather_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, gathered.recv()).await.is_err() {
                    warn!(
                        "ICE gathering not complete after {:?}, sending partial candidates",
                        limit
                    );
                }
            }
            None => {
                let _ = gathered.recv().await;
            }
        }

        let local = self
            .peer_connection
            .local_description()
            .await
            .ok_or_else(|| NegotiationError::Engine("local description was not set".to_owned()))?;
        from_engine(local)
            .ok_or_else(|| NegotiationError::Engine("unexpected local description type".to_owned()))
    }
}

fn to_engine(desc: SessionDescription) -> Result<RTCSessionDescription, NegotiationError> {
    let engine = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
    };
    Ok(engine)
}

fn from_engine(desc: RTCSessionDescription) -> Option<SessionDescription> {
    match desc.sdp_type {
        RTCSdpType::Offer => Some(SessionDescription::offer(desc.sdp)),
        RTCSdpType::Answer => Some(SessionDescription::answer(desc.sdp)),
        _ => None,
    }
}

fn expect_kind(desc: &SessionDescription, expected: SdpKind) -> Result<(), NegotiationError> {
    if desc.kind == expected {
        Ok(())
    } else {
        Err(NegotiationError::UnexpectedKind {
            expected,
            actual: desc.kind,
        })
    }
}

#[async_trait]
impl PeerConnectionFacade for RtcPeer {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let Ok(_guard) = self.negotiation.try_lock() else {
            return Err(NegotiationError::Busy);
        };
        self.ensure_open()?;

        let offer = self.peer_connection.create_offer(None).await?;
        self.set_local_and_gather(offer).await
    }

    async fn create_answer(
        &self,
        remote_offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let Ok(_guard) = self.negotiation.try_lock() else {
            return Err(NegotiationError::Busy);
        };
        self.ensure_open()?;
        expect_kind(&remote_offer, SdpKind::Offer)?;

        // 1. Применяем удаленный offer
        self.peer_connection
            .set_remote_description(to_engine(remote_offer)?)
            .await?;
        // 2. Создаем answer и ставим его локальным
        let answer = self.peer_connection.create_answer(None).await?;
        self.set_local_and_gather(answer).await
    }

    async fn set_remote_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError> {
        let Ok(_guard) = self.negotiation.try_lock() else {
            return Err(NegotiationError::Busy);
        };
        self.ensure_open()?;
        expect_kind(&answer, SdpKind::Answer)?;

        if self.peer_connection.signaling_state() != RTCSignalingState::HaveLocalOffer {
            return Err(NegotiationError::NoPendingOffer);
        }

        self.peer_connection
            .set_remote_description(to_engine(answer)?)
            .await?;
        Ok(())
    }

    async fn attach_tracks(&self, media: &LocalMedia) -> Result<usize, NegotiationError> {
        self.ensure_open()?;

        let mut registered = HashSet::new();
        for sender in self.peer_connection.get_senders().await {
            if let Some(track) = sender.track().await {
                registered.insert(track.id().to_owned());
            }
        }

        let mut added = 0;
        for track in media.tracks() {
            if registered.contains(track.id()) {
                continue;
            }
            let sender = self.peer_connection.add_track(track.as_track_local()).await?;

            // RTCP нужно вычитывать, иначе интерцепторы не работают
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });

            debug!("Attached local {} track {}", track.kind(), track.id());
            added += 1;
        }
        Ok(added)
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.peer_connection
            .local_description()
            .await
            .and_then(from_engine)
    }

    async fn remote_description(&self) -> Option<SessionDescription> {
        self.peer_connection
            .remote_description()
            .await
            .and_then(from_engine)
    }

    async fn on_remote_track(&self, handler: RemoteTrackHandler) {
        *self.handlers.remote_track.lock().await = Some(handler);
    }

    async fn on_renegotiation_needed(&self, handler: RenegotiationHandler) {
        *self.handlers.renegotiation.lock().await = Some(handler);
    }

    async fn on_connection_lost(&self, handler: ConnectionLostHandler) {
        *self.handlers.connection_lost.lock().await = Some(handler);
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.handlers.clear().await;
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
    }
}

/// Factory producing [`RtcPeer`]s with a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct RtcPeerFactory {
    config: PeerConfig,
}

impl RtcPeerFactory {
    pub fn new(config: PeerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PeerFactory for RtcPeerFactory {
    async fn create(&self) -> anyhow::Result<Arc<dyn PeerConnectionFacade>> {
        let peer = RtcPeer::new(self.config.clone()).await?;
        Ok(Arc::new(peer))
    }
}
