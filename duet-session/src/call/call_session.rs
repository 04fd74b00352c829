use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::call::call_command::CallCommand;
use crate::call::call_observer::CallObserver;
use crate::call::call_state::CallState;
use crate::error::{CallError, NegotiationError};
use crate::media::{LocalMedia, RemoteMedia};
use crate::peer::{PeerConnectionFacade, PeerEvent, PeerFactory, TaggedPeerEvent};
use crate::signaling::{SignalingClient, Subscription};
use duet_core::{
    EndedBy, InboundEvent, InboundKind, OutboundEvent, PeerIdentity, RoomId, SessionDescription,
};

/// Что известно о локальном медиа.
#[derive(Debug)]
enum LocalMediaSlot {
    /// Еще не передано (или освобождено после звонка).
    Pending,
    Available(LocalMedia),
    /// Захват не удался: звонить нельзя, пока не придет новое медиа.
    Unavailable(String),
}

/// Основной актор звонка.
/// Владеет одним WebRTC соединением и ведет машину состояний offer/answer.
pub struct CallSession {
    self_id: PeerIdentity,
    state: CallState,

    /// Собеседник текущей попытки звонка.
    correspondent: Option<PeerIdentity>,

    /// Активное соединение. Заменяется только в `reset`.
    peer: Arc<dyn PeerConnectionFacade>,
    peer_closed: bool,
    peer_factory: Arc<dyn PeerFactory>,

    /// Поколение соединения, которым помечаются его события.
    generation: u64,

    local_media: LocalMediaSlot,
    remote_media: Option<Arc<RemoteMedia>>,

    signaling: SignalingClient,
    observer: Arc<dyn CallObserver>,

    /// Канал для приема команд (извне).
    command_rx: mpsc::Receiver<CallCommand>,

    /// Входящие события relay, в порядке прихода.
    signal_rx: mpsc::UnboundedReceiver<InboundEvent>,

    /// События от WebRTC соединения (клонируем sender в колбэки).
    peer_tx: mpsc::UnboundedSender<TaggedPeerEvent>,
    peer_rx: mpsc::UnboundedReceiver<TaggedPeerEvent>,

    /// Подписки на relay живут ровно столько, сколько сессия.
    _subscriptions: Vec<Subscription>,
}

impl CallSession {
    pub async fn new(
        self_id: PeerIdentity,
        command_rx: mpsc::Receiver<CallCommand>,
        signaling: SignalingClient,
        peer_factory: Arc<dyn PeerFactory>,
        observer: Arc<dyn CallObserver>,
    ) -> anyhow::Result<Self> {
        let peer = peer_factory.create().await?;

        // Все входящие события relay складываем в одну очередь, чтобы обрабатывать их по одному
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let subscriptions = InboundKind::ALL
            .iter()
            .map(|kind| {
                let tx = signal_tx.clone();
                signaling.on(*kind, move |event| {
                    let _ = tx.send(event.clone());
                })
            })
            .collect();

        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        let session = Self {
            self_id,
            state: CallState::Idle,
            correspondent: None,
            peer,
            peer_closed: false,
            peer_factory,
            generation: 0,
            local_media: LocalMediaSlot::Pending,
            remote_media: None,
            signaling,
            observer,
            command_rx,
            signal_rx,
            peer_tx,
            peer_rx,
            _subscriptions: subscriptions,
        };
        session.bind_peer_events().await;
        Ok(session)
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn correspondent(&self) -> Option<&PeerIdentity> {
        self.correspondent.as_ref()
    }

    pub fn remote_media(&self) -> Option<&Arc<RemoteMedia>> {
        self.remote_media.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Запуск главного цикла сессии.
    /// Должен быть запущен через tokio::spawn (см. `CallHandle::spawn`).
    pub async fn run(mut self) {
        info!("Call session event loop started for {}", self.self_id);

        loop {
            tokio::select! {
                // 1. Команды пользователя
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if self.handle_command(c).await.is_break() {
                                info!("Shutdown requested");
                                break;
                            }
                        }
                        None => {
                            info!("Command channel closed. Shutting down call session.");
                            break;
                        }
                    }
                }

                // 2. События relay
                Some(event) = self.signal_rx.recv() => self.handle_signal(event).await,

                // 3. События WebRTC соединения
                Some(event) = self.peer_rx.recv() => self.handle_peer_event(event).await,
            }
        }

        self.shutdown().await;
        info!("Call session event loop finished");
    }

    /// Обработать все уже накопившиеся события relay и соединения.
    /// Для пошагового управления сессией без `run` (тесты).
    #[doc(hidden)]
    pub async fn process_pending(&mut self) {
        loop {
            if let Ok(event) = self.signal_rx.try_recv() {
                self.handle_signal(event).await;
                continue;
            }
            if let Ok(event) = self.peer_rx.try_recv() {
                self.handle_peer_event(event).await;
                continue;
            }
            break;
        }
    }

    /// Выполнить одну команду. `Break` означает `Shutdown`: цикл останавливается,
    /// а сам teardown делает `run` после выхода из цикла.
    #[doc(hidden)]
    pub async fn handle_command(&mut self, cmd: CallCommand) -> ControlFlow<()> {
        match cmd {
            CallCommand::JoinRoom { room } => self.join_room(room).await,
            CallCommand::ConnectTo { peer } => self.connect_to(peer).await,
            CallCommand::AttachLocalMedia { media } => self.attach_local_media(media).await,
            CallCommand::MediaUnavailable { reason } => self.media_unavailable(reason),
            CallCommand::EndCall => self.end_call().await,
            CallCommand::Reset => self.reset().await,
            CallCommand::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Обработка событий от сигнального слоя.
    #[doc(hidden)]
    pub async fn handle_signal(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::JoinedRoom { room } => {
                info!("Joined room {}", room);
                self.observer.on_room_joined(&room).await;
            }
            InboundEvent::UserJoined { peer } => {
                // Автодозвон: второй участник зашел в комнату
                if self.state == CallState::Idle {
                    info!("User {} joined, calling", peer);
                    self.connect_to(peer).await;
                } else {
                    debug!("User {} joined while {}, ignoring", peer, self.state);
                }
            }
            InboundEvent::IncomingCall { from, offer } => self.on_incoming_call(from, offer).await,
            InboundEvent::CallAccept { from, answer } => self.on_call_accept(from, answer).await,
            InboundEvent::EndCall { ended_by } => {
                if self.state.is_active() {
                    info!("Call ended by {}", ended_by);
                    self.finish_call(ended_by).await;
                } else {
                    debug!("end-call from {} while {}, ignoring", ended_by, self.state);
                }
            }
        }
    }

    pub async fn join_room(&mut self, room: RoomId) {
        info!("Joining room {} as {}", room, self.self_id);
        self.send(OutboundEvent::JoinRoom {
            self_id: self.self_id.clone(),
            room_id: room,
        })
        .await;
    }

    /// Позвонить пиру из состояния `Idle`.
    pub async fn connect_to(&mut self, peer: PeerIdentity) {
        if let LocalMediaSlot::Unavailable(reason) = &self.local_media {
            let error = CallError::MediaUnavailable(reason.clone());
            self.report(error).await;
            return;
        }
        if self.state != CallState::Idle {
            warn!("connect_to({}) ignored while {}", peer, self.state);
            return;
        }

        // 1. Создаем offer
        let offer = match self.peer.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                self.report(e.into()).await;
                return;
            }
        };

        // 2. Отправляем его через relay
        if !self
            .send(OutboundEvent::CallUser {
                peer_id: peer.clone(),
                offer,
            })
            .await
        {
            return;
        }

        // 3. Только теперь собеседник известен
        self.identify(peer).await;
        self.transition(CallState::Offering).await;
    }

    /// Передать локальное медиа. Успешный повторный захват снимает `Unavailable`.
    pub async fn attach_local_media(&mut self, media: LocalMedia) {
        if let LocalMediaSlot::Unavailable(reason) = &self.local_media {
            info!("Local media acquired after earlier failure ({})", reason);
        }

        if self.peer_closed {
            // Треки добавим к новому соединению в reset
            debug!("Peer closed, keeping local media for the next call");
        } else {
            match self.peer.attach_tracks(&media).await {
                Ok(added) => info!(
                    "Attached {} of {} local tracks from stream {}",
                    added,
                    media.tracks().len(),
                    media.stream_id()
                ),
                Err(e) => self.report(e.into()).await,
            }
        }
        self.local_media = LocalMediaSlot::Available(media);
    }

    pub fn media_unavailable(&mut self, reason: String) {
        warn!("Local media unavailable: {}", reason);
        self.local_media = LocalMediaSlot::Unavailable(reason);
    }

    /// Завершить звонок по нашей инициативе.
    pub async fn end_call(&mut self) {
        if !self.state.is_active() {
            debug!("end_call ignored while {}", self.state);
            return;
        }
        if let Some(peer) = self.correspondent.clone() {
            self.send(OutboundEvent::EndCall { peer_id: peer }).await;
        }
        self.finish_call(EndedBy::Local).await;
    }

    /// Новое соединение и состояние `Idle`. Активный звонок сначала завершается.
    pub async fn reset(&mut self) {
        if self.state.is_active() {
            self.end_call().await;
        }

        let peer = match self.peer_factory.create().await {
            Ok(peer) => peer,
            Err(e) => {
                self.report(CallError::PeerSetup(format!("{:#}", e))).await;
                return;
            }
        };

        self.close_peer().await;
        self.peer = peer;
        self.peer_closed = false;
        self.generation += 1;
        self.bind_peer_events().await;

        if let LocalMediaSlot::Available(media) = &self.local_media
            && let Err(e) = self.peer.attach_tracks(media).await
        {
            self.report(e.into()).await;
        }

        self.clear_remote_media().await;

        let from = self.state;
        self.state = CallState::Idle;
        info!("Call session reset (generation {})", self.generation);
        if from != CallState::Idle {
            self.observer.on_state_changed(from, CallState::Idle).await;
        }
    }

    async fn on_incoming_call(&mut self, from: PeerIdentity, offer: SessionDescription) {
        match self.state {
            CallState::Idle => {
                let Some(answer) = self.answer(offer).await else {
                    return;
                };
                if !self
                    .send(OutboundEvent::CallAccept {
                        peer_id: from.clone(),
                        answer,
                    })
                    .await
                {
                    return;
                }
                self.identify(from).await;
                self.transition(CallState::Answering).await;
            }
            CallState::Answering | CallState::Connected => {
                if self.correspondent.as_ref() != Some(&from) {
                    warn!("Offer from {} while in a call with another peer, ignoring", from);
                    return;
                }
                // Переговоры по инициативе собеседника: отвечаем на свежий offer
                info!("Renegotiation offer from {}", from);
                let Some(answer) = self.answer(offer).await else {
                    return;
                };
                self.send(OutboundEvent::CallAccept {
                    peer_id: from,
                    answer,
                })
                .await;
            }
            CallState::Offering => {
                warn!("Offer from {} while our own offer is pending, ignoring", from);
            }
            CallState::Ended => {
                debug!("Offer from {} after the call ended, ignoring", from);
            }
        }
    }

    async fn on_call_accept(&mut self, from: Option<PeerIdentity>, answer: SessionDescription) {
        if !self.state.is_active() {
            debug!("call-accept while {}, ignoring", self.state);
            return;
        }
        if let Some(from) = &from
            && self.correspondent.as_ref() != Some(from)
        {
            warn!("call-accept from {} who is not our correspondent, ignoring", from);
            return;
        }

        match self.peer.set_remote_answer(answer).await {
            Ok(()) => {
                if self.state != CallState::Connected {
                    self.transition(CallState::Connected).await;
                }
            }
            Err(NegotiationError::NoPendingOffer) => {
                // Дубликат или запоздавший answer
                warn!("call-accept without a pending offer, ignoring");
            }
            Err(e) => self.report(e.into()).await,
        }
    }

    /// Обработка событий транспортного слоя WebRTC.
    async fn handle_peer_event(&mut self, tagged: TaggedPeerEvent) {
        if tagged.generation != self.generation {
            debug!(
                "Dropping event from replaced peer (generation {}, current {})",
                tagged.generation, self.generation
            );
            return;
        }

        match tagged.event {
            PeerEvent::RemoteTrack(media) => {
                if !self.state.is_active() {
                    debug!("Remote track while {}, ignoring", self.state);
                    return;
                }
                info!(
                    "Remote stream {} with {} tracks",
                    media.stream_id(),
                    media.tracks().len()
                );
                self.remote_media = Some(media.clone());
                if self.state != CallState::Connected {
                    self.transition(CallState::Connected).await;
                }
                self.observer.on_remote_media(Some(media)).await;
            }
            PeerEvent::RenegotiationNeeded => {
                let Some(peer) = self.correspondent.clone() else {
                    debug!("Renegotiation needed without a correspondent, ignoring");
                    return;
                };
                let offer = match self.peer.create_offer().await {
                    Ok(offer) => offer,
                    Err(e) => {
                        self.report(e.into()).await;
                        return;
                    }
                };
                info!("Sending renegotiation offer to {}", peer);
                self.send(OutboundEvent::CallUser {
                    peer_id: peer,
                    offer,
                })
                .await;
            }
            PeerEvent::ConnectionLost => {
                if !self.state.is_active() {
                    debug!("Connection lost while {}, ignoring", self.state);
                    return;
                }
                // Разрыв WebRTC соединения (таймаут или ошибка сети)
                self.report(CallError::ConnectionClosedUnexpectedly).await;
                self.finish_call(EndedBy::Unknown).await;
            }
        }
    }

    async fn answer(&mut self, offer: SessionDescription) -> Option<SessionDescription> {
        match self.peer.create_answer(offer).await {
            Ok(answer) => Some(answer),
            Err(e) => {
                self.report(e.into()).await;
                None
            }
        }
    }

    /// Полное завершение звонка: соединение, собеседник, медиа, состояние.
    async fn finish_call(&mut self, ended_by: EndedBy) {
        self.close_peer().await;
        self.correspondent = None;

        if let LocalMediaSlot::Available(_) = self.local_media {
            self.local_media = LocalMediaSlot::Pending;
        }
        self.clear_remote_media().await;

        self.transition(CallState::Ended).await;
        self.observer.on_call_ended(&ended_by).await;
    }

    async fn shutdown(&mut self) {
        if self.state.is_active() {
            self.end_call().await;
        }
        self.close_peer().await;
    }

    async fn close_peer(&mut self) {
        if self.peer_closed {
            return;
        }
        self.peer_closed = true;
        self.peer.close().await;
    }

    async fn clear_remote_media(&mut self) {
        if self.remote_media.take().is_some() {
            self.observer.on_remote_media(None).await;
        }
    }

    async fn identify(&mut self, peer: PeerIdentity) {
        info!("Correspondent is {}", peer);
        self.observer.on_peer_identified(&peer).await;
        self.correspondent = Some(peer);
    }

    async fn transition(&mut self, to: CallState) {
        if !self.state.can_advance_to(to) {
            warn!("Refusing transition {} -> {}", self.state, to);
            return;
        }
        let from = self.state;
        self.state = to;
        info!("Call state {} -> {}", from, to);
        self.observer.on_state_changed(from, to).await;
    }

    async fn send(&self, event: OutboundEvent) -> bool {
        match self.signaling.send(event).await {
            Ok(()) => true,
            Err(e) => {
                self.report(e.into()).await;
                false
            }
        }
    }

    async fn report(&self, error: CallError) {
        error!("Call error: {}", error);
        self.observer.on_failure(&error).await;
    }

    /// Подписать колбэки текущего соединения на очередь событий сессии.
    async fn bind_peer_events(&self) {
        let generation = self.generation;

        let tx = self.peer_tx.clone();
        self.peer
            .on_remote_track(Box::new(move |media| {
                let _ = tx.send(TaggedPeerEvent {
                    generation,
                    event: PeerEvent::RemoteTrack(media),
                });
            }))
            .await;

        let tx = self.peer_tx.clone();
        self.peer
            .on_renegotiation_needed(Box::new(move || {
                let _ = tx.send(TaggedPeerEvent {
                    generation,
                    event: PeerEvent::RenegotiationNeeded,
                });
            }))
            .await;

        let tx = self.peer_tx.clone();
        self.peer
            .on_connection_lost(Box::new(move || {
                let _ = tx.send(TaggedPeerEvent {
                    generation,
                    event: PeerEvent::ConnectionLost,
                });
            }))
            .await;
    }
}
