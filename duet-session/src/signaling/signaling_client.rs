use crate::signaling::relay_transport::RelayTransport;
use crate::signaling::subscription::Subscription;
use dashmap::DashMap;
use duet_core::{InboundEvent, InboundKind, OutboundEvent, SignalingError};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

type Handler = Arc<dyn Fn(&InboundEvent) + Send + Sync>;

pub(crate) struct SignalingInner {
    transport: Box<dyn RelayTransport>,
    handlers: DashMap<InboundKind, Vec<(u64, Handler)>>,
    next_handler_id: AtomicU64,
}

impl SignalingInner {
    pub(crate) fn remove_handler(&self, kind: InboundKind, id: u64) {
        if let Some(mut list) = self.handlers.get_mut(&kind) {
            list.retain(|(handler_id, _)| *handler_id != id);
        }
    }
}

/// Typed messaging over the relay.
///
/// Клиент можно клонировать: все копии делят транспорт и таблицу обработчиков.
#[derive(Clone)]
pub struct SignalingClient {
    inner: Arc<SignalingInner>,
}

impl SignalingClient {
    pub fn new(transport: Box<dyn RelayTransport>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                transport,
                handlers: DashMap::new(),
                next_handler_id: AtomicU64::new(1),
            }),
        }
    }

    /// Сериализует событие и отправляет его в relay. Повторов нет.
    pub async fn send(&self, event: OutboundEvent) -> Result<(), SignalingError> {
        let text = event.encode()?;
        debug!("Relay <- {}", event.name());
        self.inner.transport.send_text(text).await
    }

    /// Регистрирует обработчик для одного типа входящих событий.
    pub fn on<F>(&self, kind: InboundKind, handler: F) -> Subscription
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_handler_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));

        Subscription {
            inner: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    pub fn off(&self, subscription: Subscription) {
        drop(subscription);
    }

    pub fn handler_count(&self, kind: InboundKind) -> usize {
        self.inner.handlers.get(&kind).map_or(0, |list| list.len())
    }

    /// Разбирает один входящий кадр и раздает его обработчикам.
    /// Битые и неизвестные кадры только логируются.
    pub fn dispatch(&self, raw: &str) {
        let event = match InboundEvent::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping relay frame: {}", e);
                return;
            }
        };

        debug!("Relay -> {}", event.kind());

        // Копируем список, чтобы обработчик мог вызвать on/off без дедлока на shard-е DashMap.
        let handlers: Vec<Handler> = match self.inner.handlers.get(&event.kind()) {
            Some(list) => list.iter().map(|(_, h)| h.clone()).collect(),
            None => Vec::new(),
        };

        if handlers.is_empty() {
            debug!("No handlers registered for {}", event.kind());
        }

        for handler in handlers {
            handler(&event);
        }
    }

    /// Прокачивает поток сырых кадров через `dispatch` до его завершения.
    pub async fn pump<S>(&self, mut inbound: S)
    where
        S: Stream<Item = String> + Unpin,
    {
        while let Some(raw) = inbound.next().await {
            self.dispatch(&raw);
        }
        info!("Relay inbound stream finished");
    }
}
