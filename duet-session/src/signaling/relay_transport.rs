use async_trait::async_trait;
use duet_core::SignalingError;
use tokio::sync::mpsc;

/// Outgoing half of the relay connection (WebSocket writer or a test double).
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send_text(&self, text: String) -> Result<(), SignalingError>;
}

/// Hands encoded frames to whoever owns the socket writer.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RelayTransport for ChannelTransport {
    async fn send_text(&self, text: String) -> Result<(), SignalingError> {
        self.tx
            .send(text)
            .map_err(|_| SignalingError::Transport("relay writer is gone".to_owned()))
    }
}
