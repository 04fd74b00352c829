use async_trait::async_trait;
use duet_core::SignalingError;
use duet_session::RelayTransport;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};

/// Mock RelayTransport that captures all outgoing frames.
#[derive(Clone)]
pub struct MockRelay {
    /// Channel to send captured frames.
    tx: mpsc::UnboundedSender<Value>,
    /// All captured frames (for verification).
    frames: Arc<Mutex<Vec<Value>>>,
    /// When set, every send fails with a transport error.
    failing: Arc<AtomicBool>,
}

impl MockRelay {
    /// Create a new MockRelay and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let relay = Self {
            tx,
            frames: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        };
        (relay, rx)
    }

    /// Create a MockRelay without a receiver (frames are only stored).
    pub fn new_stored_only() -> Self {
        let (relay, _rx) = Self::new();
        relay
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all captured frames.
    pub async fn frames(&self) -> Vec<Value> {
        self.frames.lock().await.clone()
    }

    /// Get all captured frames with the given event name.
    pub async fn frames_named(&self, event: &str) -> Vec<Value> {
        self.frames
            .lock()
            .await
            .iter()
            .filter(|f| f["event"] == event)
            .cloned()
            .collect()
    }

    pub async fn count(&self, event: &str) -> usize {
        self.frames_named(event).await.len()
    }
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl RelayTransport for MockRelay {
    async fn send_text(&self, text: String) -> Result<(), SignalingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SignalingError::Transport("mock relay is down".to_owned()));
        }

        let frame: Value = serde_json::from_str(&text)
            .map_err(|e| SignalingError::Transport(format!("sent invalid JSON: {e}")))?;
        tracing::debug!("[MockRelay] {}", frame["event"]);

        self.frames.lock().await.push(frame.clone());
        let _ = self.tx.send(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_relay_captures_frames() {
        let (relay, mut rx) = MockRelay::new();

        relay
            .send_text(r#"{"event":"end-call","data":{"peerId":"bob"}}"#.to_owned())
            .await
            .unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame["event"], "end-call");
        assert_eq!(relay.count("end-call").await, 1);
        assert_eq!(relay.count("call-user").await, 0);
    }

    #[tokio::test]
    async fn test_mock_relay_can_fail() {
        let relay = MockRelay::new_stored_only();
        relay.set_failing(true);

        let result = relay.send_text("{}".to_owned()).await;
        assert!(matches!(result, Err(SignalingError::Transport(_))));
        assert!(relay.frames().await.is_empty());
    }
}
