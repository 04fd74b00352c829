use crate::signaling::signaling_client::SignalingInner;
use duet_core::InboundKind;
use std::sync::Weak;

/// Registration of one handler. Dropping it removes the handler.
#[must_use = "the handler is removed as soon as the subscription is dropped"]
pub struct Subscription {
    pub(crate) inner: Weak<SignalingInner>,
    pub(crate) kind: InboundKind,
    pub(crate) id: u64,
}

impl Subscription {
    pub fn kind(&self) -> InboundKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.remove_handler(self.kind, self.id);
        }
    }
}
