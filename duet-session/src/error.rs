use duet_core::{SdpKind, SignalingError};
use thiserror::Error;

/// Failures of a single offer/answer operation on a peer connection.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("another negotiation operation is already in flight")]
    Busy,

    #[error("no local offer is pending")]
    NoPendingOffer,

    #[error("expected an {expected} description, got {actual}")]
    UnexpectedKind { expected: SdpKind, actual: SdpKind },

    #[error("peer connection is closed")]
    Closed,

    #[error("engine rejected the operation: {0}")]
    Engine(String),
}

impl From<webrtc::Error> for NegotiationError {
    fn from(e: webrtc::Error) -> Self {
        NegotiationError::Engine(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("connection closed unexpectedly")]
    ConnectionClosedUnexpectedly,

    #[error("failed to create peer connection: {0}")]
    PeerSetup(String),

    #[error("call session is no longer running")]
    SessionClosed,
}
