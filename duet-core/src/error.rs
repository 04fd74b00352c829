use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("malformed `{event}` frame: {reason}")]
    Malformed { event: String, reason: String },

    #[error("unknown relay event `{0}`")]
    UnknownEvent(String),

    #[error("failed to encode `{event}` frame")]
    Encode {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("relay transport error: {0}")]
    Transport(String),
}

impl SignalingError {
    pub(crate) fn malformed(event: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            event: event.to_owned(),
            reason: reason.into(),
        }
    }
}
