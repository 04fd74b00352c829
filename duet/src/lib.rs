pub use duet_core::model::{PeerIdentity, RoomId, SessionDescription};

pub mod model {
    pub use duet_core::model::*;
}

pub mod error {
    pub use duet_core::SignalingError;
    #[cfg(feature = "session")]
    pub use duet_session::{CallError, NegotiationError};
}

#[cfg(feature = "session")]
pub mod session {
    pub use duet_session::*;
}
