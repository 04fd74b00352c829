mod description;
mod ice;
mod peer;
mod room;
mod signaling;

pub use description::{SdpKind, SessionDescription};
pub use ice::IceServerConfig;
pub use peer::PeerIdentity;
pub use room::RoomId;
pub use signaling::{EndedBy, InboundEvent, InboundKind, OutboundEvent, RelayFrame};
