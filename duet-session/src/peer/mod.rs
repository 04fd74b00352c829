mod facade;
mod peer_config;
mod peer_event;
mod rtc_peer;

pub use facade::{
    ConnectionLostHandler, PeerConnectionFacade, PeerFactory, RemoteTrackHandler,
    RenegotiationHandler,
};
pub use peer_config::{DEFAULT_GATHER_TIMEOUT, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, PeerConfig};
pub use peer_event::{PeerEvent, TaggedPeerEvent};
pub use rtc_peer::{RtcPeer, RtcPeerFactory};
