mod relay_transport;
mod signaling_client;
mod subscription;

pub use relay_transport::{ChannelTransport, RelayTransport};
pub use signaling_client::SignalingClient;
pub use subscription::Subscription;
