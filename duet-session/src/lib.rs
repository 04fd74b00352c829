pub mod call;
pub mod error;
pub mod media;
pub mod peer;
pub mod signaling;

pub use call::*;
pub use error::{CallError, NegotiationError};
pub use media::*;
pub use peer::*;
pub use signaling::*;
