use crate::media::remote::RemoteMedia;
use std::sync::Arc;

/// Render side of a call. `None` means the remote stream went away.
pub trait MediaSink: Send + Sync {
    fn present(&self, media: Option<Arc<RemoteMedia>>);
}
