use anyhow::Result;
use duet::session::{CallHandle, LocalMedia, MediaSource, spawn_silence};
use tokio::task::JoinHandle;
use tracing::debug;

/// Local media owned by the CLI for the whole run.
///
/// Tracks are acquired once and the same `LocalMedia` is handed back to the
/// session on `connect` and after `reset`, so the facade's dedup by track id
/// keeps one sender per track.
pub struct LocalFeed {
    media: Option<LocalMedia>,
    silence: Option<JoinHandle<()>>,
}

impl LocalFeed {
    pub async fn acquire(handle: &CallHandle, source: &dyn MediaSource) -> Result<Self> {
        let mut feed = Self {
            media: None,
            silence: None,
        };
        feed.try_acquire(handle, source).await?;
        Ok(feed)
    }

    /// Re-sends the held media, or retries acquisition if the last attempt failed.
    pub async fn attach(&mut self, handle: &CallHandle, source: &dyn MediaSource) -> Result<()> {
        match &self.media {
            Some(media) => {
                debug!("Re-attaching local stream {}", media.stream_id());
                handle.attach_local_media(media.clone()).await?;
            }
            None => self.try_acquire(handle, source).await?,
        }
        Ok(())
    }

    async fn try_acquire(&mut self, handle: &CallHandle, source: &dyn MediaSource) -> Result<()> {
        if let Some(media) = handle.acquire_media(source).await? {
            self.silence = Some(spawn_silence(&media));
            self.media = Some(media);
        }
        Ok(())
    }

    pub fn stop(mut self) {
        if let Some(pump) = self.silence.take() {
            pump.abort();
        }
    }
}
