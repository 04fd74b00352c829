use crate::error::CallError;
use crate::media::local::{LocalMedia, TrackKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Opus frame that decodes to 20ms of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const SILENCE_FRAME: Duration = Duration::from_millis(20);

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, CallError>;
}

/// Produces an audio and a video track without touching capture devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticMediaSource;

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn acquire(&self) -> Result<LocalMedia, CallError> {
        let media = LocalMedia::audio_video();
        debug!(
            "Synthetic media acquired: stream {} with {} tracks",
            media.stream_id(),
            media.tracks().len()
        );
        Ok(media)
    }
}

/// Always fails, like a capture request the user denied.
#[derive(Debug, Clone)]
pub struct NoMediaSource {
    reason: String,
}

impl NoMediaSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MediaSource for NoMediaSource {
    async fn acquire(&self) -> Result<LocalMedia, CallError> {
        Err(CallError::MediaUnavailable(self.reason.clone()))
    }
}

/// Keeps the audio tracks of `media` fed with silence until aborted.
pub fn spawn_silence(media: &LocalMedia) -> JoinHandle<()> {
    let audio: Vec<_> = media
        .tracks()
        .iter()
        .filter(|t| t.kind() == TrackKind::Audio)
        .cloned()
        .collect();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SILENCE_FRAME);
        loop {
            ticker.tick().await;
            for track in &audio {
                if let Err(e) = track
                    .write_sample(Bytes::from_static(&OPUS_SILENCE), SILENCE_FRAME)
                    .await
                {
                    warn!("Silence pump stopped for track {}: {}", track.id(), e);
                    return;
                }
            }
        }
    })
}
