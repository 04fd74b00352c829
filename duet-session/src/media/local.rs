use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// A locally produced track. Identity is the track id.
#[derive(Clone)]
pub struct LocalTrack {
    kind: TrackKind,
    track: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn audio(stream_id: &str) -> Self {
        Self::with_codec(TrackKind::Audio, MIME_TYPE_OPUS, 48000, 2, stream_id)
    }

    pub fn video(stream_id: &str) -> Self {
        Self::with_codec(TrackKind::Video, MIME_TYPE_VP8, 90000, 0, stream_id)
    }

    fn with_codec(
        kind: TrackKind,
        mime_type: &str,
        clock_rate: u32,
        channels: u16,
        stream_id: &str,
    ) -> Self {
        let codec = RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            clock_rate,
            channels,
            ..Default::default()
        };
        let track = TrackLocalStaticSample::new(
            codec,
            format!("{}-{}", kind, Uuid::new_v4()),
            stream_id.to_owned(),
        );
        Self {
            kind,
            track: Arc::new(track),
        }
    }

    pub fn id(&self) -> &str {
        self.track.id()
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn as_track_local(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.track.clone()
    }

    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> anyhow::Result<()> {
        self.track
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .finish()
    }
}

/// Handle to the local capture stream. May carry no tracks at all.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    stream_id: String,
    tracks: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            tracks: Vec::new(),
        }
    }

    /// An audio and a video track on a fresh stream id.
    pub fn audio_video() -> Self {
        let stream_id = format!("stream-{}", Uuid::new_v4());
        let audio = LocalTrack::audio(&stream_id);
        let video = LocalTrack::video(&stream_id);
        Self::new(stream_id).with_track(audio).with_track(video)
    }

    pub fn with_track(mut self, track: LocalTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
