use crate::media::local::TrackKind;
use std::fmt;
use std::sync::Arc;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

#[derive(Clone)]
pub struct RemoteTrack {
    id: String,
    kind: TrackKind,
    source: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    /// A track descriptor with no engine track behind it.
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
        }
    }

    pub(crate) fn from_engine(track: Arc<TrackRemote>) -> Self {
        let kind = match track.kind() {
            RTPCodecType::Audio => TrackKind::Audio,
            _ => TrackKind::Video,
        };
        Self {
            id: track.id(),
            kind,
            source: Some(track),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// The engine track, for sinks that read RTP.
    pub fn source(&self) -> Option<&Arc<TrackRemote>> {
        self.source.as_ref()
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("attached", &self.source.is_some())
            .finish()
    }
}

/// The stream most recently advertised by the remote side.
#[derive(Debug, Clone)]
pub struct RemoteMedia {
    stream_id: String,
    tracks: Vec<RemoteTrack>,
}

impl RemoteMedia {
    pub fn new(stream_id: impl Into<String>, tracks: Vec<RemoteTrack>) -> Self {
        Self {
            stream_id: stream_id.into(),
            tracks,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn tracks(&self) -> &[RemoteTrack] {
        &self.tracks
    }

    /// Folds a newly arrived track into the advertised stream.
    ///
    /// A track on the current stream joins it; a track on any other stream
    /// starts a replacement.
    pub fn advance(current: Option<&RemoteMedia>, stream_id: &str, track: RemoteTrack) -> Self {
        match current {
            Some(media) if media.stream_id == stream_id => {
                let mut tracks: Vec<RemoteTrack> = media
                    .tracks
                    .iter()
                    .filter(|t| t.id != track.id)
                    .cloned()
                    .collect();
                tracks.push(track);
                Self::new(stream_id, tracks)
            }
            _ => Self::new(stream_id, vec![track]),
        }
    }
}
