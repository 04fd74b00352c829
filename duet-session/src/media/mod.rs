mod local;
mod remote;
mod sink;
mod source;

pub use local::{LocalMedia, LocalTrack, TrackKind};
pub use remote::{RemoteMedia, RemoteTrack};
pub use sink::MediaSink;
pub use source::{MediaSource, NoMediaSource, SyntheticMediaSource, spawn_silence};
