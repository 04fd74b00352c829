use async_trait::async_trait;
use colored::*;
use dashmap::DashMap;
use duet::session::{CallError, CallObserver, CallState, MediaSink, RemoteMedia};
use duet::{PeerIdentity, RoomId};
use duet::model::EndedBy;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Prints remote streams and counts their RTP packets.
///
/// One reader per track id. Tracks without an engine source are remembered
/// with no reader.
#[derive(Default)]
pub struct ConsoleSink {
    readers: DashMap<String, Option<JoinHandle<()>>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn stop_readers(&self, keep: &HashSet<&str>) {
        self.readers.retain(|id, reader| {
            if keep.contains(id.as_str()) {
                return true;
            }
            if let Some(reader) = reader.take() {
                reader.abort();
            }
            false
        });
    }
}

impl MediaSink for ConsoleSink {
    fn present(&self, media: Option<Arc<RemoteMedia>>) {
        let Some(media) = media else {
            self.stop_readers(&HashSet::new());
            println!("{}", "📴 Remote media cleared".dimmed());
            return;
        };

        // Треки, которых больше нет в потоке, отпускаем
        let current: HashSet<&str> = media.tracks().iter().map(|t| t.id()).collect();
        self.stop_readers(&current);

        println!(
            "{} stream {} ({} tracks)",
            "📺 Remote media:".green().bold(),
            media.stream_id(),
            media.tracks().len()
        );
        for track in media.tracks() {
            if self.readers.contains_key(track.id()) {
                continue;
            }
            println!("   {} {}", track.kind().to_string().cyan(), track.id());

            let reader = track.source().cloned().map(|source| {
                let id = track.id().to_owned();
                tokio::spawn(async move {
                    let mut packets: u64 = 0;
                    while source.read_rtp().await.is_ok() {
                        packets += 1;
                        if packets % 500 == 0 {
                            debug!("Track {}: {} RTP packets", id, packets);
                        }
                    }
                    debug!("Track {} finished after {} RTP packets", id, packets);
                })
            });
            self.readers.insert(track.id().to_owned(), reader);
        }
    }
}

impl Drop for ConsoleSink {
    fn drop(&mut self) {
        self.stop_readers(&HashSet::new());
    }
}

pub struct ConsoleObserver {
    sink: Box<dyn MediaSink>,
}

impl ConsoleObserver {
    pub fn new(sink: Box<dyn MediaSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl CallObserver for ConsoleObserver {
    async fn on_state_changed(&self, from: CallState, to: CallState) {
        let to = match to {
            CallState::Connected => to.to_string().green().bold(),
            CallState::Ended => to.to_string().red().bold(),
            _ => to.to_string().yellow(),
        };
        println!("{} {} -> {}", "📞".bold(), from, to);
    }

    async fn on_peer_identified(&self, peer: &PeerIdentity) {
        println!("{} {}", "👤 Talking to".cyan(), peer.as_str().bold());
    }

    async fn on_remote_media(&self, media: Option<Arc<RemoteMedia>>) {
        self.sink.present(media);
    }

    async fn on_call_ended(&self, ended_by: &EndedBy) {
        let who = match ended_by {
            EndedBy::Local => "you".to_owned(),
            EndedBy::Peer(peer) => peer.to_string(),
            EndedBy::Unknown => "the network".to_owned(),
        };
        println!("{} {}", "🔚 Call ended by".red(), who);
        println!("   type {} to call again", "reset".bold());
    }

    async fn on_room_joined(&self, room: &RoomId) {
        println!(
            "{} {}, waiting for the other side...",
            "🚪 Joined room".green(),
            room.as_str().bold()
        );
    }

    async fn on_failure(&self, error: &CallError) {
        eprintln!("{} {}", "⚠️  ".yellow(), error.to_string().yellow());
    }
}
