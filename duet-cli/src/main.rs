mod config;
mod console;
mod media;
mod relay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use duet::PeerIdentity;
use duet::session::{
    CallHandle, MediaSource, NoMediaSource, RtcPeerFactory, SyntheticMediaSource,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::console::{ConsoleObserver, ConsoleSink};
use crate::media::LocalFeed;

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Two-party audio/video calls over a websocket relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room and call whoever else is in it.
    Call {
        /// Websocket URL of the signaling relay.
        #[arg(long)]
        relay: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        room: Option<String>,

        /// Do not send local audio/video.
        #[arg(long)]
        no_media: bool,

        /// STUN server URL, replaces the defaults. Repeatable.
        #[arg(long = "stun")]
        stun: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Call {
            relay,
            email,
            room,
            no_media,
            stun,
        } => run_call(relay, email, room, no_media, stun).await,
    }
}

async fn run_call(
    relay_url: String,
    email: Option<String>,
    room: Option<String>,
    no_media: bool,
    stun: Vec<String>,
) -> Result<()> {
    let self_id = config::resolve_identity(email)?;
    let room = config::resolve_room(room)?;
    let peer_config = config::peer_config(stun, config::turn_from_env());

    println!("{}", "🚀 Starting duet...".green().bold());
    let relay = relay::connect(&relay_url).await?;

    let observer = ConsoleObserver::new(Box::new(ConsoleSink::new()));
    let (handle, session) = CallHandle::spawn(
        self_id.clone(),
        relay.signaling.clone(),
        Arc::new(RtcPeerFactory::new(peer_config)),
        Arc::new(observer),
    )
    .await
    .context("Failed to start call session")?;

    let source: Box<dyn MediaSource> = if no_media {
        Box::new(NoMediaSource::new("disabled with --no-media"))
    } else {
        Box::new(SyntheticMediaSource)
    };

    let mut feed = LocalFeed::acquire(&handle, source.as_ref()).await?;
    handle.join_room(room).await?;
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut reader = relay.reader;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let mut words = line.split_whitespace();
                match (words.next(), words.next()) {
                    (Some("connect"), _) => feed.attach(&handle, source.as_ref()).await?,
                    (Some("call"), Some(peer)) => match PeerIdentity::parse(peer) {
                        Some(peer) => handle.connect_to(peer).await?,
                        None => println!("{}", "usage: call <email>".yellow()),
                    },
                    (Some("end"), _) => handle.end_call().await?,
                    (Some("reset"), _) => {
                        handle.reset().await?;
                        feed.attach(&handle, source.as_ref()).await?;
                    }
                    (Some("quit"), _) => break,
                    (None, _) => {}
                    _ => print_help(),
                }
            }

            _ = &mut reader => {
                println!("{}", "❌ Relay connection closed".red().bold());
                break;
            }
        }
    }

    handle.shutdown().await.ok();
    feed.stop();
    drop(handle);
    let _ = session.await;
    relay.writer.abort();

    println!("{}", "👋 Bye".green());
    Ok(())
}

fn print_help() {
    println!("{}", "Commands:".cyan().bold());
    println!("   {}        attach local media and renegotiate", "connect".bold());
    println!("   {} <email>   call someone in the room", "call".bold());
    println!("   {}            hang up", "end".bold());
    println!("   {}          start over with a new connection", "reset".bold());
    println!("   {}           leave", "quit".bold());
}
