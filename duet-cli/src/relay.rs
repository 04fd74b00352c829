use anyhow::{Context, Result};
use duet::session::{ChannelTransport, SignalingClient};
use futures::{SinkExt, StreamExt, future};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

/// Websocket relay connection: a writer task and a reader task pumping into the client.
pub struct RelayConnection {
    pub signaling: SignalingClient,
    pub writer: JoinHandle<()>,
    pub reader: JoinHandle<()>,
}

pub async fn connect(url: &str) -> Result<RelayConnection> {
    let (ws_stream, _) = connect_async(url)
        .await
        .with_context(|| format!("Failed to connect to relay {url}"))?;
    info!("Connected to relay {}", url);

    let (mut ws_write, ws_read) = ws_stream.split();
    let (transport, mut outgoing) = ChannelTransport::new();
    let signaling = SignalingClient::new(Box::new(transport));

    let writer = tokio::spawn(async move {
        while let Some(text) = outgoing.recv().await {
            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                warn!("Relay write failed: {}", e);
                break;
            }
        }
        let _ = ws_write.close().await;
    });

    let inbound = ws_read
        .inspect(|msg| {
            if let Err(e) = msg {
                warn!("Relay read failed: {}", e);
            }
        })
        .take_while(|msg| future::ready(matches!(msg, Ok(m) if !m.is_close())))
        .filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(text.to_string()),
                _ => None,
            })
        });

    let reader_client = signaling.clone();
    let reader = tokio::spawn(async move {
        reader_client.pump(Box::pin(inbound)).await;
    });

    Ok(RelayConnection {
        signaling,
        writer,
        reader,
    })
}
