use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use mcc_api::live::{EventPost, LiveMessage, LiveUpdate, parse_live_path};
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8000";

struct Room {
    tx: broadcast::Sender<String>,
    clients: usize,
    snapshot: Option<LiveUpdate>,
}

type Rooms = Arc<Mutex<HashMap<i64, Room>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = env::var("CCLIVE_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let addr = env::var("CCLIVE_RELAY_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = TcpListener::bind(&addr).await?;
    let rooms: Rooms = Arc::default();

    info!("live relay listening on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        let rooms = rooms.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, rooms).await {
                debug!("client {peer} disconnected: {e}");
            }
        });
    }
}

async fn handle_client(stream: TcpStream, rooms: Rooms) -> anyhow::Result<()> {
    let mut match_id = None;
    let ws = accept_hdr_async(stream, |req: &Request, resp: Response| {
        match parse_live_path(req.uri().path()) {
            Some(id) => {
                match_id = Some(id);
                Ok(resp)
            }
            None => {
                let mut not_found = ErrorResponse::new(Some("unknown live path".to_string()));
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Err(not_found)
            }
        }
    })
    .await?;
    let Some(match_id) = match_id else {
        return Ok(());
    };

    let (tx, mut rx, snapshot) = join(&rooms, match_id);
    info!("client joined match {match_id}");
    let result = relay(ws, match_id, &rooms, &tx, &mut rx, snapshot).await;
    leave(&rooms, match_id);
    result
}

async fn relay(
    ws: tokio_tungstenite::WebSocketStream<TcpStream>,
    match_id: i64,
    rooms: &Rooms,
    tx: &broadcast::Sender<String>,
    rx: &mut broadcast::Receiver<String>,
    snapshot: Option<String>,
) -> anyhow::Result<()> {
    let (mut write, mut read) = ws.split();

    if let Some(text) = snapshot {
        write.send(Message::Text(text.into())).await?;
    }

    loop {
        tokio::select! {
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(frame) = ingest(rooms, match_id, text.as_str()) {
                            let _ = tx.send(frame);
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Ping(_))) => {}
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(text) => {
                        write.send(Message::Text(text.into())).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("client on match {match_id} lagged by {skipped} frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

/// Register a client in the match room, creating the room on first join.
/// Returns the room's sender, a fresh receiver and the last known snapshot.
fn join(
    rooms: &Rooms,
    match_id: i64,
) -> (broadcast::Sender<String>, broadcast::Receiver<String>, Option<String>) {
    let mut rooms = rooms.lock().unwrap_or_else(PoisonError::into_inner);
    let room = rooms.entry(match_id).or_insert_with(|| Room {
        tx: broadcast::channel(512).0,
        clients: 0,
        snapshot: None,
    });
    room.clients += 1;
    let snapshot = room
        .snapshot
        .as_ref()
        .and_then(|s| serde_json::to_string(&LiveMessage::LiveUpdate(s.clone())).ok());
    (room.tx.clone(), room.tx.subscribe(), snapshot)
}

fn leave(rooms: &Rooms, match_id: i64) {
    let mut rooms = rooms.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(room) = rooms.get_mut(&match_id) {
        room.clients = room.clients.saturating_sub(1);
        if room.clients == 0 {
            rooms.remove(&match_id);
            info!("match {match_id} room closed");
        }
    }
}

/// Decide what to rebroadcast for one inbound frame.
///
/// Live frames for this match pass through unchanged (snapshots are kept for
/// late joiners). Event reports are folded into the stored snapshot, which is
/// then broadcast. Anything else is dropped.
fn ingest(rooms: &Rooms, match_id: i64, text: &str) -> Option<String> {
    let mut rooms = rooms.lock().unwrap_or_else(PoisonError::into_inner);
    let room = rooms.get_mut(&match_id)?;

    if let Ok(msg) = LiveMessage::parse(text) {
        if msg.match_id().is_some_and(|id| id != match_id) {
            warn!("dropping {} frame for match {:?} sent to room {match_id}", msg.kind(), msg.match_id());
            return None;
        }
        if let LiveMessage::LiveUpdate(update) = msg {
            room.snapshot = Some(update);
        }
        return Some(text.to_owned());
    }

    match serde_json::from_str::<EventPost>(text) {
        Ok(event) => {
            let Some(snapshot) = room.snapshot.as_mut() else {
                warn!("event for match {match_id} arrived before any snapshot");
                return None;
            };
            snapshot.record_event(&event);
            serde_json::to_string(&LiveMessage::LiveUpdate(snapshot.clone())).ok()
        }
        Err(e) => {
            warn!("dropping invalid frame on match {match_id}: {e}");
            None
        }
    }
}
