use crate::state::backoff::Backoff;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use mcc_api::live::LiveMessage;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type LiveStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub enum SocketCommand {
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum SocketEvent {
    Connecting { attempt: u32 },
    Connected,
    Message(LiveMessage),
    /// A frame arrived that does not decode; the connection stays up.
    Invalid(String),
    Error(String),
    Disconnected { clean: bool },
    Retrying { attempt: u32, delay: Duration },
    GaveUp { attempts: u32 },
}

enum SessionEnd {
    Clean,
    Unclean,
    Shutdown,
}

/// Follows one match's live feed. Reconnects with backoff after every
/// unclean close; a normal (1000) close from the server ends the feed.
#[derive(Debug)]
pub struct LiveSocketWorker {
    pub url: String,
    pub backoff: Backoff,
    pub commands: mpsc::Receiver<SocketCommand>,
    pub events: mpsc::Sender<SocketEvent>,
}

impl LiveSocketWorker {
    pub async fn run(mut self) {
        // Connection attempts since the last successful open.
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.emit(SocketEvent::Connecting { attempt }).await;
            debug!("connecting to {} (attempt {attempt})", self.url);

            let connected = tokio::select! {
                result = connect_async(self.url.as_str()) => result,
                cmd = self.commands.recv() => match cmd {
                    Some(SocketCommand::Shutdown) | None => return,
                },
            };

            let end = match connected {
                Ok((stream, _)) => {
                    info!("live feed connected: {}", self.url);
                    self.backoff.reset();
                    attempt = 0;
                    self.emit(SocketEvent::Connected).await;
                    self.session(stream).await
                }
                Err(e) => {
                    warn!("live feed connect failed: {e}");
                    self.emit(SocketEvent::Error(format!("connect failed: {e}"))).await;
                    self.emit(SocketEvent::Disconnected { clean: false }).await;
                    SessionEnd::Unclean
                }
            };

            match end {
                SessionEnd::Clean | SessionEnd::Shutdown => return,
                SessionEnd::Unclean => {}
            }

            let Some(delay) = self.backoff.next_delay() else {
                warn!("live feed gave up after {attempt} attempts");
                self.emit(SocketEvent::GaveUp { attempts: attempt }).await;
                return;
            };

            self.emit(SocketEvent::Retrying { attempt: attempt + 1, delay }).await;
            debug!("reconnecting in {delay:?}");

            tokio::select! {
                _ = sleep(delay) => {}
                cmd = self.commands.recv() => match cmd {
                    Some(SocketCommand::Shutdown) | None => return,
                },
            }
        }
    }

    async fn session(&mut self, stream: LiveStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        loop {
            tokio::select! {
                Some(SocketCommand::Shutdown) | None = self.commands.recv() => {
                    let frame = CloseFrame { code: CloseCode::Normal, reason: "viewer closed".into() };
                    if let Err(e) = write.send(Message::Close(Some(frame))).await {
                        debug!("close frame not delivered: {e}");
                    }
                    self.emit(SocketEvent::Disconnected { clean: true }).await;
                    return SessionEnd::Shutdown;
                }
                inbound = read.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            match LiveMessage::parse(&text) {
                                Ok(msg) => self.emit(SocketEvent::Message(msg)).await,
                                Err(e) => {
                                    warn!("invalid live frame: {e}");
                                    self.emit(SocketEvent::Invalid(e.to_string())).await;
                                }
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let clean = frame.as_ref().is_some_and(|f| f.code == CloseCode::Normal);
                            info!("live feed closed by server: {frame:?}");
                            self.emit(SocketEvent::Disconnected { clean }).await;
                            return if clean { SessionEnd::Clean } else { SessionEnd::Unclean };
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("live feed read failed: {e}");
                            self.emit(SocketEvent::Error(format!("read failed: {e}"))).await;
                            self.emit(SocketEvent::Disconnected { clean: false }).await;
                            return SessionEnd::Unclean;
                        }
                        None => {
                            self.emit(SocketEvent::Disconnected { clean: false }).await;
                            return SessionEnd::Unclean;
                        }
                    }
                }
            }
        }
    }

    async fn emit(&self, event: SocketEvent) {
        let _ = self.events.send(event).await;
    }
}
