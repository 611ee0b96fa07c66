use crate::state::live::{ConnectionStatus, LiveState};
use crate::state::messages::NetworkResponse;
use crate::state::socket::SocketEvent;
use log::{error, info};
use tokio::time::Instant;

pub struct App {
    pub state: LiveState,
}

impl App {
    pub fn new(match_id: i64) -> Self {
        Self { state: LiveState::new(match_id) }
    }

    // -----------------------------------------------------------------------
    // Live feed handlers; each returns whether the view needs a redraw
    // -----------------------------------------------------------------------

    pub fn on_socket_event(&mut self, event: SocketEvent, now: Instant) -> bool {
        match event {
            SocketEvent::Connecting { attempt } => {
                self.state.on_connection(ConnectionStatus::Connecting { attempt })
            }
            SocketEvent::Connected => self.state.on_connection(ConnectionStatus::Connected),
            SocketEvent::Message(msg) => self.state.apply(msg, now),
            SocketEvent::Invalid(reason) => {
                self.state.on_invalid(&reason);
                true
            }
            SocketEvent::Error(reason) => {
                self.state.on_socket_error(&reason);
                true
            }
            SocketEvent::Disconnected { clean: true } => {
                info!("live feed for match {} ended", self.state.match_id);
                self.state.on_connection(ConnectionStatus::Closed)
            }
            // Unclean drops are followed by Retrying or GaveUp.
            SocketEvent::Disconnected { clean: false } => false,
            SocketEvent::Retrying { attempt, delay } => {
                self.state.on_connection(ConnectionStatus::Reconnecting { attempt, delay })
            }
            SocketEvent::GaveUp { attempts } => {
                error!("live feed unreachable after {attempts} attempts");
                self.state.on_connection(ConnectionStatus::Failed)
            }
        }
    }

    pub fn on_network_response(&mut self, response: NetworkResponse) -> bool {
        match response {
            NetworkResponse::MatchLoaded { snapshot } => self.state.on_match_loaded(&snapshot),
            NetworkResponse::Error { message, quiet: false } => {
                error!("Network error: {message}");
                self.state.error = Some(message);
                true
            }
            NetworkResponse::Error { quiet: true, .. } => false,
            // Only relevant before a match is chosen; handled in main.
            NetworkResponse::LiveMatchFound { .. } => false,
        }
    }

    pub fn on_tick(&mut self, now: Instant) -> bool {
        self.state.tick(now)
    }
}
