mod app;
mod draw;
mod state;

use crate::app::App;
use crate::state::app_settings::{AppSettings, DEFAULT_LOG_FILTER};
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::network::NetworkWorker;
use crate::state::refresher::PeriodicRefresher;
use crate::state::socket::{LiveSocketWorker, SocketCommand, SocketEvent};
use anyhow::{Context, bail};
use log::{info, warn};
use mcc_api::client::MccApi;
use mcc_api::live::live_url;
use std::io;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

enum CliAction {
    Watch(Option<i64>),
    Exit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let requested_match = match handle_cli_args()? {
        CliAction::Watch(match_id) => match_id,
        CliAction::Exit => return Ok(()),
    };

    better_panic::install();

    let settings = AppSettings::load();
    init_logging(&settings.log_filter);

    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, mut network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (socket_cmd_tx, socket_cmd_rx) = mpsc::channel::<SocketCommand>(8);
    let (socket_evt_tx, socket_evt_rx) = mpsc::channel::<SocketEvent>(100);

    // Network thread
    let network_worker =
        NetworkWorker::new(MccApi::new(settings.api_url.as_str()), network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    let match_id = match requested_match {
        Some(id) => id,
        None => find_live_match(&network_req_tx, &mut network_resp_rx).await?,
    };
    info!("following match {match_id}");

    // Live feed thread
    let socket_worker = LiveSocketWorker {
        url: live_url(&settings.ws_url, match_id),
        backoff: settings.backoff(),
        commands: socket_cmd_rx,
        events: socket_evt_tx,
    };
    let socket_task = tokio::spawn(socket_worker.run());

    // Periodic REST refresh thread
    let periodic_task = (!settings.refresh_interval.is_zero()).then(|| {
        let refresher =
            PeriodicRefresher::new(match_id, settings.refresh_interval, network_req_tx.clone());
        tokio::spawn(refresher.run())
    });

    let _ = network_req_tx.send(NetworkRequest::LoadMatch { match_id }).await;

    let app = App::new(match_id);
    main_loop(app, socket_evt_rx, network_resp_rx).await;

    let _ = socket_cmd_tx.send(SocketCommand::Shutdown).await;
    if tokio::time::timeout(Duration::from_secs(2), socket_task).await.is_err() {
        warn!("live feed did not shut down in time");
    }
    network_task.abort();
    if let Some(task) = periodic_task {
        task.abort();
    }

    Ok(())
}

fn handle_cli_args() -> anyhow::Result<CliAction> {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return Ok(CliAction::Watch(None));
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            Ok(CliAction::Exit)
        }
        "-V" | "--version" => {
            println!("cclive {}", env!("CARGO_PKG_VERSION"));
            Ok(CliAction::Exit)
        }
        raw => {
            let match_id = raw
                .parse::<i64>()
                .with_context(|| format!("invalid match id: {raw}\n\n{}", usage_text()))?;
            Ok(CliAction::Watch(Some(match_id)))
        }
    }
}

fn usage_text() -> &'static str {
    "cclive - live match viewer for the Minecraft community championship

Usage:
  cclive [MATCH_ID]     follow a match (default: the first ongoing match)
  cclive --help
  cclive --version

Environment:
  CCLIVE_WS_URL                   Live feed base URL (default ws://127.0.0.1:8000)
  CCLIVE_API_URL                  REST API base URL (default http://127.0.0.1:8000)
  CCLIVE_RECONNECT_BASE_MS        First reconnect delay (default 1000)
  CCLIVE_RECONNECT_MAX_MS         Longest reconnect delay (default 30000)
  CCLIVE_RECONNECT_MAX_ATTEMPTS   Give up after this many retries (default: never)
  CCLIVE_REFRESH_SECS             REST refresh interval, 0 disables (default 30)
  CCLIVE_LOG                      Log filter (default warn)"
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn find_live_match(
    network_requests: &mpsc::Sender<NetworkRequest>,
    network_responses: &mut mpsc::Receiver<NetworkResponse>,
) -> anyhow::Result<i64> {
    network_requests.send(NetworkRequest::FindLiveMatch).await?;
    match network_responses.recv().await {
        Some(NetworkResponse::LiveMatchFound { match_id: Some(id) }) => Ok(id),
        Some(NetworkResponse::LiveMatchFound { match_id: None }) => {
            bail!("no ongoing match right now; pass a MATCH_ID to follow one anyway")
        }
        Some(NetworkResponse::Error { message, .. }) => bail!("could not list matches: {message}"),
        Some(other) => bail!("unexpected response while listing matches: {other:?}"),
        None => bail!("network worker stopped"),
    }
}

async fn main_loop(
    mut app: App,
    mut socket_events: mpsc::Receiver<SocketEvent>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut stdout = io::stdout();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        let should_redraw = tokio::select! {
            event = socket_events.recv() => match event {
                Some(event) => app.on_socket_event(event, Instant::now()),
                // The live feed ended for good (normal close or gave up).
                None => break,
            },
            Some(response) = network_responses.recv() => app.on_network_response(response),
            _ = ticker.tick() => app.on_tick(Instant::now()),
            _ = tokio::signal::ctrl_c() => break,
        };

        if should_redraw && let Err(e) = draw::draw(&mut stdout, &app.state, Instant::now()) {
            warn!("failed to write live view: {e}");
        }
    }
}
