use crate::state::messages::{NetworkRequest, NetworkResponse};
use log::{debug, error, warn};
use mcc_api::client::{ApiResult, MccApi};
use mcc_api::select_live_match;
use tokio::sync::mpsc;

pub struct NetworkWorker {
    client: MccApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl NetworkWorker {
    pub fn new(
        client: MccApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self { client, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let quiet = matches!(request, NetworkRequest::RefreshMatch { .. });

            let result = match request {
                NetworkRequest::LoadMatch { match_id } | NetworkRequest::RefreshMatch { match_id } => {
                    self.handle_load_match(match_id).await
                }
                NetworkRequest::FindLiveMatch => self.handle_find_live_match().await,
            };

            debug!("network request complete");
            let response = result.unwrap_or_else(|err| {
                if quiet {
                    warn!("match refresh failed: {err}");
                }
                NetworkResponse::Error { message: err.to_string(), quiet }
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_match(&self, match_id: i64) -> ApiResult<NetworkResponse> {
        debug!("loading match {match_id} from {}", self.client.base_url());
        let snapshot = self.client.fetch_match(match_id).await?;
        Ok(NetworkResponse::MatchLoaded { snapshot: Box::new(snapshot) })
    }

    async fn handle_find_live_match(&self) -> ApiResult<NetworkResponse> {
        debug!("looking for a live match on {}", self.client.base_url());
        let matches = self.client.fetch_matches().await?;
        let match_id = select_live_match(&matches).map(|m| m.id);
        Ok(NetworkResponse::LiveMatchFound { match_id })
    }
}
