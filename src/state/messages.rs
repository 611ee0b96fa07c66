use mcc_api::Match;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadMatch { match_id: i64 },
    /// Periodic re-fetch; failures are logged but not surfaced.
    RefreshMatch { match_id: i64 },
    FindLiveMatch,
}

#[derive(Debug)]
pub enum NetworkResponse {
    MatchLoaded { snapshot: Box<Match> },
    LiveMatchFound { match_id: Option<i64> },
    Error { message: String, quiet: bool },
}
