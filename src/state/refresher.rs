use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Re-fetches the match over REST so status changes the live feed missed
/// still reach the view. Bootstrap loading is triggered separately.
pub struct PeriodicRefresher {
    match_id: i64,
    every: Duration,
    network_requests: mpsc::Sender<NetworkRequest>,
}

impl PeriodicRefresher {
    pub fn new(match_id: i64, every: Duration, network_requests: mpsc::Sender<NetworkRequest>) -> Self {
        Self { match_id, every, network_requests }
    }

    pub async fn run(self) {
        let mut refresh_interval = interval(self.every);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        refresh_interval.tick().await;

        loop {
            refresh_interval.tick().await;
            let request = NetworkRequest::RefreshMatch { match_id: self.match_id };
            if self.network_requests.send(request).await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, timeout};

    #[tokio::test]
    async fn sends_refresh_after_first_interval() {
        let (tx, mut rx) = mpsc::channel(4);
        let started = Instant::now();
        let task = tokio::spawn(PeriodicRefresher::new(7, Duration::from_millis(50), tx).run());

        let request = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert!(matches!(request, NetworkRequest::RefreshMatch { match_id: 7 }));
        assert!(started.elapsed() >= Duration::from_millis(50));

        drop(rx);
        timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    }
}
