// src/integrations/connectivity.rs
//
// Internet reachability probe

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn can_access_internet(&self) -> AppResult<bool>;
}

/// Well-known anycast DNS resolvers
pub const DEFAULT_PROBE_TARGETS: &[&str] = &["1.1.1.1:443", "8.8.8.8:443", "9.9.9.9:443"];

/// Considers the device online when any target accepts a TCP connection.
/// All targets are dialed at once and share one timeout.
pub struct TcpConnectivityProbe {
    targets: Vec<String>,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(targets: Vec<String>, timeout: Duration) -> Self {
        Self { targets, timeout }
    }
}

impl Default for TcpConnectivityProbe {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROBE_TARGETS.iter().map(|t| t.to_string()).collect(),
            Duration::from_millis(1500),
        )
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn can_access_internet(&self) -> AppResult<bool> {
        let mut attempts = JoinSet::new();
        for target in self.targets.iter().cloned() {
            attempts.spawn(async move {
                match TcpStream::connect(target.as_str()).await {
                    Ok(_) => true,
                    Err(e) => {
                        log::debug!("Connectivity probe to {} failed: {}", target, e);
                        false
                    }
                }
            });
        }

        let any_reachable = async {
            while let Some(joined) = attempts.join_next().await {
                if matches!(joined, Ok(true)) {
                    return true;
                }
            }
            false
        };

        // Dropping the set aborts the attempts still in flight
        match tokio::time::timeout(self.timeout, any_reachable).await {
            Ok(online) => Ok(online),
            Err(_) => {
                log::debug!("Connectivity probe timed out after {:?}", self.timeout);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_reachable_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let probe = TcpConnectivityProbe::new(vec![addr], Duration::from_secs(1));
        assert!(probe.can_access_internet().await.unwrap());
    }

    #[tokio::test]
    async fn test_slow_target_does_not_delay_reachable_one() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let reachable = listener.local_addr().unwrap().to_string();
        // non-routable; either hangs or fails fast depending on the host
        let blackhole = "10.255.255.1:443".to_string();

        let probe = TcpConnectivityProbe::new(vec![blackhole, reachable], Duration::from_secs(3));
        let started = std::time::Instant::now();

        assert!(probe.can_access_internet().await.unwrap());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_refused_targets_are_offline() {
        let closed = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let probe = TcpConnectivityProbe::new(vec![closed.clone(), closed], Duration::from_secs(1));
        assert!(!probe.can_access_internet().await.unwrap());
    }

    #[tokio::test]
    async fn test_no_targets_is_offline() {
        let probe = TcpConnectivityProbe::new(vec![], Duration::from_secs(1));
        assert!(!probe.can_access_internet().await.unwrap());
    }
}
