// src/services/probe.rs

//! Reachability probes.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::Result;
use crate::models::{CheckerConfig, LinkStatus};
use crate::utils::{http, probe_url};

/// A single outbound reachability check.
///
/// Implementations never fail: every transport problem maps to
/// [`LinkStatus::Unavailable`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> LinkStatus;
}

/// Classify an HTTP status code.
pub fn classify_status(status: StatusCode) -> LinkStatus {
    if (200..400).contains(&status.as_u16()) {
        LinkStatus::Available
    } else {
        LinkStatus::Unavailable
    }
}

/// Probe that issues one GET request per check.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a probe with a client configured from the checker settings.
    pub fn from_config(config: &CheckerConfig) -> Result<Self> {
        Ok(Self::new(http::create_probe_client(config)?))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        let target = match probe_url(url) {
            Ok(target) => target,
            Err(e) => {
                log::debug!("Not probing {}: {}", url, e);
                return LinkStatus::Unavailable;
            }
        };

        match self.client.get(target).send().await {
            Ok(response) => classify_status(response.status()),
            Err(e) if e.is_timeout() => {
                log::debug!("Probe timed out for {}", url);
                LinkStatus::Unavailable
            }
            Err(e) => {
                log::debug!("Probe failed for {}: {}", url, e);
                LinkStatus::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), LinkStatus::Available);
        assert_eq!(classify_status(StatusCode::NO_CONTENT), LinkStatus::Available);
        assert_eq!(
            classify_status(StatusCode::MOVED_PERMANENTLY),
            LinkStatus::Available
        );
        assert_eq!(
            classify_status(StatusCode::PERMANENT_REDIRECT),
            LinkStatus::Available
        );
        assert_eq!(classify_status(StatusCode::CONTINUE), LinkStatus::Unavailable);
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), LinkStatus::Unavailable);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), LinkStatus::Unavailable);
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            LinkStatus::Unavailable
        );
    }

    #[tokio::test]
    async fn test_unparseable_url_is_unavailable() {
        let probe = HttpProbe::from_config(&CheckerConfig::default()).unwrap();
        assert_eq!(probe.probe("").await, LinkStatus::Unavailable);
        assert_eq!(probe.probe("http://").await, LinkStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpProbe::from_config(&CheckerConfig::default()).unwrap();
        assert_eq!(
            probe.probe(&format!("127.0.0.1:{}", addr.port())).await,
            LinkStatus::Unavailable
        );
    }
}
