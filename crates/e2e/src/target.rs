//! Reachability of the application under test

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};

/// The deployed app a live run points at
#[derive(Debug, Clone)]
pub struct AppTarget {
    url: String,
}

impl AppTarget {
    pub fn new(config: &HarnessConfig) -> Self {
        Self { url: config.app_url() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Poll the app URL until it answers with a success status
    pub async fn wait_until_reachable(&self, timeout_duration: Duration) -> E2eResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&self.url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Target {} is reachable", self.url);
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Target check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for {} ...", self.url);
                    }
                    if !e.is_connect() {
                        warn!("Target check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(250)).await;
        }

        Err(E2eError::TargetUnreachable {
            url: self.url.clone(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url_from_config() {
        let config = HarnessConfig {
            base_url: "http://127.0.0.1:4173/".to_string(),
            ..Default::default()
        };
        assert_eq!(AppTarget::new(&config).url(), "http://127.0.0.1:4173/todomvc/");
    }

    #[tokio::test]
    async fn test_unreachable_target_reports_attempts() {
        let config = HarnessConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let err = AppTarget::new(&config)
            .wait_until_reachable(Duration::from_millis(300))
            .await
            .unwrap_err();
        match err {
            E2eError::TargetUnreachable { url, attempts } => {
                assert_eq!(url, "http://127.0.0.1:9/todomvc/");
                assert!(attempts >= 1);
            }
            other => panic!("expected unreachable target, got {other:?}"),
        }
    }
}
