//! Harness configuration, loadable from YAML

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Default timeout for polling waits and retrying assertions
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Complete harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL that relative navigation paths resolve against
    pub base_url: String,

    /// Path of the to-do list view
    pub app_path: String,

    /// localStorage key holding the persisted list
    pub storage_key: String,

    /// Browser engine
    pub browser: Browser,

    pub headless: bool,

    pub viewport: Viewport,

    /// Playwright default timeout for actions (click, fill, ...)
    pub action_timeout_ms: u64,

    /// Polling behavior for synchronization helpers
    pub wait: WaitOptions,

    /// Where test-results.json is written
    pub output_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "https://demo.playwright.dev".to_string(),
            app_path: "/todomvc/".to_string(),
            storage_key: "react-todos".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport::default(),
            action_timeout_ms: 5_000,
            wait: WaitOptions::default(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl HarnessConfig {
    /// Parse a config from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !self.app_path.starts_with('/') {
            return Err(E2eError::Config(format!(
                "app_path must be absolute, got {:?}",
                self.app_path
            )));
        }
        if self.storage_key.is_empty() {
            return Err(E2eError::Config("storage_key must not be empty".to_string()));
        }
        if self.wait.poll_interval_ms == 0 || self.wait.poll_interval_ms > self.wait.timeout_ms {
            return Err(E2eError::Config(format!(
                "wait.poll_interval_ms must be in 1..={}, got {}",
                self.wait.timeout_ms, self.wait.poll_interval_ms
            )));
        }
        Ok(())
    }

    /// Full URL of the to-do view
    pub fn app_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.app_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { width: 1280, height: 720 }
    }
}

/// Options for polling waits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_playwright_demo() {
        let config = HarnessConfig::default();
        assert_eq!(config.app_url(), "https://demo.playwright.dev/todomvc/");
        assert_eq!(config.storage_key, "react-todos");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
base_url: http://127.0.0.1:3000/
browser: firefox
viewport:
  width: 1920
  height: 1080
wait:
  timeout_ms: 10000
"#;
        let config = HarnessConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.browser, Browser::Firefox);
        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.wait.timeout_ms, 10_000);
        assert_eq!(config.wait.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.app_url(), "http://127.0.0.1:3000/todomvc/");
    }

    #[test]
    fn test_rejects_relative_app_path() {
        let err = HarnessConfig::from_yaml("app_path: todomvc/").unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let yaml = "wait:\n  poll_interval_ms: 0\n";
        assert!(HarnessConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("WebKit".parse::<Browser>().unwrap(), Browser::Webkit);
        assert!("netscape".parse::<Browser>().is_err());
    }
}
