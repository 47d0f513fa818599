//! Playwright browser automation
//!
//! Each `PlaywrightSession` owns one Node.js process running a generated
//! bridge script, which holds a single browser context and page. Commands
//! travel as JSON lines over stdin; every command gets exactly one JSON line
//! back on stdout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::{Browser, HarnessConfig, Viewport};
use crate::driver::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;

/// Configuration for a Playwright session
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport: Viewport,
    pub action_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self::from(&HarnessConfig::default())
    }
}

impl From<&HarnessConfig> for PlaywrightConfig {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            browser: config.browser,
            headless: config.headless,
            viewport: config.viewport,
            action_timeout_ms: config.action_timeout_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    locator: Option<String>,
    #[serde(flatten)]
    args: Value,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: Option<u64>,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

struct BridgeIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// A live browser page driven through the bridge
pub struct PlaywrightSession {
    child: Mutex<Child>,
    io: Mutex<BridgeIo>,
    next_id: AtomicU64,
    // Holds the bridge script on disk for the life of the process
    _script_dir: TempDir,
}

impl PlaywrightSession {
    /// Launch a browser with a fresh context
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, build_bridge_script(&config))?;

        info!(
            "Launching {} (headless: {}) against {}",
            config.browser.as_str(),
            config.headless,
            config.base_url
        );

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Playwright(format!("Failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdout not captured".to_string()))?;

        let session = Self {
            child: Mutex::new(child),
            io: Mutex::new(BridgeIo {
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicU64::new(1),
            _script_dir: script_dir,
        };

        session.await_ready().await?;
        debug!("Playwright bridge ready");
        Ok(session)
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    async fn await_ready(&self) -> E2eResult<()> {
        let mut io = self.io.lock().await;
        let response = Self::read_response(&mut io).await?;
        if response.ready {
            Ok(())
        } else {
            Err(E2eError::Playwright(
                response
                    .error
                    .unwrap_or_else(|| "bridge did not report ready".to_string()),
            ))
        }
    }

    async fn read_response(io: &mut BridgeIo) -> E2eResult<BridgeResponse> {
        loop {
            let line = io
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Bridge("bridge exited".to_string()))?;
            trace!("bridge <- {}", line);

            // Anything that is not a protocol message is stray page output
            match serde_json::from_str::<BridgeResponse>(&line) {
                Ok(response) => return Ok(response),
                Err(_) => debug!("Ignoring bridge output: {}", line),
            }
        }
    }

    /// Send one command and wait for its response
    async fn call(&self, command: &str, locator: Option<&Locator>, args: Value) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = BridgeRequest {
            id,
            command,
            locator: locator.map(Locator::to_js),
            args,
        };
        let line = serde_json::to_string(&request)?;

        let mut io = self.io.lock().await;
        debug!("{} {}", command, locator.map(|l| l.to_string()).unwrap_or_default());
        trace!("bridge -> {}", line);

        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.write_all(b"\n").await?;
        io.stdin.flush().await?;

        loop {
            let response = Self::read_response(&mut io).await?;
            if response.id != Some(id) {
                warn!("Skipping out-of-order bridge response {:?}", response.id);
                continue;
            }
            if response.ok {
                return Ok(response.value);
            }
            let reason = response.error.unwrap_or_else(|| "unknown bridge error".to_string());
            return Err(match locator {
                Some(l) => E2eError::driver(l, reason),
                None => E2eError::Playwright(reason),
            });
        }
    }

    async fn call_unit(&self, command: &str, locator: &Locator, args: Value) -> E2eResult<()> {
        self.call(command, Some(locator), args).await.map(|_| ())
    }

    async fn call_as<T: serde::de::DeserializeOwned>(
        &self,
        command: &str,
        locator: Option<&Locator>,
        args: Value,
    ) -> E2eResult<T> {
        let value = self.call(command, locator, args).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl PageDriver for PlaywrightSession {
    async fn goto(&self, path: &str) -> E2eResult<()> {
        self.call("goto", None, json!({ "path": path })).await.map(|_| ())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.call_unit("fill", locator, json!({ "value": value })).await
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.call_unit("press", locator, json!({ "key": key })).await
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.call_unit("click", locator, json!({})).await
    }

    async fn dblclick(&self, locator: &Locator) -> E2eResult<()> {
        self.call_unit("dblclick", locator, json!({})).await
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.call_unit("hover", locator, json!({})).await
    }

    async fn blur(&self, locator: &Locator) -> E2eResult<()> {
        self.call_unit("blur", locator, json!({})).await
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        self.call_as("count", Some(locator), json!({})).await
    }

    async fn inner_texts(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        self.call_as("allInnerTexts", Some(locator), json!({})).await
    }

    async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
        self.call_as("inputValue", Some(locator), json!({})).await
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        self.call_as("isVisible", Some(locator), json!({})).await
    }

    async fn is_checked(&self, locator: &Locator) -> E2eResult<bool> {
        self.call_as("isChecked", Some(locator), json!({})).await
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        self.call_as("getAttribute", Some(locator), json!({ "name": name }))
            .await
    }

    async fn local_storage(&self, key: &str) -> E2eResult<Option<String>> {
        self.call_as("localStorage", None, json!({ "key": key })).await
    }

    async fn close(&self) -> E2eResult<()> {
        if let Err(e) = self.call("close", None, json!({})).await {
            warn!("Bridge close failed: {}", e);
        }
        let mut child = self.child.lock().await;
        let status = child.wait().await?;
        debug!("Playwright bridge exited with {}", status);
        Ok(())
    }
}

/// Generate the Node.js bridge for a session
pub fn build_bridge_script(config: &PlaywrightConfig) -> String {
    let base_url = serde_json::Value::String(config.base_url.clone()).to_string();

    let mut script = format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const readline = require('readline');

const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {{
  let browser;
  try {{
    browser = await {browser}.launch({{ headless: {headless} }});
  }} catch (error) {{
    send({{ ready: false, error: error.message }});
    process.exit(1);
  }}
  const context = await browser.newContext({{
    baseURL: {base_url},
    viewport: {{ width: {width}, height: {height} }}
  }});
  context.setDefaultTimeout({timeout});
  const page = await context.newPage();
  const locate = (expr) => new Function('page', 'return ' + expr + ';')(page);
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        base_url = base_url,
        width = config.viewport.width,
        height = config.viewport.height,
        timeout = config.action_timeout_ms,
    );

    script.push_str(
        r#"
  const run = async (cmd) => {
    const loc = cmd.locator ? locate(cmd.locator) : null;
    switch (cmd.command) {
      case 'goto': await page.goto(cmd.path); return null;
      case 'fill': await loc.fill(cmd.value); return null;
      case 'press': await loc.press(cmd.key); return null;
      case 'click': await loc.click(); return null;
      case 'dblclick': await loc.dblclick(); return null;
      case 'hover': await loc.hover(); return null;
      case 'blur': await loc.blur(); return null;
      case 'count': return await loc.count();
      case 'allInnerTexts': return await loc.allInnerTexts();
      case 'inputValue': return await loc.inputValue();
      case 'isVisible': return await loc.isVisible();
      case 'isChecked': return await loc.isChecked();
      case 'getAttribute': return await loc.getAttribute(cmd.name);
      case 'localStorage':
        return await page.evaluate((key) => window.localStorage.getItem(key), cmd.key);
      case 'close': return null;
      default: throw new Error('unknown command: ' + cmd.command);
    }
  };

  send({ ready: true });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let cmd;
    try {
      cmd = JSON.parse(line);
    } catch (error) {
      send({ ok: false, error: 'malformed command: ' + error.message });
      continue;
    }
    try {
      const value = await run(cmd);
      send({ id: cmd.id, ok: true, value: value === undefined ? null : value });
    } catch (error) {
      send({ id: cmd.id, ok: false, error: error.message });
    }
    if (cmd.command === 'close') break;
  }

  await browser.close();
  process.exit(0);
})();
"#,
    );

    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_script_embeds_config() {
        let config = PlaywrightConfig {
            base_url: "http://127.0.0.1:3000".to_string(),
            browser: Browser::Firefox,
            headless: false,
            viewport: Viewport { width: 800, height: 600 },
            action_timeout_ms: 2500,
        };
        let script = build_bridge_script(&config);
        assert!(script.contains("await firefox.launch({ headless: false })"));
        assert!(script.contains(r#"baseURL: "http://127.0.0.1:3000""#));
        assert!(script.contains("viewport: { width: 800, height: 600 }"));
        assert!(script.contains("context.setDefaultTimeout(2500)"));
        assert!(script.contains("case 'allInnerTexts'"));
    }

    #[test]
    fn test_request_wire_format() {
        let request = BridgeRequest {
            id: 7,
            command: "fill",
            locator: Some(Locator::css("input.new-todo").to_js()),
            args: json!({ "value": "feed the cat" }),
        };
        let line = serde_json::to_value(&request).unwrap();
        assert_eq!(
            line,
            json!({
                "id": 7,
                "command": "fill",
                "locator": "page.locator(\"input.new-todo\")",
                "value": "feed the cat"
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let ready: BridgeResponse = serde_json::from_str(r#"{"ready":true}"#).unwrap();
        assert!(ready.ready);
        assert_eq!(ready.id, None);

        let failed: BridgeResponse =
            serde_json::from_str(r#"{"id":3,"ok":false,"error":"Timeout 5000ms exceeded"}"#).unwrap();
        assert_eq!(failed.id, Some(3));
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("Timeout 5000ms exceeded"));
    }

    #[test]
    fn test_config_from_harness_trims_base_url() {
        let harness = HarnessConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(PlaywrightConfig::from(&harness).base_url, "http://localhost:8080");
    }
}
