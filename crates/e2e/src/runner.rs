//! Test runner that opens a fresh page per scenario and collects results

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::HarnessConfig;
use crate::driver::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::page::TodoPage;
use crate::playwright::{PlaywrightConfig, PlaywrightSession};
use crate::scenarios::{catalog, Scenario};
use crate::simulator::{SimulatorOptions, TodoMvcSimulator};

/// Opens an isolated browser context for one scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Driver: PageDriver + 'static;

    async fn open(&self) -> E2eResult<Self::Driver>;
}

/// Real browser sessions through the Playwright bridge
#[derive(Debug, Clone)]
pub struct PlaywrightFactory {
    config: PlaywrightConfig,
}

impl PlaywrightFactory {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for PlaywrightFactory {
    type Driver = PlaywrightSession;

    async fn open(&self) -> E2eResult<PlaywrightSession> {
        PlaywrightSession::launch(self.config.clone()).await
    }
}

/// In-process simulator sessions, each with empty storage
#[derive(Debug, Clone, Default)]
pub struct SimulatorFactory {
    options: SimulatorOptions,
}

impl SimulatorFactory {
    pub fn new(options: SimulatorOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(SimulatorOptions {
            app_path: config.app_path.clone(),
            storage_key: config.storage_key.clone(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl SessionFactory for SimulatorFactory {
    type Driver = TodoMvcSimulator;

    async fn open(&self) -> E2eResult<TodoMvcSimulator> {
        Ok(TodoMvcSimulator::new(self.options.clone()))
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Main E2E test runner
pub struct TestRunner<F> {
    factory: F,
    config: HarnessConfig,
}

impl<F: SessionFactory> TestRunner<F> {
    pub fn new(factory: F, config: HarnessConfig) -> Self {
        Self { factory, config }
    }

    /// Run the whole catalog
    pub async fn run_all(&self) -> TestSuiteResult {
        self.run_scenarios(&catalog()).await
    }

    /// Run scenarios carrying a tag
    pub async fn run_tagged(&self, tag: &str) -> TestSuiteResult {
        let scenarios: Vec<_> = catalog().into_iter().filter(|s| s.has_tag(tag)).collect();
        self.run_scenarios(&scenarios).await
    }

    /// Run scenarios whose name contains any of the filters
    pub async fn run_matching(&self, filters: &[String]) -> TestSuiteResult {
        let scenarios: Vec<_> = catalog()
            .into_iter()
            .filter(|s| filters.is_empty() || filters.iter().any(|f| s.name.contains(f.as_str())))
            .collect();
        self.run_scenarios(&scenarios).await
    }

    /// Run a specific scenario by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let scenario = catalog::<F::Driver>()
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::Config(format!("Test not found: {}", name)))?;
        Ok(self.run_scenario(&scenario).await)
    }

    pub async fn run_scenarios(&self, scenarios: &[Scenario<F::Driver>]) -> TestSuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} test(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        TestSuiteResult {
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run one scenario on a fresh page. Failures land in the result.
    pub async fn run_scenario(&self, scenario: &Scenario<F::Driver>) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", scenario.name);

        let outcome = self.execute(scenario).await;

        TestResult {
            name: scenario.name.to_string(),
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    async fn execute(&self, scenario: &Scenario<F::Driver>) -> E2eResult<()> {
        let driver = self.factory.open().await?;
        let page = TodoPage::new(driver, &self.config);

        let mut outcome = page.navigate().await;
        if outcome.is_ok() {
            outcome = (scenario.run)(&page).await;
        }

        if let Err(e) = page.into_driver().close().await {
            warn!("Failed to close session for {}: {}", scenario.name, e);
        }
        outcome
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
