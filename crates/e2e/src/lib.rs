//! TodoMVC E2E Test Framework
//!
//! This crate provides a Rust-controlled E2E testing framework that:
//! - Models the TodoMVC list view as a page object addressed by item text
//! - Controls Playwright through a JSON-lines bridge process
//! - Synchronizes on the app's persisted `localStorage` state
//! - Runs a catalog of behavioral scenarios against a fresh page each
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner<F: SessionFactory>                              │
//! │    ├── open() -> PlaywrightSession | TodoMvcSimulator       │
//! │    ├── run_scenario(Scenario) -> TestResult                 │
//! │    └── write_results(TestSuiteResult)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TodoPage<D: PageDriver>                                    │
//! │    ├── BasePage (Navigate)                                  │
//! │    ├── add_item / remove_item / edit_item / begin_edit      │
//! │    ├── toggle_complete[_all] / clear_completed / set_filter │
//! │    └── storage() -> StorageWatcher                          │
//! │          ├── wait_for_total_count                           │
//! │          ├── wait_for_completed_count                       │
//! │          └── wait_for_item_title_present                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  expect(&page).to_have_texts / to_have_classes / ...        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod expect;
pub mod locator;
pub mod model;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod simulator;
pub mod sync;
pub mod target;

pub use config::{Browser, HarnessConfig, Viewport, WaitOptions};
pub use driver::PageDriver;
pub use error::{E2eError, E2eResult};
pub use expect::expect;
pub use locator::Locator;
pub use model::{Filter, Item, PersistedSnapshot, StorageObservation, StoredTodo};
pub use page::{BasePage, EditSession, Navigate, TodoPage};
pub use runner::{SessionFactory, TestResult, TestRunner, TestSuiteResult};
pub use sync::{poll_until, StorageWatcher};
