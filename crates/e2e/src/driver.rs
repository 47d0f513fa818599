//! Automation surface consumed by page objects
//!
//! `PageDriver` is the seam between page objects and whatever actually
//! drives the page: the Playwright bridge for live runs, or the in-process
//! simulator for the harness's own tests.

use async_trait::async_trait;

use crate::error::E2eResult;
use crate::locator::Locator;

/// Browser-tab level primitives. Actions fail if the locator resolves to
/// zero elements or, in strict mode, to more than one.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a path relative to the configured base URL
    async fn goto(&self, path: &str) -> E2eResult<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()>;

    async fn click(&self, locator: &Locator) -> E2eResult<()>;

    async fn dblclick(&self, locator: &Locator) -> E2eResult<()>;

    async fn hover(&self, locator: &Locator) -> E2eResult<()>;

    /// Move focus away from the element
    async fn blur(&self, locator: &Locator) -> E2eResult<()>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    /// Rendered text of every match, in document order
    async fn inner_texts(&self, locator: &Locator) -> E2eResult<Vec<String>>;

    async fn input_value(&self, locator: &Locator) -> E2eResult<String>;

    /// False when nothing matches
    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;

    async fn is_checked(&self, locator: &Locator) -> E2eResult<bool>;

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    /// Raw `localStorage` value for a key
    async fn local_storage(&self, key: &str) -> E2eResult<Option<String>>;

    async fn close(&self) -> E2eResult<()> {
        Ok(())
    }
}
