//! Synchronization against eventually-consistent state
//!
//! A mutating page operation returning does not mean the application has
//! finished writing its persisted snapshot. Assertions against storage go
//! through these helpers instead of reading it once.

use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::config::WaitOptions;
use crate::driver::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::model::{PersistedSnapshot, StorageObservation};

/// Poll `probe` until `predicate` accepts its value or the timeout elapses.
///
/// The probe runs at least once. On expiry the error carries `description`
/// and the last observed value. Probe errors abort immediately.
pub async fn poll_until<T, F, Fut, P>(
    description: &str,
    options: &WaitOptions,
    mut probe: F,
    predicate: P,
) -> E2eResult<T>
where
    T: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<T>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut polls = 0usize;

    loop {
        polls += 1;
        let observed = probe().await?;
        if predicate(&observed) {
            debug!("Satisfied '{}' after {} poll(s)", description, polls);
            return Ok(observed);
        }
        trace!("'{}' not yet satisfied, observed {}", description, observed);

        if start.elapsed() >= options.timeout() {
            return Err(E2eError::Timeout {
                waited_for: description.to_string(),
                last_observed: observed.to_string(),
                timeout_ms: options.timeout_ms,
            });
        }
        sleep(options.poll_interval()).await;
    }
}

/// Reads and awaits the persisted snapshot under one storage key
pub struct StorageWatcher<'a, D: ?Sized> {
    driver: &'a D,
    key: &'a str,
    options: WaitOptions,
}

impl<'a, D: PageDriver + ?Sized> StorageWatcher<'a, D> {
    pub fn new(driver: &'a D, key: &'a str, options: WaitOptions) -> Self {
        Self { driver, key, options }
    }

    pub fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// One read, no waiting
    pub async fn observe(&self) -> E2eResult<StorageObservation> {
        let raw = self.driver.local_storage(self.key).await?;
        Ok(StorageObservation::from_raw(raw))
    }

    /// Wait until the snapshot satisfies `predicate`
    pub async fn wait_until<P>(&self, description: &str, predicate: P) -> E2eResult<PersistedSnapshot>
    where
        P: Fn(&PersistedSnapshot) -> bool,
    {
        let observed = poll_until(
            description,
            &self.options,
            || self.observe(),
            |obs| obs.snapshot().map(&predicate).unwrap_or(false),
        )
        .await?;

        match observed {
            StorageObservation::Snapshot(snapshot) => Ok(snapshot),
            other => Err(E2eError::Bridge(format!(
                "predicate accepted non-snapshot observation {}",
                other
            ))),
        }
    }

    pub async fn wait_for_total_count(&self, expected: usize) -> E2eResult<PersistedSnapshot> {
        self.wait_until(
            &format!("{} todo(s) in localStorage[{:?}]", expected, self.key),
            |s| s.total_count() == expected,
        )
        .await
    }

    pub async fn wait_for_completed_count(&self, expected: usize) -> E2eResult<PersistedSnapshot> {
        self.wait_until(
            &format!("{} completed todo(s) in localStorage[{:?}]", expected, self.key),
            |s| s.completed_count() == expected,
        )
        .await
    }

    pub async fn wait_for_item_title_present(&self, title: &str) -> E2eResult<PersistedSnapshot> {
        self.wait_until(
            &format!("todo titled {:?} in localStorage[{:?}]", title, self.key),
            |s| s.contains_title(title),
        )
        .await
    }
}
