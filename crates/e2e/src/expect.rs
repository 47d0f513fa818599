//! Retrying structural assertions over a `TodoPage`
//!
//! Each assertion re-reads the page until it matches or the page's wait
//! timeout elapses, like Playwright's web-first `expect`.

use std::fmt;

use crate::driver::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::model::Filter;
use crate::page::TodoPage;
use crate::sync::poll_until;

/// Entry point: `expect(&page).to_have_texts(&[..]).await?`
pub fn expect<D: PageDriver>(page: &TodoPage<D>) -> PageExpectation<'_, D> {
    PageExpectation { page }
}

pub struct PageExpectation<'p, D> {
    page: &'p TodoPage<D>,
}

/// Debug-formatted value, so any observation can be reported
struct Shown<T>(T);

impl<T: fmt::Debug> fmt::Display for Shown<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl<'p, D: PageDriver> PageExpectation<'p, D> {
    async fn holds<T, F, Fut>(&self, expected: T, read: F) -> E2eResult<()>
    where
        T: fmt::Debug + PartialEq,
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = E2eResult<T>>,
    {
        let expected_text = format!("{:?}", expected);
        let read = &read;
        let outcome = poll_until(
            &expected_text,
            self.page.wait_options(),
            move || async move { read().await.map(Shown) },
            |observed| observed.0 == expected,
        )
        .await;

        match outcome {
            Ok(_) => Ok(()),
            Err(E2eError::Timeout { last_observed, .. }) => Err(E2eError::AssertionFailed {
                expected: expected_text,
                actual: last_observed,
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn to_have_texts<S: AsRef<str>>(&self, expected: &[S]) -> E2eResult<()> {
        let expected: Vec<String> = expected.iter().map(|s| s.as_ref().to_string()).collect();
        self.holds(expected, || self.page.item_texts()).await
    }

    pub async fn to_have_count(&self, expected: usize) -> E2eResult<()> {
        self.holds(expected, || self.page.item_count()).await
    }

    pub async fn to_have_classes<S: AsRef<str>>(&self, expected: &[S]) -> E2eResult<()> {
        let expected: Vec<String> = expected.iter().map(|s| s.as_ref().to_string()).collect();
        self.holds(expected, || self.page.item_classes()).await
    }

    pub async fn to_have_completion_markers(&self, expected: &[bool]) -> E2eResult<()> {
        self.holds(expected.to_vec(), || self.page.completion_markers())
            .await
    }

    pub async fn to_have_remaining_label(&self, expected: &str) -> E2eResult<()> {
        self.holds(expected.to_string(), || self.page.remaining_label())
            .await
    }

    pub async fn to_have_empty_input(&self) -> E2eResult<()> {
        self.holds(String::new(), || self.page.input_value()).await
    }

    pub async fn to_have_mark_all_checked(&self, checked: bool) -> E2eResult<()> {
        self.holds(checked, || self.page.is_mark_all_checked()).await
    }

    pub async fn to_have_active_filter(&self, filter: Filter) -> E2eResult<()> {
        self.holds(Some(filter), || self.page.active_filter()).await
    }
}
