//! Page objects for the TodoMVC application

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::config::{HarnessConfig, WaitOptions};
use crate::driver::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::model::Filter;
use crate::sync::{poll_until, StorageWatcher};

/// Anything that can be pointed at a path of the application
#[async_trait]
pub trait Navigate {
    async fn navigate_to(&self, path: &str) -> E2eResult<()>;
}

/// Shared navigation behavior, composed into concrete page objects
pub struct BasePage<D> {
    driver: D,
}

impl<D: PageDriver> BasePage<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}

#[async_trait]
impl<D: PageDriver> Navigate for BasePage<D> {
    async fn navigate_to(&self, path: &str) -> E2eResult<()> {
        info!("Navigating to {}", path);
        self.driver.goto(path).await
    }
}

/// Page object for the to-do list view.
///
/// Items are addressed by their exact rendered text. Each operation resolves
/// that text to a position against the live DOM at call time and acts on it
/// immediately; no element is remembered between calls.
pub struct TodoPage<D> {
    base: BasePage<D>,
    app_path: String,
    storage_key: String,
    wait: WaitOptions,
}

impl<D: PageDriver> TodoPage<D> {
    pub fn new(driver: D, config: &HarnessConfig) -> Self {
        Self {
            base: BasePage::new(driver),
            app_path: config.app_path.clone(),
            storage_key: config.storage_key.clone(),
            wait: config.wait,
        }
    }

    pub fn driver(&self) -> &D {
        self.base.driver()
    }

    pub fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// Release the underlying driver, e.g. to close it
    pub fn into_driver(self) -> D {
        self.base.into_driver()
    }

    // Locators

    pub fn input_box(&self) -> Locator {
        Locator::css("input.new-todo")
    }

    pub fn todo_items(&self) -> Locator {
        Locator::test_id("todo-item")
    }

    pub fn todo_item_text(&self) -> Locator {
        Locator::test_id("todo-title")
    }

    pub fn todo_item_count(&self) -> Locator {
        Locator::test_id("todo-count")
    }

    pub fn label_mark_all(&self) -> Locator {
        Locator::label("Mark all as complete")
    }

    pub fn clear_completed_button(&self) -> Locator {
        Locator::css("button.clear-completed")
    }

    pub fn filter_link(&self, filter: Filter) -> Locator {
        Locator::css("ul.filters a").has_text(filter.label())
    }

    pub fn item(&self, index: usize) -> Locator {
        self.todo_items().nth(index)
    }

    /// Storage synchronization helpers bound to this page's driver
    pub fn storage(&self) -> StorageWatcher<'_, D> {
        StorageWatcher::new(self.driver(), &self.storage_key, self.wait)
    }

    // Operations

    pub async fn navigate(&self) -> E2eResult<()> {
        self.base.navigate_to(&self.app_path).await
    }

    /// Navigate straight to a filtered view
    pub async fn navigate_filtered(&self, filter: Filter) -> E2eResult<()> {
        let path = format!("{}{}", self.app_path, filter.route());
        self.base.navigate_to(&path).await
    }

    pub async fn add_item(&self, text: &str) -> E2eResult<()> {
        debug!("Adding todo {:?}", text);
        let input = self.input_box();
        self.driver().fill(&input, text).await?;
        self.driver().press(&input, "Enter").await
    }

    pub async fn remove_item(&self, text: &str) -> E2eResult<()> {
        let index = self.index_of(text).await?;
        debug!("Removing todo {:?} at position {}", text, index);
        self.remove_at(index).await
    }

    /// Remove the first remaining item until none are left.
    ///
    /// Items hidden by a filter are part of the list too, so the view is
    /// switched to `All` first. An emptied list renders no filter links, so
    /// the page stays on `All` afterwards.
    pub async fn remove_all_items(&self) -> E2eResult<()> {
        if let Some(filter) = self.active_filter().await?.filter(|f| *f != Filter::All) {
            debug!("Leaving {} view to remove every todo", filter);
            self.set_filter(Filter::All).await?;
        }
        loop {
            let remaining = self.item_count().await?;
            if remaining == 0 {
                return Ok(());
            }
            self.remove_at(0).await?;
            self.wait_for_item_count_below(remaining).await?;
        }
    }

    pub async fn edit_item(&self, old_text: &str, new_text: &str) -> E2eResult<()> {
        let session = self.begin_edit(old_text).await?;
        session.fill(new_text).await?;
        session.commit().await
    }

    /// Double-click the item's label to enter edit mode.
    ///
    /// An editor left open by an earlier session is committed first, since
    /// committing it may remove its item and shift positions.
    pub async fn begin_edit(&self, text: &str) -> E2eResult<EditSession<'_, D>> {
        self.commit_open_edit().await?;
        let index = self.index_of(text).await?;
        debug!("Editing todo {:?} at position {}", text, index);
        self.driver()
            .dblclick(&self.item(index).get_by_test_id("todo-title"))
            .await?;
        Ok(EditSession { page: self, index })
    }

    pub async fn toggle_complete_all(&self) -> E2eResult<()> {
        self.driver().click(&self.label_mark_all()).await
    }

    pub async fn toggle_complete(&self, text: &str) -> E2eResult<()> {
        let index = self.index_of(text).await?;
        self.driver().click(&self.item(index).locator("input.toggle")).await
    }

    pub async fn is_complete(&self, text: &str) -> E2eResult<bool> {
        let index = self.index_of(text).await?;
        self.driver().is_checked(&self.item(index).locator("input.toggle")).await
    }

    pub async fn clear_completed(&self) -> E2eResult<()> {
        let button = self.clear_completed_button();
        if !self.driver().is_visible(&button).await? {
            return Err(E2eError::precondition(
                "clear completed todos",
                "no completed todos (control not rendered)",
            ));
        }
        self.driver().click(&button).await
    }

    pub async fn set_filter(&self, filter: Filter) -> E2eResult<()> {
        debug!("Selecting filter {}", filter);
        self.driver().click(&self.filter_link(filter)).await
    }

    // Queries

    pub async fn item_count(&self) -> E2eResult<usize> {
        self.driver().count(&self.todo_items()).await
    }

    pub async fn item_texts(&self) -> E2eResult<Vec<String>> {
        self.driver().inner_texts(&self.todo_item_text()).await
    }

    /// Class attribute of every rendered item, `""` when absent
    pub async fn item_classes(&self) -> E2eResult<Vec<String>> {
        let count = self.item_count().await?;
        let mut classes = Vec::with_capacity(count);
        for i in 0..count {
            let class = self.driver().get_attribute(&self.item(i), "class").await?;
            classes.push(class.unwrap_or_default());
        }
        Ok(classes)
    }

    /// Whether each rendered item carries the `completed` marker
    pub async fn completion_markers(&self) -> E2eResult<Vec<bool>> {
        Ok(self
            .item_classes()
            .await?
            .iter()
            .map(|c| c.split_whitespace().any(|class| class == "completed"))
            .collect())
    }

    pub async fn remaining_label(&self) -> E2eResult<String> {
        let texts = self.driver().inner_texts(&self.todo_item_count()).await?;
        Ok(texts.into_iter().next().unwrap_or_default())
    }

    /// Number parsed from the "N items left" label; 0 when it is not rendered
    pub async fn remaining_count(&self) -> E2eResult<usize> {
        let label = self.remaining_label().await?;
        if label.is_empty() {
            return Ok(0);
        }
        parse_remaining(&label).ok_or_else(|| E2eError::AssertionFailed {
            expected: "a label like \"N items left\"".to_string(),
            actual: format!("{:?}", label),
        })
    }

    pub async fn active_filter(&self) -> E2eResult<Option<Filter>> {
        let selected = self
            .driver()
            .inner_texts(&Locator::css("ul.filters a.selected"))
            .await?;
        Ok(selected.first().and_then(|t| t.parse().ok()))
    }

    pub async fn input_value(&self) -> E2eResult<String> {
        self.driver().input_value(&self.input_box()).await
    }

    pub async fn is_mark_all_checked(&self) -> E2eResult<bool> {
        self.driver().is_checked(&self.label_mark_all()).await
    }

    pub async fn is_clear_completed_visible(&self) -> E2eResult<bool> {
        self.driver().is_visible(&self.clear_completed_button()).await
    }

    // Internals

    async fn index_of(&self, text: &str) -> E2eResult<usize> {
        self.item_texts()
            .await?
            .iter()
            .position(|t| t == text)
            .ok_or_else(|| E2eError::not_found(text))
    }

    async fn commit_open_edit(&self) -> E2eResult<()> {
        let open = self.todo_items().locator("input.edit");
        if self.driver().count(&open).await? > 0 {
            debug!("Committing open edit before starting another");
            self.driver().blur(&open.first()).await?;
        }
        Ok(())
    }

    async fn remove_at(&self, index: usize) -> E2eResult<()> {
        let item = self.item(index);
        self.driver().hover(&item).await?;
        self.driver().click(&item.get_by_label("Delete")).await
    }

    async fn wait_for_item_count_below(&self, previous: usize) -> E2eResult<()> {
        poll_until(
            &format!("fewer than {} rendered todo(s)", previous),
            &self.wait,
            || self.item_count(),
            |count| *count < previous,
        )
        .await?;
        Ok(())
    }
}

/// An in-progress edit of one item. Consumed by commit or cancel.
#[must_use = "an edit stays open until it is committed or cancelled"]
pub struct EditSession<'p, D> {
    page: &'p TodoPage<D>,
    index: usize,
}

impl<'p, D: PageDriver> EditSession<'p, D> {
    fn edit_box(&self) -> Locator {
        self.page.item(self.index).locator("input.edit")
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Replace the pending text
    pub async fn fill(&self, text: &str) -> E2eResult<()> {
        self.page.driver().fill(&self.edit_box(), text).await
    }

    pub async fn pending_text(&self) -> E2eResult<String> {
        self.page.driver().input_value(&self.edit_box()).await
    }

    /// Whether the item's checkbox or label is visible
    pub async fn item_controls_visible(&self) -> E2eResult<bool> {
        let item = self.page.item(self.index);
        let driver = self.page.driver();
        let toggle = driver.is_visible(&item.clone().locator("input.toggle")).await?;
        let label = driver.is_visible(&item.get_by_test_id("todo-title")).await?;
        Ok(toggle || label)
    }

    pub async fn commit(self) -> E2eResult<()> {
        self.page.driver().press(&self.edit_box(), "Enter").await
    }

    pub async fn commit_by_blur(self) -> E2eResult<()> {
        self.page.driver().blur(&self.edit_box()).await
    }

    pub async fn cancel(self) -> E2eResult<()> {
        self.page.driver().press(&self.edit_box(), "Escape").await
    }
}

fn remaining_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(\d+)\s+items?\s+left\s*$").expect("valid regex"))
}

fn parse_remaining(label: &str) -> Option<usize> {
    remaining_pattern()
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("3 items left", Some(3))]
    #[test_case("1 item left", Some(1))]
    #[test_case("0 items left", Some(0))]
    #[test_case("items left", None)]
    #[test_case("3 items", None)]
    fn test_parse_remaining(label: &str, expected: Option<usize>) {
        assert_eq!(parse_remaining(label), expected);
    }
}
