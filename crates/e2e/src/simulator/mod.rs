//! In-process TodoMVC simulator
//!
//! Implements `PageDriver` against a deterministic model of the TodoMVC app
//! so the harness can exercise its page objects without a browser. It
//! follows the same DOM contract as the real app, enforces visibility and
//! strict mode for actions, and persists to a simulated `localStorage` with
//! a configurable lag.

mod app;
mod dom;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::driver::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::model::{Filter, PersistedSnapshot};

pub use app::TodoApp;
pub use dom::{Document, Element, Target};

/// Simulator settings
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    /// Path the app is served from
    pub app_path: String,

    pub storage_key: String,

    /// Storage reads that still see the old value after a mutation
    pub persist_after_reads: usize,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            app_path: "/todomvc/".to_string(),
            storage_key: "react-todos".to_string(),
            persist_after_reads: 2,
        }
    }
}

#[derive(Debug)]
struct PendingWrite {
    value: String,
    reads_left: usize,
}

#[derive(Debug, Default)]
struct PageState {
    url: Option<String>,
    app: Option<TodoApp>,
    hovered: Option<usize>,
    storage: HashMap<String, String>,
    pending: Option<PendingWrite>,
}

#[derive(Debug, Clone, Copy)]
enum Action<'a> {
    Fill(&'a str),
    Press(&'a str),
    Click,
    DblClick,
    Hover,
    Blur,
}

impl Action<'_> {
    fn requires_visible(&self) -> bool {
        !matches!(self, Action::Blur)
    }

    fn takes_focus(&self) -> bool {
        !matches!(self, Action::Hover | Action::Blur)
    }
}

pub struct TodoMvcSimulator {
    options: SimulatorOptions,
    state: Mutex<PageState>,
}

impl TodoMvcSimulator {
    pub fn new(options: SimulatorOptions) -> Self {
        Self {
            options,
            state: Mutex::new(PageState::default()),
        }
    }

    /// Simulator with pre-seeded storage, as if a previous visit persisted it
    pub fn with_storage(options: SimulatorOptions, value: impl Into<String>) -> Self {
        let sim = Self::new(options);
        {
            let mut state = sim.state.lock();
            state.storage.insert(sim.options.storage_key.clone(), value.into());
        }
        sim
    }

    pub fn options(&self) -> &SimulatorOptions {
        &self.options
    }

    /// Current URL, if navigated
    pub fn url(&self) -> Option<String> {
        self.state.lock().url.clone()
    }

    fn document(state: &PageState) -> Option<Document> {
        state.app.as_ref().map(|app| Document::new(app.render(state.hovered)))
    }

    fn require_document(state: &PageState, locator: &Locator) -> E2eResult<Document> {
        Self::document(state).ok_or_else(|| E2eError::driver(locator, "page has not been navigated to the app"))
    }

    /// Resolve to exactly one element
    fn single(doc: &Document, locator: &Locator) -> E2eResult<Vec<usize>> {
        let mut found = doc.resolve(locator)?;
        match found.len() {
            0 => Err(E2eError::driver(locator, "no element matches")),
            1 => Ok(found.remove(0)),
            n => Err(E2eError::driver(
                locator,
                format!("strict mode violation: resolved to {} elements", n),
            )),
        }
    }

    fn act(&self, locator: &Locator, action: Action<'_>) -> E2eResult<()> {
        let mut state = self.state.lock();
        trace!("sim {:?} on {}", action, locator);

        let mut target = Self::resolve_target(&state, locator, action)?;

        // Acting anywhere else takes focus from an open editor, committing it
        let editing = state.app.as_ref().and_then(|a| a.editing_index());
        if let Some(index) = editing.filter(|_| action.takes_focus()) {
            if target != Some(Target::ItemEdit(index)) {
                if let Some(app) = state.app.as_mut() {
                    app.commit_edit();
                }
                target = Self::resolve_target(&state, locator, action)?;
            }
        }

        let Some(target) = target else {
            self.schedule_persist(&mut state);
            return Ok(());
        };

        let PageState { app, hovered, url, .. } = &mut *state;
        let Some(app) = app.as_mut() else {
            return Err(E2eError::driver(locator, "page has not been navigated to the app"));
        };

        // The pointer ends up over whatever was clicked
        if matches!(action, Action::Click | Action::DblClick) {
            *hovered = target.item_index();
        }

        match (action, target) {
            (Action::Fill(text), Target::NewTodo) => app.set_draft(text),
            (Action::Fill(text), Target::ItemEdit(_)) => app.set_edit_text(text),
            (Action::Fill(_), _) => {
                return Err(E2eError::driver(locator, "element is not an <input>"));
            }
            (Action::Press("Enter"), Target::NewTodo) => app.submit_draft(),
            (Action::Press("Enter"), Target::ItemEdit(_)) => app.commit_edit(),
            (Action::Press("Escape"), Target::ItemEdit(_)) => app.cancel_edit(),
            (Action::Click, Target::ToggleAll) => app.toggle_all(),
            (Action::Click, Target::ItemToggle(i)) => app.toggle(i),
            (Action::Click, Target::ItemDestroy(i)) => {
                app.destroy(i);
                *hovered = None;
            }
            (Action::Click, Target::Filter(filter)) => {
                app.set_filter(filter);
                if let Some(url) = url.as_mut() {
                    let base = url.split('#').next().unwrap_or_default().to_string();
                    *url = format!("{}{}", base, filter.route());
                }
            }
            (Action::Click, Target::ClearCompleted) => app.clear_completed(),
            (Action::DblClick, Target::ItemTitle(i)) => app.begin_edit(i),
            (Action::Hover, t) => *hovered = t.item_index(),
            (Action::Blur, Target::ItemEdit(_)) => app.commit_edit(),
            _ => {}
        }

        self.schedule_persist(&mut state);
        Ok(())
    }

    /// Target of the single element the locator resolves to, checking visibility
    fn resolve_target(state: &PageState, locator: &Locator, action: Action<'_>) -> E2eResult<Option<Target>> {
        let doc = Self::require_document(state, locator)?;
        let path = Self::single(&doc, locator)?;
        if action.requires_visible() && !doc.is_visible(&path) {
            return Err(E2eError::driver(locator, "element is not visible"));
        }
        Ok(doc.get(&path).target)
    }

    fn schedule_persist(&self, state: &mut PageState) {
        let Some(app) = state.app.as_ref() else {
            return;
        };
        let Ok(value) = serde_json::to_string(&app.snapshot()) else {
            return;
        };

        let latest = state
            .pending
            .as_ref()
            .map(|p| &p.value)
            .or_else(|| state.storage.get(&self.options.storage_key));
        if latest == Some(&value) {
            return;
        }

        if self.options.persist_after_reads == 0 {
            state.storage.insert(self.options.storage_key.clone(), value);
            state.pending = None;
        } else {
            state.pending = Some(PendingWrite {
                value,
                reads_left: self.options.persist_after_reads,
            });
        }
    }

    fn flush(&self, state: &mut PageState) {
        if let Some(pending) = state.pending.take() {
            state.storage.insert(self.options.storage_key.clone(), pending.value);
        }
    }

    fn query<T>(&self, locator: &Locator, read: impl FnOnce(&Document, Vec<Vec<usize>>) -> E2eResult<T>) -> E2eResult<T> {
        let state = self.state.lock();
        let doc = Self::require_document(&state, locator)?;
        let found = doc.resolve(locator)?;
        read(&doc, found)
    }

    fn query_single<T>(&self, locator: &Locator, read: impl FnOnce(&Element) -> T) -> E2eResult<T> {
        let state = self.state.lock();
        let doc = Self::require_document(&state, locator)?;
        let path = Self::single(&doc, locator)?;
        Ok(read(doc.get(&path)))
    }
}

#[async_trait]
impl PageDriver for TodoMvcSimulator {
    async fn goto(&self, path: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        debug!("sim goto {}", path);

        // Unloading the page flushes its last write
        self.flush(&mut state);

        let (route_path, fragment) = match path.split_once('#') {
            Some((p, f)) => (p, Some(format!("#{}", f))),
            None => (path, None),
        };

        state.url = Some(path.to_string());
        state.hovered = None;
        state.app = if route_path == self.options.app_path {
            let filter = fragment
                .as_deref()
                .and_then(Filter::from_route)
                .unwrap_or_default();
            let snapshot = state
                .storage
                .get(&self.options.storage_key)
                .and_then(|raw| PersistedSnapshot::parse(raw).ok());
            Some(TodoApp::restore(snapshot, filter))
        } else {
            None
        };

        self.schedule_persist(&mut state);
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.act(locator, Action::Fill(value))
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.act(locator, Action::Press(key))
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, Action::Click)
    }

    async fn dblclick(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, Action::DblClick)
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, Action::Hover)
    }

    async fn blur(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, Action::Blur)
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        self.query(locator, |_, found| Ok(found.len()))
    }

    async fn inner_texts(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        self.query(locator, |doc, found| {
            Ok(found.iter().map(|p| doc.get(p).text_content()).collect())
        })
    }

    async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
        let (tag, value) = self.query_single(locator, |el| (el.tag.clone(), el.value.clone()))?;
        if tag != "input" {
            return Err(E2eError::driver(locator, "element is not an <input>"));
        }
        Ok(value)
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        self.query(locator, |doc, found| match found.as_slice() {
            [] => Ok(false),
            [path] => Ok(doc.is_visible(path)),
            many => Err(E2eError::driver(
                locator,
                format!("strict mode violation: resolved to {} elements", many.len()),
            )),
        })
    }

    async fn is_checked(&self, locator: &Locator) -> E2eResult<bool> {
        let (kind, checked) = self.query_single(locator, |el| (el.attrs.get("type").cloned(), el.checked))?;
        if kind.as_deref() != Some("checkbox") {
            return Err(E2eError::driver(locator, "not a checkbox"));
        }
        Ok(checked)
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        self.query_single(locator, |el| el.attribute(name))
    }

    async fn local_storage(&self, key: &str) -> E2eResult<Option<String>> {
        let mut state = self.state.lock();
        if key == self.options.storage_key {
            let due = match state.pending.as_mut() {
                Some(pending) if pending.reads_left == 0 => true,
                Some(pending) => {
                    pending.reads_left -= 1;
                    false
                }
                None => false,
            };
            if due {
                self.flush(&mut state);
            }
        }
        Ok(state.storage.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn immediate() -> SimulatorOptions {
        SimulatorOptions { persist_after_reads: 0, ..Default::default() }
    }

    #[tokio::test]
    async fn test_actions_before_navigation_fail() {
        let sim = TodoMvcSimulator::new(immediate());
        let err = sim.click(&Locator::css("input.new-todo")).await.unwrap_err();
        assert!(err.to_string().contains("not been navigated"));
    }

    #[tokio::test]
    async fn test_strict_mode_violation() {
        let sim = TodoMvcSimulator::new(immediate());
        sim.goto("/todomvc/").await.unwrap();
        let input = Locator::css("input.new-todo");
        for title in ["a", "b"] {
            sim.fill(&input, title).await.unwrap();
            sim.press(&input, "Enter").await.unwrap();
        }
        let err = sim.click(&Locator::css("input.toggle")).await.unwrap_err();
        assert!(err.to_string().contains("strict mode violation"));
    }

    #[tokio::test]
    async fn test_delete_requires_hover() {
        let sim = TodoMvcSimulator::new(immediate());
        sim.goto("/todomvc/").await.unwrap();
        let input = Locator::css("input.new-todo");
        sim.fill(&input, "a").await.unwrap();
        sim.press(&input, "Enter").await.unwrap();

        let item = Locator::test_id("todo-item").first();
        let delete = item.clone().get_by_label("Delete");
        let err = sim.click(&delete).await.unwrap_err();
        assert!(err.to_string().contains("not visible"));

        sim.hover(&item).await.unwrap();
        sim.click(&delete).await.unwrap();
        assert_eq!(sim.count(&Locator::test_id("todo-item")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_click_elsewhere_moves_hover_away() {
        let sim = TodoMvcSimulator::new(immediate());
        sim.goto("/todomvc/").await.unwrap();
        let input = Locator::css("input.new-todo");
        sim.fill(&input, "a").await.unwrap();
        sim.press(&input, "Enter").await.unwrap();

        let item = Locator::test_id("todo-item").first();
        let delete = item.clone().get_by_label("Delete");
        sim.hover(&item).await.unwrap();
        sim.click(&Locator::label("Mark all as complete")).await.unwrap();

        let err = sim.click(&delete).await.unwrap_err();
        assert!(err.to_string().contains("not visible"));
        assert!(!sim.is_visible(&delete).await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_write_lags_reads() {
        let sim = TodoMvcSimulator::new(SimulatorOptions { persist_after_reads: 2, ..Default::default() });
        sim.goto("/todomvc/").await.unwrap();
        sim.local_storage("react-todos").await.unwrap();
        sim.local_storage("react-todos").await.unwrap();
        assert_eq!(sim.local_storage("react-todos").await.unwrap().as_deref(), Some("[]"));

        let input = Locator::css("input.new-todo");
        sim.fill(&input, "a").await.unwrap();
        sim.press(&input, "Enter").await.unwrap();
        assert_eq!(sim.local_storage("react-todos").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(sim.local_storage("react-todos").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(
            sim.local_storage("react-todos").await.unwrap().as_deref(),
            Some(r#"[{"title":"a","completed":false}]"#)
        );
    }

    #[tokio::test]
    async fn test_goto_restores_storage_and_route() {
        let sim = TodoMvcSimulator::with_storage(
            immediate(),
            r#"[{"title":"a","completed":true},{"title":"b","completed":false}]"#,
        );
        sim.goto("/todomvc/#/active").await.unwrap();
        let titles = sim.inner_texts(&Locator::test_id("todo-title")).await.unwrap();
        assert_eq!(titles, vec!["b".to_string()]);
        assert_eq!(sim.url().as_deref(), Some("/todomvc/#/active"));
    }

    #[tokio::test]
    async fn test_unknown_path_renders_nothing() {
        let sim = TodoMvcSimulator::new(immediate());
        sim.goto("/elsewhere").await.unwrap();
        assert!(sim.count(&Locator::test_id("todo-item")).await.is_err());
    }
}
