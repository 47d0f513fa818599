//! TodoMVC application state and rendering

use crate::model::{Filter, PersistedSnapshot, StoredTodo};

use super::dom::{Element, Target};

#[derive(Debug, Clone)]
struct Editing {
    index: usize,
    text: String,
}

#[derive(Debug, Clone, Default)]
pub struct TodoApp {
    todos: Vec<StoredTodo>,
    filter: Filter,
    draft: String,
    editing: Option<Editing>,
}

impl TodoApp {
    /// Boot from whatever the page finds in storage
    pub fn restore(snapshot: Option<PersistedSnapshot>, filter: Filter) -> Self {
        Self {
            todos: snapshot.map(|s| s.todos).unwrap_or_default(),
            filter,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot { todos: self.todos.clone() }
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing.as_ref().map(|e| e.index)
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    /// Enter on the new-todo input. Blank drafts are ignored and kept.
    pub fn submit_draft(&mut self) {
        let title = self.draft.trim();
        if title.is_empty() {
            return;
        }
        self.todos.push(StoredTodo { title: title.to_string(), completed: false });
        self.draft.clear();
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(todo) = self.todos.get_mut(index) {
            todo.completed = !todo.completed;
        }
    }

    /// Mixed or all-active lists become all completed; all completed become active
    pub fn toggle_all(&mut self) {
        let completed = !self.all_completed();
        for todo in &mut self.todos {
            todo.completed = completed;
        }
    }

    pub fn destroy(&mut self, index: usize) {
        if index < self.todos.len() {
            self.todos.remove(index);
        }
    }

    pub fn clear_completed(&mut self) {
        self.todos.retain(|t| !t.completed);
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn begin_edit(&mut self, index: usize) {
        if let Some(todo) = self.todos.get(index) {
            self.editing = Some(Editing { index, text: todo.title.clone() });
        }
    }

    pub fn set_edit_text(&mut self, text: &str) {
        if let Some(editing) = &mut self.editing {
            editing.text = text.to_string();
        }
    }

    /// Trimmed text replaces the title; empty text destroys the item
    pub fn commit_edit(&mut self) {
        let Some(editing) = self.editing.take() else {
            return;
        };
        let title = editing.text.trim();
        if title.is_empty() {
            self.destroy(editing.index);
        } else if let Some(todo) = self.todos.get_mut(editing.index) {
            todo.title = title.to_string();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    fn all_completed(&self) -> bool {
        self.todos.iter().all(|t| t.completed)
    }

    fn active_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    pub fn render(&self, hovered: Option<usize>) -> Element {
        let header = Element::new("header").class("header").children([
            Element::new("h1").text("todos"),
            Element::new("input")
                .class("new-todo")
                .attr("placeholder", "What needs to be done?")
                .value(self.draft.clone())
                .target(Target::NewTodo),
        ]);

        let mut app = Element::new("section").class("todoapp").child(header);

        if !self.todos.is_empty() {
            app = app.child(self.render_main(hovered)).child(self.render_footer());
        }

        Element::new("html").child(Element::new("body").child(app))
    }

    fn render_main(&self, hovered: Option<usize>) -> Element {
        let items = self
            .todos
            .iter()
            .enumerate()
            .filter(|(_, t)| self.filter.matches(t.completed))
            .map(|(i, todo)| self.render_item(i, todo, hovered));

        Element::new("section").class("main").children([
            Element::new("input")
                .id("toggle-all")
                .class("toggle-all")
                .attr("type", "checkbox")
                .checked(self.all_completed())
                .target(Target::ToggleAll),
            Element::new("label").attr("for", "toggle-all").text("Mark all as complete"),
            Element::new("ul").class("todo-list").children(items),
        ])
    }

    fn render_item(&self, index: usize, todo: &StoredTodo, hovered: Option<usize>) -> Element {
        let editing = self.editing.as_ref().filter(|e| e.index == index);

        let view = Element::new("div").class("view").hidden(editing.is_some()).children([
            Element::new("input")
                .class("toggle")
                .attr("type", "checkbox")
                .checked(todo.completed)
                .target(Target::ItemToggle(index)),
            Element::new("label")
                .attr("data-testid", "todo-title")
                .text(todo.title.clone())
                .target(Target::ItemTitle(index)),
            Element::new("button")
                .class("destroy")
                .attr("aria-label", "Delete")
                .hidden(hovered != Some(index))
                .target(Target::ItemDestroy(index)),
        ]);

        let mut li = Element::new("li")
            .attr("data-testid", "todo-item")
            .attr("class", "")
            .class_if("completed", todo.completed)
            .class_if("editing", editing.is_some())
            .target(Target::Item(index))
            .child(view);

        if let Some(editing) = editing {
            li = li.child(
                Element::new("input")
                    .class("edit")
                    .value(editing.text.clone())
                    .target(Target::ItemEdit(index)),
            );
        }
        li
    }

    fn render_footer(&self) -> Element {
        let active = self.active_count();
        let noun = if active == 1 { "item" } else { "items" };

        let filters = Filter::ALL.into_iter().map(|f| {
            Element::new("li").child(
                Element::new("a")
                    .attr("href", f.route())
                    .class_if("selected", f == self.filter)
                    .text(f.label())
                    .target(Target::Filter(f)),
            )
        });

        let mut footer = Element::new("footer").class("footer").children([
            Element::new("span")
                .class("todo-count")
                .attr("data-testid", "todo-count")
                .text(format!("{} {} left", active, noun)),
            Element::new("ul").class("filters").children(filters),
        ]);

        if self.todos.iter().any(|t| t.completed) {
            footer = footer.child(
                Element::new("button")
                    .class("clear-completed")
                    .text("Clear completed")
                    .target(Target::ClearCompleted),
            );
        }
        footer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(titles: &[&str]) -> TodoApp {
        let mut app = TodoApp::default();
        for title in titles {
            app.set_draft(title);
            app.submit_draft();
        }
        app
    }

    #[test]
    fn test_submit_trims_and_ignores_blank() {
        let mut app = app_with(&["  feed the cat  "]);
        app.set_draft("   ");
        app.submit_draft();
        assert_eq!(app.snapshot().titles(), vec!["feed the cat"]);
        assert_eq!(app.draft, "   ");
    }

    #[test]
    fn test_toggle_all_converges_then_inverts() {
        let mut app = app_with(&["a", "b", "c"]);
        app.toggle(1);
        app.toggle_all();
        assert_eq!(app.snapshot().completed_count(), 3);
        app.toggle_all();
        assert_eq!(app.snapshot().completed_count(), 0);
    }

    #[test]
    fn test_commit_empty_edit_destroys() {
        let mut app = app_with(&["a", "b", "c"]);
        app.begin_edit(1);
        app.set_edit_text("");
        app.commit_edit();
        assert_eq!(app.snapshot().titles(), vec!["a", "c"]);
    }

    #[test]
    fn test_cancel_edit_keeps_title() {
        let mut app = app_with(&["a"]);
        app.begin_edit(0);
        app.set_edit_text("changed");
        app.cancel_edit();
        assert_eq!(app.snapshot().titles(), vec!["a"]);
        assert_eq!(app.editing_index(), None);
    }

    #[test]
    fn test_footer_pluralization() {
        let app = app_with(&["only"]);
        let rendered = app.render(None);
        assert!(rendered.text_content().contains("1 item left"));
        assert!(!rendered.text_content().contains("Clear completed"));
    }
}
