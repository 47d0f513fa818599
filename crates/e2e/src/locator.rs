//! Locator descriptions
//!
//! A `Locator` is a recipe for finding elements, never a handle to them.
//! Every driver call resolves it against the live DOM, so nothing goes stale
//! across a mutation.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Step {
    /// CSS selector, searched among descendants
    Css(String),
    /// `data-testid` attribute, searched among descendants
    TestId(String),
    /// Form control by its label (`aria-label` or `<label for>`)
    Label(String),
    /// Keep matches whose text contains the value, case-insensitively
    HasText(String),
    /// Keep only the n-th match
    Nth(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self { steps: vec![Step::Css(selector.into())] }
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Self { steps: vec![Step::TestId(id.into())] }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self { steps: vec![Step::Label(text.into())] }
    }

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn locator(self, selector: impl Into<String>) -> Self {
        self.push(Step::Css(selector.into()))
    }

    pub fn get_by_test_id(self, id: impl Into<String>) -> Self {
        self.push(Step::TestId(id.into()))
    }

    pub fn get_by_label(self, text: impl Into<String>) -> Self {
        self.push(Step::Label(text.into()))
    }

    pub fn has_text(self, text: impl Into<String>) -> Self {
        self.push(Step::HasText(text.into()))
    }

    pub fn nth(self, index: usize) -> Self {
        self.push(Step::Nth(index))
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Render as a Playwright locator expression rooted at `page`
    pub fn to_js(&self) -> String {
        let mut expr = String::from("page");
        for step in &self.steps {
            match step {
                Step::Css(s) => expr.push_str(&format!(".locator({})", js_string(s))),
                Step::TestId(id) => expr.push_str(&format!(".getByTestId({})", js_string(id))),
                Step::Label(text) => expr.push_str(&format!(
                    ".getByLabel({}, {{ exact: true }})",
                    js_string(text)
                )),
                Step::HasText(text) => {
                    expr.push_str(&format!(".filter({{ hasText: {} }})", js_string(text)))
                }
                Step::Nth(n) => expr.push_str(&format!(".nth({})", n)),
            }
        }
        expr
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            match step {
                Step::Css(s) => write!(f, "{}", s)?,
                Step::TestId(id) => write!(f, "[data-testid={:?}]", id)?,
                Step::Label(text) => write!(f, "label={:?}", text)?,
                Step::HasText(text) => write!(f, "has-text={:?}", text)?,
                Step::Nth(n) => write!(f, "nth={}", n)?,
            }
        }
        Ok(())
    }
}

/// JSON string literals are valid JavaScript string literals.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_js_chain() {
        let loc = Locator::test_id("todo-item").nth(1).get_by_label("Delete");
        assert_eq!(
            loc.to_js(),
            r#"page.getByTestId("todo-item").nth(1).getByLabel("Delete", { exact: true })"#
        );
    }

    #[test]
    fn test_to_js_escapes_quotes() {
        let loc = Locator::css("ul.filters a").has_text("it's \"done\"");
        assert_eq!(
            loc.to_js(),
            r#"page.locator("ul.filters a").filter({ hasText: "it's \"done\"" })"#
        );
    }

    #[test]
    fn test_display() {
        let loc = Locator::css("input.new-todo").first();
        assert_eq!(loc.to_string(), "input.new-todo >> nth=0");
    }
}
