//! Minimal element tree and locator resolution

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Step};
use crate::model::Filter;

/// Application control an element is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    NewTodo,
    ToggleAll,
    Item(usize),
    ItemToggle(usize),
    ItemTitle(usize),
    ItemDestroy(usize),
    ItemEdit(usize),
    Filter(Filter),
    ClearCompleted,
}

impl Target {
    /// Model index of the item this control belongs to
    pub fn item_index(&self) -> Option<usize> {
        match *self {
            Target::Item(i)
            | Target::ItemToggle(i)
            | Target::ItemTitle(i)
            | Target::ItemDestroy(i)
            | Target::ItemEdit(i) => Some(i),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub hidden: bool,
    pub target: Option<Target>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self { tag: tag.to_string(), ..Default::default() }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn class_if(self, class: &str, on: bool) -> Self {
        if on {
            self.class(class)
        } else {
            self
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            _ => self.attrs.get(name).cloned(),
        }
    }

    fn matches(&self, compound: &Compound) -> bool {
        if let Some(tag) = &compound.tag {
            if tag != "*" && !self.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if self.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !compound.classes.iter().all(|c| self.classes.contains(c)) {
            return false;
        }
        compound.attrs.iter().all(|(name, expected)| match expected {
            Some(value) => self.attribute(name).as_deref() == Some(value.as_str()),
            None => self.attribute(name).is_some(),
        })
    }
}

/// Position of an element as child indices from the root
pub type Path = Vec<usize>;

/// A rendered page
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn get(&self, path: &[usize]) -> &Element {
        path.iter().fold(&self.root, |el, &i| &el.children[i])
    }

    /// Visible when neither the element nor any ancestor is hidden
    pub fn is_visible(&self, path: &[usize]) -> bool {
        let mut el = &self.root;
        if el.hidden {
            return false;
        }
        for &i in path {
            el = &el.children[i];
            if el.hidden {
                return false;
            }
        }
        true
    }

    /// All descendants of `path` (excluding itself), in document order
    fn descendants(&self, path: &[usize]) -> Vec<Path> {
        let mut out = Vec::new();
        let mut stack: Vec<Path> = (0..self.get(path).children.len())
            .rev()
            .map(|i| {
                let mut p = path.to_vec();
                p.push(i);
                p
            })
            .collect();
        while let Some(p) = stack.pop() {
            let count = self.get(&p).children.len();
            for i in (0..count).rev() {
                let mut child = p.clone();
                child.push(i);
                stack.push(child);
            }
            out.push(p);
        }
        out
    }

    /// Every element in the document, in document order
    fn all(&self) -> Vec<Path> {
        let mut out = vec![Vec::new()];
        out.extend(self.descendants(&[]));
        out
    }

    /// Resolve a locator to the matching elements, in document order
    pub fn resolve(&self, locator: &Locator) -> E2eResult<Vec<Path>> {
        let mut scope: Vec<Path> = vec![Vec::new()];

        for step in locator.steps() {
            scope = match step {
                Step::Css(selector) => {
                    let complex = parse_selector(selector)
                        .ok_or_else(|| E2eError::driver(locator, format!("unsupported selector {:?}", selector)))?;
                    self.collect(&scope, |p| self.matches_complex(p, &complex))
                }
                Step::TestId(id) => self.collect(&scope, |p| {
                    self.get(p).attrs.get("data-testid").map(String::as_str) == Some(id.as_str())
                }),
                Step::Label(text) => {
                    let labelled: Vec<String> = self
                        .all()
                        .into_iter()
                        .map(|p| self.get(&p))
                        .filter(|el| el.tag == "label" && el.text_content().trim() == text.as_str())
                        .filter_map(|el| el.attrs.get("for").cloned())
                        .collect();
                    self.collect(&scope, |p| {
                        let el = self.get(p);
                        el.attrs.get("aria-label") == Some(text)
                            || el.id.as_ref().map(|id| labelled.contains(id)).unwrap_or(false)
                    })
                }
                Step::HasText(text) => {
                    let needle = text.to_lowercase();
                    scope
                        .into_iter()
                        .filter(|p| self.get(p).text_content().to_lowercase().contains(&needle))
                        .collect()
                }
                Step::Nth(n) => scope.into_iter().nth(*n).into_iter().collect(),
            };
        }

        Ok(scope)
    }

    fn collect<F>(&self, scope: &[Path], pred: F) -> Vec<Path>
    where
        F: Fn(&Path) -> bool,
    {
        let found: BTreeSet<Path> = scope
            .iter()
            .flat_map(|s| self.descendants(s))
            .filter(|p| pred(p))
            .collect();
        found.into_iter().collect()
    }

    /// Match right-to-left; every combinator is a descendant combinator
    fn matches_complex(&self, path: &[usize], complex: &[Compound]) -> bool {
        let Some((last, rest)) = complex.split_last() else {
            return false;
        };
        if !self.get(path).matches(last) {
            return false;
        }
        let mut remaining = rest.iter().rev().peekable();
        let mut ancestor = path.len();
        while let Some(compound) = remaining.peek() {
            if ancestor == 0 {
                return false;
            }
            ancestor -= 1;
            if self.get(&path[..ancestor]).matches(compound) {
                remaining.next();
            }
        }
        true
    }
}

#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

/// Parse `tag#id.class[attr=value]` compounds separated by whitespace
fn parse_selector(selector: &str) -> Option<Vec<Compound>> {
    let compounds: Option<Vec<Compound>> = selector.split_whitespace().map(parse_compound).collect();
    compounds.filter(|c| !c.is_empty())
}

fn parse_compound(src: &str) -> Option<Compound> {
    fn ident(chars: &[char], mut i: usize) -> (String, usize) {
        let start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '-' || chars[i] == '_' || chars[i] == '*') {
            i += 1;
        }
        (chars[start..i].iter().collect(), i)
    }

    let chars: Vec<char> = src.chars().collect();
    let mut compound = Compound::default();
    let (tag, mut i) = ident(&chars, 0);
    if !tag.is_empty() {
        compound.tag = Some(tag);
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                let (name, next) = ident(&chars, i + 1);
                if name.is_empty() {
                    return None;
                }
                compound.classes.push(name);
                i = next;
            }
            '#' => {
                let (name, next) = ident(&chars, i + 1);
                if name.is_empty() {
                    return None;
                }
                compound.id = Some(name);
                i = next;
            }
            '[' => {
                let close = chars[i..].iter().position(|&c| c == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                let attr = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        (name.trim().to_string(), Some(value.to_string()))
                    }
                    None => (inner.trim().to_string(), None),
                };
                if attr.0.is_empty() {
                    return None;
                }
                compound.attrs.push(attr);
                i = close + 1;
            }
            _ => return None,
        }
    }

    Some(compound)
}
