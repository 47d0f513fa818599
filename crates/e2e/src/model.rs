//! Domain types observed through the UI and persisted storage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::E2eError;

/// One entry in the to-do list. Identity is its position, not an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    pub completed: bool,
    pub order: usize,
}

/// View filter over the list; selecting one never mutates the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    /// Link text rendered in the footer
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    /// Hash route the filter link points at
    pub fn route(&self) -> &'static str {
        match self {
            Filter::All => "#/",
            Filter::Active => "#/active",
            Filter::Completed => "#/completed",
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        Filter::ALL.into_iter().find(|f| f.route() == route)
    }

    pub fn matches(&self, completed: bool) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !completed,
            Filter::Completed => completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Filter {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| E2eError::Config(format!("unknown filter: {}", s)))
    }
}

/// A single record in the persisted list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTodo {
    pub title: String,
    pub completed: bool,
}

/// The application's persisted mirror of the list, in list order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedSnapshot {
    pub todos: Vec<StoredTodo>,
}

impl PersistedSnapshot {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn total_count(&self) -> usize {
        self.todos.len()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.todos.iter().any(|t| t.title == title)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.todos.iter().map(|t| t.title.as_str()).collect()
    }

    pub fn items(&self) -> Vec<Item> {
        self.todos
            .iter()
            .enumerate()
            .map(|(order, t)| Item {
                text: t.title.clone(),
                completed: t.completed,
                order,
            })
            .collect()
    }
}

/// What a storage read produced. Missing and malformed values are
/// observations to report, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageObservation {
    Missing,
    Malformed(String),
    Snapshot(PersistedSnapshot),
}

impl StorageObservation {
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            None => StorageObservation::Missing,
            Some(raw) => match PersistedSnapshot::parse(&raw) {
                Ok(snapshot) => StorageObservation::Snapshot(snapshot),
                Err(_) => StorageObservation::Malformed(raw),
            },
        }
    }

    pub fn snapshot(&self) -> Option<&PersistedSnapshot> {
        match self {
            StorageObservation::Snapshot(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StorageObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageObservation::Missing => f.write_str("<no value>"),
            StorageObservation::Malformed(raw) => write!(f, "<malformed> {}", raw),
            StorageObservation::Snapshot(s) => {
                let json = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}
