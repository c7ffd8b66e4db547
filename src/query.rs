// Task filtering and derived values shared by list views

use crate::filter::Filter;
use crate::models::{Category, Priority, Task};
use crate::record::{IndexValue, Record};
use crate::task_store::TaskStore;
use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Completion filter for list views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl FromStr for StatusFilter {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(StatusFilter::All),
            "active" | "open" => Ok(StatusFilter::Active),
            "completed" | "done" => Ok(StatusFilter::Completed),
            other => Err(eyre!("Unknown status filter: {}", other)),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Active => write!(f, "active"),
            StatusFilter::Completed => write!(f, "completed"),
        }
    }
}

/// The selection a list view applies: search text, category, priority and status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: StatusFilter,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Filters applied after the search step
    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(category_id) = self.category_id {
            filters.push(Filter::eq("category_id", IndexValue::String(category_id.to_string())));
        }
        if let Some(priority) = self.priority {
            filters.push(Filter::eq("priority", IndexValue::String(priority.to_string())));
        }
        match self.status {
            StatusFilter::All => {}
            StatusFilter::Active => filters.push(Filter::eq("completed", IndexValue::Bool(false))),
            StatusFilter::Completed => filters.push(Filter::eq("completed", IndexValue::Bool(true))),
        }
        filters
    }

    /// Run the query: search (when the text is not blank), then narrow by
    /// category, priority and status. Results stay in display order.
    pub fn apply(&self, store: &TaskStore) -> Vec<Task> {
        let base = if self.search.trim().is_empty() {
            store.get_all()
        } else {
            store.search(&self.search)
        };

        let filters = self.filters();
        if filters.is_empty() {
            return base;
        }

        base.into_iter()
            .filter(|task| {
                let fields = task.indexed_fields();
                filters.iter().all(|f| f.matches(&fields))
            })
            .collect()
    }
}

/// Number of open tasks referencing `category_id`
pub fn open_task_count(category_id: u64, tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|t| !t.completed && t.in_category(category_id))
        .count()
}

/// Copies of `categories` with `task_count` set from a join against `tasks`
pub fn with_task_counts(categories: &[Category], tasks: &[Task]) -> Vec<Category> {
    categories
        .iter()
        .map(|category| Category {
            task_count: open_task_count(category.id, tasks),
            ..category.clone()
        })
        .collect()
}

/// Sum of the category counts, e.g. for an "all tasks" badge
pub fn open_task_total(categories: &[Category]) -> usize {
    categories.iter().map(|c| c.task_count).sum()
}

/// How a task's due date relates to the present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    NoDueDate,
    Overdue,
    DueToday,
    Scheduled,
}

/// Classify a task's due date against `now` (calendar days in UTC).
///
/// A task due earlier today is `DueToday`, never `Overdue`; completed tasks
/// are never overdue.
pub fn due_state(task: &Task, now: DateTime<Utc>) -> DueState {
    let Some(due) = task.due_date else {
        return DueState::NoDueDate;
    };

    if due.date_naive() == now.date_naive() {
        DueState::DueToday
    } else if due < now && !task.completed {
        DueState::Overdue
    } else {
        DueState::Scheduled
    }
}
