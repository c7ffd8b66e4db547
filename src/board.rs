//! Async facade over the task and category stores.
//!
//! A [`Board`] is the handle callers hold. It simulates a network round trip
//! before each operation, then runs the whole operation under one write lock,
//! so two overlapping updates never merge onto a stale copy of a record.

use crate::category_store::CategoryStore;
use crate::config::{Config, LatencyConfig};
use crate::models::{Category, CategoryDraft, CategoryPatch, Priority, Task, TaskDraft, TaskPatch, ValidationError};
use crate::query::{TaskQuery, open_task_count, with_task_counts};
use crate::record::RecordKey;
use crate::seed::Seed;
use crate::task_store::TaskStore;
use eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Errors the board reports for requests it refuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Input failed the checks a form would apply
    Validation(ValidationError),
    /// The category still has tasks pointing at it
    CategoryInUse { id: u64, tasks: usize },
    /// A task names a category that does not exist
    UnknownCategory(String),
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::Validation(e) => write!(f, "validation error: {}", e),
            BoardError::CategoryInUse { id, tasks } => {
                write!(f, "category {} is still referenced by {} task(s)", id, tasks)
            }
            BoardError::UnknownCategory(id) => write!(f, "unknown category: {}", id),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<ValidationError> for BoardError {
    fn from(e: ValidationError) -> Self {
        BoardError::Validation(e)
    }
}

/// Board operations, each with its own simulated round-trip time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    TaskList,
    TaskGet,
    TaskCreate,
    TaskUpdate,
    TaskDelete,
    TaskReorder,
    TaskFilter,
    TaskSearch,
    CategoryList,
    CategoryGet,
    CategoryCreate,
    CategoryUpdate,
    CategoryDelete,
    CategoryTaskCount,
}

impl Operation {
    pub fn base_delay(self) -> Duration {
        let ms = match self {
            Operation::TaskList => 300,
            Operation::TaskGet => 200,
            Operation::TaskCreate => 400,
            Operation::TaskUpdate => 300,
            Operation::TaskDelete => 200,
            Operation::TaskReorder => 200,
            Operation::TaskFilter => 250,
            Operation::TaskSearch => 300,
            Operation::CategoryList => 200,
            Operation::CategoryGet => 150,
            Operation::CategoryCreate => 300,
            Operation::CategoryUpdate => 250,
            Operation::CategoryDelete => 200,
            Operation::CategoryTaskCount => 100,
        };
        Duration::from_millis(ms)
    }
}

/// Simulated latency; a scale of zero disables it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Latency {
    scale: f64,
}

impl Latency {
    pub fn none() -> Self {
        Self { scale: 0.0 }
    }

    pub fn scaled(scale: f64) -> Self {
        Self { scale: scale.max(0.0) }
    }

    pub fn from_config(config: &LatencyConfig) -> Self {
        if config.enabled {
            Self::scaled(config.scale)
        } else {
            Self::none()
        }
    }

    pub fn delay(&self, op: Operation) -> Duration {
        if self.scale == 0.0 {
            return Duration::ZERO;
        }
        let nanos = op.base_delay().as_nanos() as f64 * self.scale;
        Duration::from_nanos(nanos.round() as u64)
    }

    async fn wait(&self, op: Operation) {
        let delay = self.delay(op);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::scaled(1.0)
    }
}

#[derive(Debug)]
struct BoardState {
    tasks: TaskStore,
    categories: CategoryStore,
}

impl BoardState {
    /// Rewrite every category's cached count from the task list
    fn sync_task_counts(&mut self) {
        let tasks = self.tasks.get_all();
        for category in self.categories.get_all() {
            let count = open_task_count(category.id, &tasks);
            if category.task_count != count {
                self.categories.update_task_count(category.id, count);
            }
        }
    }

    /// Resolve a category reference to the canonical id string tasks store
    fn check_category(&self, category_id: &str) -> std::result::Result<String, BoardError> {
        if category_id.trim().is_empty() {
            return Err(ValidationError::CategoryRequired.into());
        }
        match self.categories.get_by_id(category_id) {
            Some(category) => Ok(category.id.to_string()),
            None => Err(BoardError::UnknownCategory(category_id.to_string())),
        }
    }
}

/// Shared handle to one set of stores
#[derive(Debug, Clone)]
pub struct Board {
    state: Arc<RwLock<BoardState>>,
    latency: Latency,
}

impl Board {
    pub fn new(tasks: TaskStore, categories: CategoryStore, latency: Latency) -> Self {
        let mut state = BoardState { tasks, categories };
        state.sync_task_counts();
        Self {
            state: Arc::new(RwLock::new(state)),
            latency,
        }
    }

    pub fn from_seed(seed: Seed, latency: Latency) -> Self {
        let (tasks, categories) = seed.into_stores();
        Self::new(tasks, categories, latency)
    }

    /// Seed from the configured directory (or the builtin fixture) with the
    /// configured latency
    pub fn from_config(config: &Config) -> Result<Self> {
        let seed = Seed::load(config.seed_dir.as_deref())?;
        info!(
            tasks = seed.tasks.len(),
            categories = seed.categories.len(),
            "Seeding board"
        );
        Ok(Self::from_seed(seed, Latency::from_config(&config.latency)))
    }

    pub fn latency(&self) -> Latency {
        self.latency
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub async fn tasks(&self) -> Vec<Task> {
        self.latency.wait(Operation::TaskList).await;
        self.state.read().await.tasks.get_all()
    }

    pub async fn task(&self, id: impl RecordKey) -> Option<Task> {
        self.latency.wait(Operation::TaskGet).await;
        self.state.read().await.tasks.get_by_id(id)
    }

    pub async fn create_task(&self, mut draft: TaskDraft) -> std::result::Result<Task, BoardError> {
        draft.validate()?;
        self.latency.wait(Operation::TaskCreate).await;

        let mut state = self.state.write().await;
        draft.category_id = state.check_category(&draft.category_id)?;
        let task = state.tasks.create(draft);
        state.sync_task_counts();
        Ok(task)
    }

    /// `Ok(None)` when there is no such task
    pub async fn update_task(
        &self,
        id: impl RecordKey,
        mut patch: TaskPatch,
    ) -> std::result::Result<Option<Task>, BoardError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::TitleRequired.into());
        }
        self.latency.wait(Operation::TaskUpdate).await;

        let mut state = self.state.write().await;
        if let Some(category_id) = patch.category_id.take() {
            patch.category_id = Some(state.check_category(&category_id)?);
        }
        let task = state.tasks.update(id, patch);
        if task.is_some() {
            state.sync_task_counts();
        }
        Ok(task)
    }

    pub async fn delete_task(&self, id: impl RecordKey) -> bool {
        self.latency.wait(Operation::TaskDelete).await;

        let mut state = self.state.write().await;
        let deleted = state.tasks.delete(id);
        if deleted {
            state.sync_task_counts();
        }
        deleted
    }

    pub async fn reorder_task(&self, id: impl RecordKey, new_order: i64) -> bool {
        self.latency.wait(Operation::TaskReorder).await;
        self.state.write().await.tasks.reorder(id, new_order)
    }

    pub async fn tasks_by_category(&self, category_id: impl RecordKey) -> Vec<Task> {
        self.latency.wait(Operation::TaskFilter).await;
        self.state.read().await.tasks.get_by_category(category_id)
    }

    pub async fn tasks_by_priority(&self, priority: Priority) -> Vec<Task> {
        self.latency.wait(Operation::TaskFilter).await;
        self.state.read().await.tasks.get_by_priority(priority)
    }

    pub async fn search_tasks(&self, query: &str) -> Vec<Task> {
        self.latency.wait(Operation::TaskSearch).await;
        self.state.read().await.tasks.search(query)
    }

    pub async fn completed_tasks(&self) -> Vec<Task> {
        self.latency.wait(Operation::TaskFilter).await;
        self.state.read().await.tasks.get_completed()
    }

    pub async fn active_tasks(&self) -> Vec<Task> {
        self.latency.wait(Operation::TaskFilter).await;
        self.state.read().await.tasks.get_active()
    }

    /// Run a list-view query in one round trip
    pub async fn query(&self, query: &TaskQuery) -> Vec<Task> {
        let op = if query.search.trim().is_empty() {
            Operation::TaskList
        } else {
            Operation::TaskSearch
        };
        self.latency.wait(op).await;
        query.apply(&self.state.read().await.tasks)
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// All categories with live open-task counts
    pub async fn categories(&self) -> Vec<Category> {
        self.latency.wait(Operation::CategoryList).await;
        let state = self.state.read().await;
        with_task_counts(&state.categories.get_all(), &state.tasks.get_all())
    }

    pub async fn category(&self, id: impl RecordKey) -> Option<Category> {
        self.latency.wait(Operation::CategoryGet).await;
        let state = self.state.read().await;
        let category = state.categories.get_by_id(id)?;
        Some(Category {
            task_count: open_task_count(category.id, &state.tasks.get_all()),
            ..category
        })
    }

    pub async fn create_category(&self, draft: CategoryDraft) -> std::result::Result<Category, BoardError> {
        draft.validate()?;
        self.latency.wait(Operation::CategoryCreate).await;

        let mut state = self.state.write().await;
        let created = state.categories.create(draft);
        state.sync_task_counts();
        Ok(state.categories.get_by_id(created.id).unwrap_or(created))
    }

    pub async fn update_category(
        &self,
        id: impl RecordKey,
        patch: CategoryPatch,
    ) -> std::result::Result<Option<Category>, BoardError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::NameRequired.into());
        }
        self.latency.wait(Operation::CategoryUpdate).await;
        Ok(self.state.write().await.categories.update(id, patch))
    }

    /// Delete a category that no task references.
    ///
    /// `Ok(false)` when there is no such category.
    pub async fn delete_category(&self, id: impl RecordKey) -> std::result::Result<bool, BoardError> {
        self.latency.wait(Operation::CategoryDelete).await;

        let mut state = self.state.write().await;
        let Some(category) = state.categories.get_by_id(id) else {
            return Ok(false);
        };

        let referencing = state.tasks.get_by_category(category.id).len();
        if referencing > 0 {
            debug!(id = category.id, referencing, "refusing to delete referenced category");
            return Err(BoardError::CategoryInUse {
                id: category.id,
                tasks: referencing,
            });
        }

        Ok(state.categories.delete(category.id))
    }

    /// Overwrite a category's cached count. The next task mutation or
    /// category read replaces it with the joined value again.
    pub async fn update_category_task_count(&self, id: impl RecordKey, count: usize) -> bool {
        self.latency.wait(Operation::CategoryTaskCount).await;
        self.state.write().await.categories.update_task_count(id, count)
    }

    /// Copies of both collections, categories carrying live counts
    pub async fn snapshot(&self) -> Seed {
        let state = self.state.read().await;
        let tasks = state.tasks.get_all();
        Seed {
            categories: with_task_counts(&state.categories.get_all(), &tasks),
            tasks,
        }
    }
}
