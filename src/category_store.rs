// In-memory category repository

use crate::collection::Collection;
use crate::models::{Category, CategoryDraft, CategoryPatch, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON};
use crate::record::RecordKey;
use tracing::debug;

/// Owns the category list in insertion order
#[derive(Debug, Clone, Default)]
pub struct CategoryStore {
    categories: Collection<Category>,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            categories: Collection::from_records(categories),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// All categories in insertion order.
    ///
    /// `task_count` holds whatever was last cached; join against the tasks
    /// with `query::with_task_counts` for a live number.
    pub fn get_all(&self) -> Vec<Category> {
        self.categories.to_vec()
    }

    pub fn get_by_id(&self, id: impl RecordKey) -> Option<Category> {
        self.categories.get(id.record_id()?)
    }

    pub fn create(&mut self, draft: CategoryDraft) -> Category {
        let category = Category {
            id: self.categories.next_id(),
            name: draft.name,
            color: draft.color.unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            icon: draft.icon.unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
            description: draft.description.unwrap_or_default(),
            task_count: 0,
        };

        debug!(id = category.id, name = %category.name, "create category");
        self.categories.insert(category)
    }

    pub fn update(&mut self, id: impl RecordKey, patch: CategoryPatch) -> Option<Category> {
        self.categories.modify(id.record_id()?, |category| patch.apply(category))
    }

    /// Remove a category. Tasks pointing at it are not touched here.
    pub fn delete(&mut self, id: impl RecordKey) -> bool {
        id.record_id().and_then(|id| self.categories.remove(id)).is_some()
    }

    /// Overwrite the cached open-task count
    pub fn update_task_count(&mut self, id: impl RecordKey, count: usize) -> bool {
        id.record_id()
            .and_then(|id| self.categories.modify(id, |category| category.task_count = count))
            .is_some()
    }
}
