// In-memory task repository

use crate::collection::Collection;
use crate::filter::Filter;
use crate::models::{Priority, Task, TaskDraft, TaskPatch};
use crate::record::{IndexValue, RecordKey};
use chrono::Utc;
use std::cmp::Reverse;
use tracing::debug;

/// Owns the task list. Every method hands back copies.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Collection<Task>,
}

fn by_order(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|t| t.order);
    tasks
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing tasks
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Collection::from_records(tasks),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks, ascending by order
    pub fn get_all(&self) -> Vec<Task> {
        by_order(self.tasks.to_vec())
    }

    pub fn get_by_id(&self, id: impl RecordKey) -> Option<Task> {
        self.tasks.get(id.record_id()?)
    }

    /// Append a new task built from `draft`, filling defaults
    pub fn create(&mut self, draft: TaskDraft) -> Task {
        let id = self.tasks.next_id();
        let order = self.tasks.iter().map(|t| t.order).max().unwrap_or(0).max(0).saturating_add(1);

        let task = Task {
            id,
            title: draft.title,
            description: draft.description.unwrap_or_default(),
            category_id: draft.category_id,
            priority: draft.priority.unwrap_or_default(),
            urgency: draft.urgency.unwrap_or_default(),
            due_date: draft.due_date,
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
            order,
        };

        debug!(id, order, category_id = %task.category_id, "create task");
        self.tasks.insert(task)
    }

    /// Merge `patch` over the task with `id`; `None` when there is no such task
    pub fn update(&mut self, id: impl RecordKey, patch: TaskPatch) -> Option<Task> {
        let id = id.record_id()?;
        let now = Utc::now();
        self.tasks.modify(id, |task| patch.apply(task, now))
    }

    /// Remove a task. Orders of the remaining tasks are left as they are.
    pub fn delete(&mut self, id: impl RecordKey) -> bool {
        id.record_id().and_then(|id| self.tasks.remove(id)).is_some()
    }

    /// Move a task to position `new_order` and renumber every task `1..=N`.
    ///
    /// Positions outside `1..=N` are clamped. Returns `false` when the task
    /// does not exist.
    pub fn reorder(&mut self, id: impl RecordKey, new_order: i64) -> bool {
        let Some(id) = id.record_id() else {
            return false;
        };
        let Some(moved) = self.tasks.get(id) else {
            return false;
        };

        let mut sequence: Vec<Task> = self.get_all().into_iter().filter(|t| t.id != id).collect();
        let slot = usize::try_from(new_order.saturating_sub(1))
            .unwrap_or(0)
            .min(sequence.len());
        sequence.insert(slot, moved);

        for (index, task) in sequence.iter_mut().enumerate() {
            task.order = index as i64 + 1;
        }

        debug!(id, new_order, position = slot + 1, total = sequence.len(), "reorder tasks");
        self.tasks.set_records(sequence);
        true
    }

    /// Tasks of one category, ascending by order
    pub fn get_by_category(&self, category_id: impl RecordKey) -> Vec<Task> {
        let Some(category_id) = category_id.record_id() else {
            return Vec::new();
        };
        by_order(self.tasks.list(&[Filter::eq(
            "category_id",
            IndexValue::String(category_id.to_string()),
        )]))
    }

    /// Tasks of one priority, ascending by order
    pub fn get_by_priority(&self, priority: Priority) -> Vec<Task> {
        by_order(
            self.tasks
                .list(&[Filter::eq("priority", IndexValue::String(priority.to_string()))]),
        )
    }

    /// Case-insensitive substring match on title or description.
    ///
    /// The query is matched literally; an empty query matches every task.
    pub fn search(&self, query: &str) -> Vec<Task> {
        by_order(
            self.tasks
                .list_any(&[Filter::contains("title", query), Filter::contains("description", query)]),
        )
    }

    /// Completed tasks, most recently completed first
    pub fn get_completed(&self) -> Vec<Task> {
        let mut tasks = self.tasks.list(&[Filter::eq("completed", IndexValue::Bool(true))]);
        tasks.sort_by_key(|t| Reverse(t.completed_at));
        tasks
    }

    /// Open tasks, ascending by order
    pub fn get_active(&self) -> Vec<Task> {
        by_order(self.tasks.list(&[Filter::eq("completed", IndexValue::Bool(false))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(id: u64, order: i64) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: String::new(),
            category_id: "1".to_string(),
            priority: Priority::Medium,
            urgency: Default::default(),
            due_date: None,
            completed: false,
            completed_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            order,
        }
    }

    fn orders_by_id(store: &TaskStore) -> Vec<(u64, i64)> {
        store.get_all().iter().map(|t| (t.id, t.order)).collect()
    }

    fn assert_dense(store: &TaskStore) {
        let orders: Vec<i64> = store.get_all().iter().map(|t| t.order).collect();
        let expected: Vec<i64> = (1..=store.len() as i64).collect();
        assert_eq!(orders, expected);
    }

    #[test]
    fn test_get_all_sorted_by_order() {
        let store = TaskStore::with_tasks(vec![task(1, 3), task(2, 1), task(3, 2)]);
        let ids: Vec<u64> = store.get_all().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_get_by_id_coerces_keys() {
        let store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2)]);
        assert_eq!(store.get_by_id(2u64).unwrap().id, 2);
        assert_eq!(store.get_by_id("2").unwrap().id, 2);
        assert!(store.get_by_id("two").is_none());
        assert!(store.get_by_id(-2i64).is_none());
        assert!(store.get_by_id(99999u64).is_none());
    }

    #[test]
    fn test_create_fills_defaults() {
        let mut store = TaskStore::new();
        let before = Utc::now();
        let created = store.create(TaskDraft::new("Write report", 1));

        assert_eq!(created.id, 1);
        assert_eq!(created.order, 1);
        assert_eq!(created.description, "");
        assert_eq!(created.category_id, "1");
        assert_eq!(created.priority, Priority::Medium);
        assert_eq!(created.urgency, crate::models::Urgency::Medium);
        assert!(created.due_date.is_none());
        assert!(!created.completed);
        assert!(created.completed_at.is_none());
        assert!(created.created_at >= before);
        assert_eq!(store.get_by_id(1u64), Some(created));
    }

    #[test]
    fn test_create_ids_strictly_increase() {
        let mut store = TaskStore::with_tasks(vec![task(4, 1), task(2, 2)]);
        let mut last = 4;
        for i in 0..5 {
            let created = store.create(TaskDraft::new(format!("New {}", i), 1));
            assert!(created.id > last);
            last = created.id;
        }
    }

    #[test]
    fn test_create_after_delete_does_not_reuse_id() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2)]);
        assert!(store.delete(2u64));
        let created = store.create(TaskDraft::new("Fresh", 1));
        assert_eq!(created.id, 3);
    }

    #[test]
    fn test_create_order_after_max() {
        let mut store = TaskStore::with_tasks(vec![task(1, 5), task(2, 2)]);
        let created = store.create(TaskDraft::new("Tail", 1));
        assert_eq!(created.order, 6);
    }

    #[test]
    fn test_create_after_max_order_does_not_overflow() {
        let mut store = TaskStore::with_tasks(vec![task(1, i64::MAX)]);
        let created = store.create(TaskDraft::new("Last", 1));
        assert_eq!(created.order, i64::MAX);

        assert!(store.reorder(created.id, 1));
        assert_dense(&store);
    }

    #[test]
    fn test_returned_copies_do_not_alias_store() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1)]);
        let mut copy = store.get_by_id(1u64).unwrap();
        copy.title = "Mutated".to_string();
        assert_eq!(store.get_by_id(1u64).unwrap().title, "Task 1");

        let mut all = store.get_all();
        all[0].completed = true;
        assert!(!store.get_by_id(1u64).unwrap().completed);

        let mut created = store.create(TaskDraft::new("Second", 1));
        created.order = 100;
        assert_eq!(store.get_by_id(created.id).unwrap().order, 2);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1)]);
        let patch = TaskPatch {
            title: Some("Renamed".to_string()),
            priority: Some(Priority::High),
            ..Default::default()
        };

        let updated = store.update(1u64, patch).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.id, 1);
        assert_eq!(updated.category_id, "1");
        assert_eq!(store.get_by_id(1u64).unwrap(), updated);
    }

    #[test]
    fn test_update_nonexistent_returns_none() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1)]);
        assert!(store.update(42u64, TaskPatch::completed(true)).is_none());
        assert!(store.update("nope", TaskPatch::completed(true)).is_none());
    }

    #[test]
    fn test_complete_then_reopen() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1)]);

        let done = store.update(1u64, TaskPatch::completed(true)).unwrap();
        assert!(done.completed);
        let completed_at = done.completed_at.expect("completed_at set");
        assert!(completed_at >= done.created_at);

        let reopened = store.update(1u64, TaskPatch::completed(false)).unwrap();
        assert!(!reopened.completed);
        assert!(reopened.completed_at.is_none());
    }

    #[test]
    fn test_update_without_completed_keeps_completed_at() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1)]);
        let done = store.update(1u64, TaskPatch::completed(true)).unwrap();
        let renamed = store
            .update(
                1u64,
                TaskPatch {
                    title: Some("Still done".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.completed_at, done.completed_at);
    }

    #[test]
    fn test_delete_nonexistent_leaves_length() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2)]);
        assert!(!store.delete(99999u64));
        assert!(!store.delete("abc"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_does_not_renumber() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2), task(3, 3)]);
        assert!(store.delete(2u64));
        assert_eq!(orders_by_id(&store), vec![(1, 1), (3, 3)]);
    }

    #[test]
    fn test_reorder_moves_last_to_first() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2), task(3, 3)]);
        assert!(store.reorder(3u64, 1));
        assert_eq!(orders_by_id(&store), vec![(3, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_reorder_moves_first_to_last() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2), task(3, 3)]);
        assert!(store.reorder(1u64, 3));
        assert_eq!(orders_by_id(&store), vec![(2, 1), (3, 2), (1, 3)]);
    }

    #[test]
    fn test_reorder_closes_gaps() {
        let mut store = TaskStore::with_tasks(vec![task(1, 10), task(2, 4), task(3, 7), task(4, 4)]);
        assert!(store.reorder(1u64, 2));
        assert_dense(&store);
        let position = store.get_all().iter().position(|t| t.id == 1).unwrap();
        assert_eq!(position, 1);
    }

    #[test]
    fn test_reorder_clamps_out_of_range() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2), task(3, 3)]);
        assert!(store.reorder(2u64, 0));
        assert_eq!(orders_by_id(&store), vec![(2, 1), (1, 2), (3, 3)]);

        assert!(store.reorder(2u64, 50));
        assert_eq!(orders_by_id(&store), vec![(1, 1), (3, 2), (2, 3)]);
        assert_dense(&store);
    }

    #[test]
    fn test_reorder_nonexistent() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2)]);
        assert!(!store.reorder(9u64, 1));
        assert!(!store.reorder("x", 1));
        assert_eq!(orders_by_id(&store), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_reorder_keeps_ids_allocating_forward() {
        let mut store = TaskStore::with_tasks(vec![task(1, 1), task(2, 2)]);
        store.reorder(2u64, 1);
        assert_eq!(store.create(TaskDraft::new("Next", 1)).id, 3);
    }

    #[test]
    fn test_get_by_category_and_priority() {
        let mut a = task(1, 2);
        a.category_id = "2".to_string();
        a.priority = Priority::High;
        let mut b = task(2, 1);
        b.category_id = "2".to_string();
        let c = task(3, 3);

        let store = TaskStore::with_tasks(vec![a, b, c]);

        let ids: Vec<u64> = store.get_by_category(2u64).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(store.get_by_category("2").len(), 2);
        assert!(store.get_by_category("work").is_empty());

        let high: Vec<u64> = store.get_by_priority(Priority::High).iter().map(|t| t.id).collect();
        assert_eq!(high, vec![1]);
        assert!(store.get_by_priority(Priority::Low).is_empty());
    }

    #[test]
    fn test_search_title_or_description() {
        let mut milk = task(1, 1);
        milk.title = "Buy milk".to_string();
        let mut note = task(2, 2);
        note.title = "Groceries".to_string();
        note.description = "Remember the MILK and eggs".to_string();
        let mut other = task(3, 3);
        other.title = "Call plumber".to_string();

        let store = TaskStore::with_tasks(vec![milk, note, other]);

        let ids = |q: &str| store.search(q).iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids("milk"), vec![1, 2]);
        assert_eq!(ids("MILK"), vec![1, 2]);
        assert!(ids("bread").is_empty());
        assert_eq!(ids("").len(), 3);
    }

    #[test]
    fn test_get_completed_most_recent_first() {
        let mut first = task(1, 1);
        first.completed = true;
        first.completed_at = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        let mut second = task(2, 2);
        second.completed = true;
        second.completed_at = Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
        let open = task(3, 3);

        let store = TaskStore::with_tasks(vec![first, second, open]);
        let ids: Vec<u64> = store.get_completed().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_get_active() {
        let mut done = task(1, 1);
        done.completed = true;
        done.completed_at = Some(Utc::now());
        let store = TaskStore::with_tasks(vec![done, task(2, 3), task(3, 2)]);

        let ids: Vec<u64> = store.get_active().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
