// Taskboard - In-memory categorized task board with filtering, search and ordering

pub mod board;
pub mod category_store;
pub mod collection;
pub mod config;
pub mod filter;
pub mod jsonl;
pub mod models;
pub mod query;
pub mod record;
pub mod seed;
pub mod task_store;

// Re-export main types for convenience
pub use board::{Board, BoardError, Latency, Operation};
pub use category_store::CategoryStore;
pub use collection::Collection;
pub use config::{Config, LatencyConfig};
pub use filter::{Filter, FilterOp};
pub use models::{
    Category, CategoryDraft, CategoryPatch, Priority, Task, TaskDraft, TaskPatch, Urgency, ValidationError, end_of_day,
    parse_due_date,
};
pub use query::{DueState, StatusFilter, TaskQuery, due_state, open_task_count, open_task_total, with_task_counts};
pub use record::{IndexValue, Record, RecordKey};
pub use seed::Seed;
pub use task_store::TaskStore;
