// Seed data loaded once at startup

use crate::category_store::CategoryStore;
use crate::jsonl;
use crate::models::{Category, Task};
use crate::record::Record;
use crate::task_store::TaskStore;
use eyre::{Context, Result, eyre};
use std::fs::{self, File};
use std::io::{BufWriter, Cursor};
use std::path::Path;
use tracing::info;

const TASKS_FIXTURE: &str = include_str!("../fixtures/tasks.jsonl");
const CATEGORIES_FIXTURE: &str = include_str!("../fixtures/categories.jsonl");

/// Records a board starts from
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
}

impl Seed {
    /// The fixture compiled into the binary
    pub fn builtin() -> Self {
        Self {
            tasks: jsonl::read_jsonl(Cursor::new(TASKS_FIXTURE), "builtin tasks"),
            categories: jsonl::read_jsonl(Cursor::new(CATEGORIES_FIXTURE), "builtin categories"),
        }
    }

    /// Load `tasks.jsonl` and `categories.jsonl` from a directory.
    ///
    /// The directory must exist; a missing file inside it seeds that
    /// collection empty.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(eyre!("Seed directory not found: {}", dir.display()));
        }

        let seed = Self {
            tasks: jsonl::read_jsonl_file(&fixture_path(dir, Task::collection_name()))?,
            categories: jsonl::read_jsonl_file(&fixture_path(dir, Category::collection_name()))?,
        };

        info!(
            dir = ?dir,
            tasks = seed.tasks.len(),
            categories = seed.categories.len(),
            "Loaded seed directory"
        );
        Ok(seed)
    }

    /// Use `dir` when given, the builtin fixture otherwise
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Ok(Self::builtin()),
        }
    }

    /// Write `tasks.jsonl` and `categories.jsonl` into `dir`, creating it
    /// when needed. The result loads back through [`Seed::from_dir`].
    pub fn write_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        write_collection(dir, &self.tasks)?;
        write_collection(dir, &self.categories)?;
        info!(dir = ?dir, tasks = self.tasks.len(), categories = self.categories.len(), "Wrote seed directory");
        Ok(())
    }

    pub fn into_stores(self) -> (TaskStore, CategoryStore) {
        (
            TaskStore::with_tasks(self.tasks),
            CategoryStore::with_categories(self.categories),
        )
    }
}

fn write_collection<T: Record>(dir: &Path, records: &[T]) -> Result<()> {
    let path = fixture_path(dir, T::collection_name());
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    jsonl::write_jsonl(BufWriter::new(file), records)
}

fn fixture_path(dir: &Path, collection: &str) -> std::path::PathBuf {
    dir.join(format!("{}.jsonl", collection))
}
