// JSONL reading and writing for seed fixtures and snapshots

use crate::record::Record;
use eyre::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Parse one record per line, skipping blank lines and lines that fail to parse
///
/// `source` only labels warnings.
pub fn read_jsonl<T, R>(reader: R, source: &str) -> Vec<T>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    source,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    source,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
            }
        }
    }

    records
}

/// Read all records from a JSONL file. A missing file yields no records.
pub fn read_jsonl_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("Failed to open JSONL file {}", path.display()))?;
    let records = read_jsonl(BufReader::new(file), &path.display().to_string());

    info!(
        file = ?path,
        count = records.len(),
        "Loaded records from JSONL"
    );

    Ok(records)
}

/// Write records as JSONL, one per line
pub fn write_jsonl<T, W>(mut writer: W, records: &[T]) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    for record in records {
        let json = serde_json::to_string(record).context("Failed to serialize record")?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(())
}

/// Line written by [`write_tagged_jsonl`]
#[derive(Serialize)]
struct Tagged<'a, T> {
    collection: &'static str,
    record: &'a T,
}

/// Write records as JSONL wrapped as `{"collection": .., "record": ..}` so
/// several collections can share one stream
pub fn write_tagged_jsonl<T, W>(mut writer: W, records: &[T]) -> Result<()>
where
    T: Record,
    W: Write,
{
    for record in records {
        let tagged = Tagged {
            collection: T::collection_name(),
            record,
        };
        let json = serde_json::to_string(&tagged).context("Failed to serialize record")?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        id: u64,
        name: String,
    }

    #[test]
    fn test_read_jsonl_skips_blank_and_malformed_lines() {
        let input = "{\"id\":1,\"name\":\"one\"}\n\n{not json}\n{\"id\":2,\"name\":\"two\"}\n";
        let records: Vec<TestRecord> = read_jsonl(Cursor::new(input), "inline");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "one");
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn test_read_jsonl_file_missing_is_empty() {
        let temp = TempDir::new().unwrap();
        let records: Vec<TestRecord> = read_jsonl_file(&temp.path().join("nope.jsonl")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_write_then_read_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("records.jsonl");
        let records = vec![
            TestRecord {
                id: 1,
                name: "alpha".to_string(),
            },
            TestRecord {
                id: 2,
                name: "beta".to_string(),
            },
        ];

        write_jsonl(fs::File::create(&path).unwrap(), &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let loaded: Vec<TestRecord> = read_jsonl_file(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_write_tagged_jsonl() {
        use crate::models::{Category, CategoryDraft};
        use crate::category_store::CategoryStore;

        let mut store = CategoryStore::new();
        let category: Category = store.create(CategoryDraft::new("Garden"));

        let mut out = Vec::new();
        write_tagged_jsonl(&mut out, &[category]).unwrap();

        let line: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["collection"], "categories");
        assert_eq!(line["record"]["name"], "Garden");
        assert_eq!(line["record"]["id"], 1);
    }
}
