//! Append-only JSONL audit log

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{CircleError, CircleResult};

use super::entry::{AuditEntry, EntityType};

/// Writes one JSON object per line and flushes after every write
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    pub fn log(&self, entry: &AuditEntry) -> CircleResult<()> {
        self.log_batch(std::slice::from_ref(entry))
    }

    /// Append several entries with a single flush
    pub fn log_batch(&self, entries: &[AuditEntry]) -> CircleResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| CircleError::Io(format!("Failed to open audit log: {}", e)))?;

        for entry in entries {
            let json = serde_json::to_string(entry)
                .map_err(|e| CircleError::Json(format!("Failed to serialize audit entry: {}", e)))?;
            writeln!(file, "{}", json)
                .map_err(|e| CircleError::Io(format!("Failed to write audit entry: {}", e)))?;
        }

        file.flush()
            .map_err(|e| CircleError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// All entries, oldest first
    pub fn read_all(&self) -> CircleResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| CircleError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                CircleError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                CircleError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// The last `count` entries, optionally restricted to one entity type
    pub fn read_recent(
        &self,
        count: usize,
        entity_type: Option<EntityType>,
    ) -> CircleResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        if let Some(wanted) = entity_type {
            entries.retain(|e| e.entity_type == wanted);
        }
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    /// History of a single entity
    pub fn entries_for(&self, entity_id: &str) -> CircleResult<Vec<AuditEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.entity_id == entity_id)
            .collect())
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::Operation;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (logger, temp_dir)
    }

    fn created(entity_type: EntityType, id: &str) -> AuditEntry {
        AuditEntry::create(entity_type, id, None, &json!({"id": id}))
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = create_test_logger();

        logger.log(&created(EntityType::Group, "grp-1")).unwrap();
        logger.log(&created(EntityType::Family, "fam-1")).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entity_id, "grp-1");
        assert_eq!(entries[1].entity_type, EntityType::Family);
    }

    #[test]
    fn test_read_recent_with_filter() {
        let (logger, _temp) = create_test_logger();

        let batch: Vec<_> = (0..6)
            .map(|i| {
                let kind = if i % 2 == 0 {
                    EntityType::Transaction
                } else {
                    EntityType::Member
                };
                created(kind, &format!("id-{}", i))
            })
            .collect();
        logger.log_batch(&batch).unwrap();

        let recent = logger.read_recent(2, None).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id, "id-4");
        assert_eq!(recent[1].entity_id, "id-5");

        let txns = logger.read_recent(10, Some(EntityType::Transaction)).unwrap();
        let ids: Vec<_> = txns.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["id-0", "id-2", "id-4"]);
    }

    #[test]
    fn test_entries_for_entity() {
        let (logger, _temp) = create_test_logger();

        let before = json!({"status": "pending"});
        let after = json!({"status": "declined"});
        logger.log(&created(EntityType::Transaction, "txn-1")).unwrap();
        logger.log(&created(EntityType::Transaction, "txn-2")).unwrap();
        logger
            .log(&AuditEntry::update(EntityType::Transaction, "txn-1", None, &before, &after))
            .unwrap();

        let history = logger.entries_for("txn-1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].operation, Operation::Update);
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();
        assert!(logger.read_all().unwrap().is_empty());
        assert!(logger.read_recent(5, None).unwrap().is_empty());
    }

    #[test]
    fn test_survives_restart() {
        let (logger, temp) = create_test_logger();
        logger.log(&created(EntityType::Group, "grp-1")).unwrap();

        let reopened = AuditLogger::new(temp.path().join("audit.log"));
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }
}
