//! Audit logger for append-only audit log
//!
//! Each entry is written as a single JSON line and flushed immediately.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{Transaction, TransactionId};
use crate::session::Changes;

use super::diff::generate_diff;
use super::entry::AuditEntry;

/// Build the entries for a committed batch
///
/// `previous` holds the stored version of every updated row, keyed by id.
/// Updates without a previous version are logged without before values.
pub fn entries_for(
    changes: &Changes,
    previous: &HashMap<TransactionId, Transaction>,
) -> Vec<AuditEntry> {
    let mut entries = Vec::with_capacity(changes.len());

    entries.extend(changes.added.iter().map(AuditEntry::create));

    for after in &changes.updated {
        let entry = match previous.get(&after.id) {
            Some(before) => {
                let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
                    (Ok(b), Ok(a)) => generate_diff(&b, &a),
                    _ => None,
                };
                AuditEntry::update(before, after, diff)
            }
            None => {
                let mut entry = AuditEntry::update(after, after, None);
                entry.before = None;
                entry
            }
        };
        entries.push(entry);
    }

    entries.extend(changes.deleted.iter().map(AuditEntry::delete));
    entries
}

/// Handles writing audit entries to the audit log file (JSONL)
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    fn open_for_append(&self) -> SplitbookResult<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| SplitbookError::Io(format!("Failed to open audit log: {}", e)))
    }

    /// Append one entry
    pub fn log(&self, entry: &AuditEntry) -> SplitbookResult<()> {
        self.log_batch(std::slice::from_ref(entry))
    }

    /// Append several entries, flushing once at the end
    pub fn log_batch(&self, entries: &[AuditEntry]) -> SplitbookResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut file = self.open_for_append()?;

        for entry in entries {
            let json = serde_json::to_string(entry).map_err(|e| {
                SplitbookError::Json(format!("Failed to serialize audit entry: {}", e))
            })?;

            writeln!(file, "{}", json)
                .map_err(|e| SplitbookError::Io(format!("Failed to write audit entry: {}", e)))?;
        }

        file.flush()
            .map_err(|e| SplitbookError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all audit entries, oldest first
    pub fn read_all(&self) -> SplitbookResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| SplitbookError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                SplitbookError::Io(format!(
                    "Failed to read audit log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                SplitbookError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent N entries from the log
    pub fn read_recent(&self, count: usize) -> SplitbookResult<Vec<AuditEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
