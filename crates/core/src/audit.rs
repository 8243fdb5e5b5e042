//! Audit log of the external tools invoked during a rebuild.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Sequence number within the run.
    pub seq: u64,
    /// Pipeline step that ran the command.
    pub step: &'static str,
    /// The command line that was executed.
    pub command: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl AuditEntry {
    pub fn new(
        step: &'static str,
        command: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        exit_code: Option<i32>,
    ) -> Self {
        let duration = completed_at - started_at;
        let duration_ms = duration.num_milliseconds().max(0) as u64;
        let success = exit_code.map(|c| c == 0).unwrap_or(false);

        Self {
            seq: 0,
            step,
            command,
            exit_code,
            success,
            started_at,
            completed_at,
            duration_ms,
        }
    }
}

/// Ordered record of invocations.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    next_seq: u64,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, assigning the next sequence number.
    pub fn add(&mut self, mut entry: AuditEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(entry);
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }
}
