use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{InsertOutcome, RecordSink};
use crate::record::CommandLogRecord;

/// In-memory sink for tests. Applies the same `(epoch_timestamp, command)`
/// uniqueness as the hardened table and can be switched into a failing mode.
pub struct MemorySink {
    rows: Mutex<Vec<CommandLogRecord>>,
    keys: Mutex<HashSet<(i64, String)>>,
    write_calls: AtomicUsize,
    failing: AtomicBool,
    /// When `false`, duplicates are stored like any other row.
    enforce_unique: bool,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::expect_used)]
impl MemorySink {
    pub fn new() -> Self {
        Self::with_uniqueness(true)
    }

    /// A sink that keeps every row, like a table without the constraint.
    pub fn without_uniqueness() -> Self {
        Self::with_uniqueness(false)
    }

    fn with_uniqueness(enforce_unique: bool) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            keys: Mutex::new(HashSet::new()),
            write_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            enforce_unique,
        }
    }

    /// Make every following write return an error.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> usize {
        self.write_calls.load(Ordering::Relaxed)
    }

    pub fn rows(&self) -> Vec<CommandLogRecord> {
        self.rows.lock().expect("lock poisoned").clone()
    }
}

#[allow(clippy::expect_used)]
#[async_trait::async_trait]
impl RecordSink for MemorySink {
    async fn write(&self, record: &CommandLogRecord) -> anyhow::Result<InsertOutcome> {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.load(Ordering::Relaxed) {
            anyhow::bail!("simulated datastore failure");
        }
        let key = (record.epoch_timestamp, record.command.clone());
        if self.enforce_unique && !self.keys.lock().expect("lock poisoned").insert(key) {
            return Ok(InsertOutcome::Duplicate);
        }
        self.rows
            .lock()
            .expect("lock poisoned")
            .push(record.clone());
        Ok(InsertOutcome::Inserted)
    }
}
