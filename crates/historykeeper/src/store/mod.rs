#[cfg(test)]
pub mod memory;

use sqlx::PgPool;

use crate::record::CommandLogRecord;

/// What happened to one written record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same `(epoch_timestamp, command)` was already stored.
    Duplicate,
}

/// Destination for enriched history rows.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// Write one record as one row.
    async fn write(&self, record: &CommandLogRecord) -> anyhow::Result<InsertOutcome>;
}

/// Writes rows to the provisioned `command_log` table.
///
/// Holds the run's single connection pool; [`PgStore::close`] releases it
/// explicitly and dropping the store releases it on any other path.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Wait for the connection to be returned and shut the pool down.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl RecordSink for PgStore {
    async fn write(&self, record: &CommandLogRecord) -> anyhow::Result<InsertOutcome> {
        tracing::debug!(
            epoch_time = record.epoch_timestamp,
            exit_code = record.exit_code,
            command = %record.command,
            "inserting into command_log"
        );
        // No conflict target: against a table without the uniqueness
        // constraint this degrades to a plain insert.
        let result = sqlx::query(
            "INSERT INTO command_log (
                session_id, epoch_timestamp, command, command_args, exit_code, execution_time,
                hostname, username, output, ip_address, parent_pid, tty, working_directory,
                shell_type, session_start_time, public_ip_address, public_hostname
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             ON CONFLICT DO NOTHING",
        )
        .bind(record.session_id)
        .bind(record.epoch_timestamp)
        .bind(&record.command)
        .bind(&record.command_args)
        .bind(record.exit_code)
        .bind(record.execution_time)
        .bind(&record.hostname)
        .bind(&record.username)
        .bind(&record.output)
        .bind(&record.ip_address)
        .bind(record.parent_pid)
        .bind(&record.tty)
        .bind(&record.working_directory)
        .bind(&record.shell_type)
        .bind(record.session_start_time)
        .bind(&record.public_ip_address)
        .bind(&record.public_hostname)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(command = %record.command, "duplicate entry ignored");
            return Ok(InsertOutcome::Duplicate);
        }
        tracing::info!(command = %record.command, "data successfully inserted");
        Ok(InsertOutcome::Inserted)
    }
}
