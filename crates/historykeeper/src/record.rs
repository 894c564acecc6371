use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Marker stored in `output` for rows backfilled from a history file rather
/// than captured while the command ran.
pub const IMPORTED_OUTPUT: &str = "IMPORTED";

/// One entry decoded from a `": <epoch>:<code>;<command>"` history line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub epoch_time: i64,
    pub exit_code: i32,
    pub command: String,
}

/// A row of the `command_log` table, minus the database-assigned `id` and
/// insertion `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLogRecord {
    /// Fresh per row; history files carry no shell-session identity.
    pub session_id: Uuid,
    pub epoch_timestamp: i64,
    pub command: String,
    pub command_args: String,
    pub exit_code: i32,
    pub execution_time: i32,
    pub hostname: String,
    pub username: String,
    pub output: String,
    pub ip_address: String,
    pub parent_pid: i32,
    pub tty: String,
    pub working_directory: String,
    pub shell_type: String,
    pub session_start_time: DateTime<Utc>,
    pub public_ip_address: String,
    pub public_hostname: String,
}
