use chrono::Utc;
use uuid::Uuid;

use crate::identity::PublicIdentity;
use crate::record::{CommandLogRecord, IMPORTED_OUTPUT, ParsedEntry};

/// Shell recorded when `SHELL` is unset.
pub const DEFAULT_SHELL: &str = "/bin/zsh";

/// Facts about the importing process and the machine it runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub hostname: String,
    pub username: String,
    pub working_directory: String,
    pub parent_pid: i32,
    pub shell_type: String,
}

impl HostFacts {
    /// Read the facts from the OS and environment. Anything unreadable is
    /// recorded as a placeholder rather than failing the import.
    pub fn gather() -> Self {
        Self {
            hostname: gethostname::gethostname().to_string_lossy().into_owned(),
            username: current_username(),
            working_directory: std::env::current_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            parent_pid: parent_pid(),
            shell_type: std::env::var("SHELL").unwrap_or_else(|_| DEFAULT_SHELL.to_string()),
        }
    }
}

fn current_username() -> String {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn parent_pid() -> i32 {
    i32::try_from(std::os::unix::process::parent_id()).unwrap_or(0)
}

#[cfg(not(unix))]
const fn parent_pid() -> i32 {
    0
}

/// Turns parsed entries into `command_log` rows.
///
/// Host facts and the public identity are captured once, when the enricher
/// is built, and shared by every row of the run.
#[derive(Debug, Clone)]
pub struct Enricher {
    host: HostFacts,
    identity: PublicIdentity,
}

impl Enricher {
    pub const fn new(host: HostFacts, identity: PublicIdentity) -> Self {
        Self { host, identity }
    }

    pub fn enrich(&self, entry: &ParsedEntry) -> CommandLogRecord {
        CommandLogRecord {
            session_id: Uuid::new_v4(),
            epoch_timestamp: entry.epoch_time,
            command: entry.command.clone(),
            command_args: String::new(),
            exit_code: entry.exit_code,
            // No duration is recorded in history files.
            execution_time: 0,
            hostname: self.host.hostname.clone(),
            username: self.host.username.clone(),
            output: IMPORTED_OUTPUT.to_string(),
            ip_address: self.identity.ip_address.clone(),
            parent_pid: self.host.parent_pid,
            tty: String::new(),
            working_directory: self.host.working_directory.clone(),
            shell_type: self.host.shell_type.clone(),
            session_start_time: Utc::now(),
            public_ip_address: self.identity.ip_address.clone(),
            public_hostname: self.identity.hostname.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn fixed_host() -> HostFacts {
        HostFacts {
            hostname: "laptop".to_string(),
            username: "ada".to_string(),
            working_directory: "/home/ada".to_string(),
            parent_pid: 4242,
            shell_type: "/usr/bin/zsh".to_string(),
        }
    }

    fn entry() -> ParsedEntry {
        ParsedEntry {
            epoch_time: 1_700_000_000,
            exit_code: 0,
            command: "echo hello".to_string(),
        }
    }

    #[test]
    fn enrich_fills_constant_fields() {
        let enricher = Enricher::new(fixed_host(), PublicIdentity::fallback());
        let before = Utc::now();
        let record = enricher.enrich(&entry());

        assert_eq!(record.epoch_timestamp, 1_700_000_000);
        assert_eq!(record.command, "echo hello");
        assert_eq!(record.exit_code, 0);
        assert_eq!(record.execution_time, 0);
        assert_eq!(record.output, "IMPORTED");
        assert_eq!(record.command_args, "");
        assert_eq!(record.tty, "");
        assert!(record.session_start_time >= before);
    }

    #[test]
    fn enrich_copies_host_facts() {
        let enricher = Enricher::new(fixed_host(), PublicIdentity::fallback());
        let record = enricher.enrich(&entry());

        assert_eq!(record.hostname, "laptop");
        assert_eq!(record.username, "ada");
        assert_eq!(record.working_directory, "/home/ada");
        assert_eq!(record.parent_pid, 4242);
        assert_eq!(record.shell_type, "/usr/bin/zsh");
    }

    #[test]
    fn ip_columns_share_the_public_ip() {
        let identity = PublicIdentity {
            ip_address: "203.0.113.7".to_string(),
            hostname: "host-7.example.net".to_string(),
        };
        let record = Enricher::new(fixed_host(), identity).enrich(&entry());

        assert_eq!(record.ip_address, "203.0.113.7");
        assert_eq!(record.public_ip_address, "203.0.113.7");
        assert_eq!(record.public_hostname, "host-7.example.net");
    }

    #[test]
    fn fallback_identity_is_loopback() {
        let record = Enricher::new(fixed_host(), PublicIdentity::fallback()).enrich(&entry());
        assert_eq!(record.public_ip_address, "127.0.0.1");
        assert_eq!(record.public_hostname, "localhost");
    }

    #[test]
    fn every_row_gets_its_own_session_id() {
        let enricher = Enricher::new(fixed_host(), PublicIdentity::fallback());
        let a = enricher.enrich(&entry());
        let b = enricher.enrich(&entry());
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.session_id.get_version_num(), 4);
    }

    #[test]
    fn gather_reads_process_facts() {
        let facts = HostFacts::gather();
        assert!(!facts.hostname.is_empty());
        assert!(!facts.username.is_empty());
        assert!(!facts.shell_type.is_empty());
        #[cfg(unix)]
        assert!(facts.parent_pid > 0);
    }
}
