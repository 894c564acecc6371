use std::path::PathBuf;

use sqlx::postgres::PgConnectOptions;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "mysecretpassword";
pub const DEFAULT_DATABASE: &str = "historykeeper";
pub const DEFAULT_IDENTITY_URL: &str = "https://ipinfo.io";

/// Database every Postgres server ships with; used while the target
/// database may not exist yet.
const MAINTENANCE_DATABASE: &str = "postgres";

/// Connection parameters for the Postgres server holding `command_log`.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

// Custom Debug masks the password so the struct is safe to log.
impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

impl DbConfig {
    /// Build from the libpq environment variables (`PGHOST`, `PGPORT`,
    /// `PGUSER`, `PGPASSWORD`, `PGDATABASE`), falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var("PGPORT")
            .ok()
            .map_or(defaults.port, |s| match s.parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => {
                    tracing::warn!(
                        "PGPORT env var {s:?} is not a valid port number (1-65535), defaulting to {DEFAULT_PORT}"
                    );
                    DEFAULT_PORT
                }
            });
        Self {
            host: std::env::var("PGHOST").unwrap_or(defaults.host),
            port,
            user: std::env::var("PGUSER").unwrap_or(defaults.user),
            password: std::env::var("PGPASSWORD").unwrap_or(defaults.password),
            database: std::env::var("PGDATABASE").unwrap_or(defaults.database),
        }
    }

    /// Same server and credentials, different target database.
    #[must_use]
    pub fn with_database(&self, database: &str) -> Self {
        Self {
            database: database.to_string(),
            ..self.clone()
        }
    }

    /// Options for the server-level connection used before the target
    /// database is known to exist.
    pub fn maintenance_options(&self) -> PgConnectOptions {
        self.base_options().database(MAINTENANCE_DATABASE)
    }

    /// Options selecting the target database.
    pub fn database_options(&self) -> PgConnectOptions {
        self.base_options().database(&self.database)
    }

    /// The password rendered as asterisks, for run headers.
    pub fn masked_password(&self) -> String {
        "*".repeat(self.password.chars().count())
    }

    fn base_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Everything one import run needs, assembled once from the command line.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub input_file: PathBuf,
    pub db: DbConfig,
    /// Base URL of the public IP/hostname service.
    pub identity_url: String,
    /// Skip the public identity lookup and use the loopback fallback.
    pub offline: bool,
    pub verbosity: u8,
}

/// `~/.zsh_history`, or a relative `.zsh_history` when no home directory
/// can be determined.
pub fn default_history_path() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(".zsh_history"),
        |home| home.join(".zsh_history"),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid races between parallel test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const PG_VARS: [&str; 5] = ["PGHOST", "PGPORT", "PGUSER", "PGPASSWORD", "PGDATABASE"];

    fn clear_pg_env() {
        for var in PG_VARS {
            // SAFETY: callers hold ENV_LOCK; no concurrent env mutations
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn from_env_uses_defaults_when_unset() {
        let _g = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_pg_env();
        let cfg = DbConfig::from_env();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.user, "postgres");
        assert_eq!(cfg.password, "mysecretpassword");
        assert_eq!(cfg.database, "historykeeper");
    }

    #[test]
    fn from_env_reads_pg_variables() {
        let _g = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_pg_env();
        // SAFETY: protected by ENV_LOCK; no concurrent env mutations
        unsafe {
            std::env::set_var("PGHOST", "db.internal");
            std::env::set_var("PGPORT", "6543");
            std::env::set_var("PGDATABASE", "shell");
        }
        let cfg = DbConfig::from_env();
        clear_pg_env();
        assert_eq!(cfg.host, "db.internal");
        assert_eq!(cfg.port, 6543);
        assert_eq!(cfg.database, "shell");
        assert_eq!(cfg.user, "postgres");
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let _g = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_pg_env();
        for bad in ["not-a-number", "0", "70000"] {
            // SAFETY: protected by ENV_LOCK; no concurrent env mutations
            unsafe { std::env::set_var("PGPORT", bad) };
            assert_eq!(DbConfig::from_env().port, 5432, "PGPORT={bad}");
        }
        clear_pg_env();
    }

    #[test]
    fn debug_masks_password() {
        let cfg = DbConfig {
            password: "super-secret".to_string(),
            ..DbConfig::default()
        };
        let debug_str = format!("{cfg:?}");
        assert!(!debug_str.contains("super-secret"));
        assert!(debug_str.contains("<redacted>"));
        assert!(debug_str.contains("localhost"));
        assert!(debug_str.contains("historykeeper"));
    }

    #[test]
    fn masked_password_matches_length() {
        let cfg = DbConfig {
            password: "abc123".to_string(),
            ..DbConfig::default()
        };
        assert_eq!(cfg.masked_password(), "******");
    }

    #[test]
    fn with_database_keeps_credentials() {
        let cfg = DbConfig::default().with_database("other");
        assert_eq!(cfg.database, "other");
        assert_eq!(cfg.user, "postgres");
        assert_eq!(cfg.password, "mysecretpassword");
    }

    #[test]
    fn connect_options_select_expected_databases() {
        let cfg = DbConfig::default().with_database("target");
        assert_eq!(cfg.maintenance_options().get_database(), Some("postgres"));
        assert_eq!(cfg.database_options().get_database(), Some("target"));
        assert_eq!(cfg.database_options().get_host(), "localhost");
        assert_eq!(cfg.database_options().get_port(), 5432);
    }

    #[test]
    fn default_history_path_ends_with_zsh_history() {
        assert!(default_history_path().ends_with(".zsh_history"));
    }
}
