use std::time::Duration;

use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{Connection as _, PgPool};

use crate::config::DbConfig;
use crate::error::ImportError;

/// `command_log` with NOT NULL on the columns every import fills.
pub const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS command_log (
        id                 BIGSERIAL PRIMARY KEY,
        session_id         UUID        NOT NULL,
        timestamp          TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
        epoch_timestamp    BIGINT      NOT NULL,
        command            TEXT        NOT NULL,
        command_args       TEXT        NOT NULL DEFAULT '',
        exit_code          INT         NOT NULL,
        execution_time     INT         NOT NULL DEFAULT 0,
        hostname           TEXT,
        username           TEXT,
        output             TEXT        NOT NULL,
        ip_address         TEXT,
        parent_pid         INT,
        tty                TEXT        NOT NULL DEFAULT '',
        working_directory  TEXT,
        shell_type         TEXT,
        session_start_time TIMESTAMPTZ,
        public_ip_address  TEXT,
        public_hostname    TEXT
    )";

/// Uniqueness on `(epoch_timestamp, command)` so re-importing the same file
/// adds nothing. The command is hashed: btree entries are capped at about a
/// third of a page, and history lines can be far longer than that.
pub const CREATE_UNIQUE_INDEX_SQL: &str = "
    CREATE UNIQUE INDEX IF NOT EXISTS command_log_epoch_command_key
        ON command_log (epoch_timestamp, md5(command))";

const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Make sure the target database and `command_log` exist, then return a
/// single-connection pool on the target database for the rest of the run.
///
/// Safe to call on every run: existing databases and tables are left as
/// they are.
///
/// # Errors
///
/// Returns [`ImportError::Provisioning`] if the server cannot be reached,
/// the database cannot be created, or the table or index statement fails.
pub async fn provision(config: &DbConfig) -> Result<PgPool, ImportError> {
    tracing::info!("provisioning database and table if they don't exist");
    ensure_database(config).await?;

    let pool = create_pool(config)
        .await
        .map_err(ImportError::provisioning("connect to target database"))?;
    sqlx::query(CREATE_TABLE_SQL)
        .execute(&pool)
        .await
        .map_err(ImportError::provisioning("create table"))?;
    sqlx::query(CREATE_UNIQUE_INDEX_SQL)
        .execute(&pool)
        .await
        .map_err(ImportError::provisioning("create unique index"))?;
    tracing::info!("table command_log provisioned if it did not exist");
    Ok(pool)
}

/// Pool of one connection; rows are written strictly one after another.
///
/// # Errors
///
/// Returns an error if a connection cannot be established within the
/// acquire timeout.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect_with(config.database_options())
        .await
}

async fn ensure_database(config: &DbConfig) -> Result<(), ImportError> {
    let mut conn = PgConnection::connect_with(&config.maintenance_options())
        .await
        .map_err(ImportError::provisioning("connect to server"))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&config.database)
            .fetch_one(&mut conn)
            .await
            .map_err(ImportError::provisioning("look up database"))?;

    if exists {
        tracing::info!(database = %config.database, "database already exists");
    } else {
        // CREATE DATABASE cannot take a bind parameter for the name.
        let stmt = format!("CREATE DATABASE {}", quote_ident(&config.database));
        sqlx::query(&stmt)
            .execute(&mut conn)
            .await
            .map_err(ImportError::provisioning("create database"))?;
        tracing::info!(database = %config.database, "database created");
    }

    if let Err(e) = conn.close().await {
        tracing::warn!("failed to close server connection: {e}");
    }
    Ok(())
}

/// Quote a Postgres identifier, doubling embedded double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
