use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_IDENTITY_URL, DEFAULT_PASSWORD, DEFAULT_PORT,
    DEFAULT_USER, DbConfig, ImportConfig, default_history_path,
};

#[derive(Parser, Debug)]
#[command(
    name = "historykeeper",
    version,
    about = "Process and insert zsh history into a PostgreSQL database"
)]
pub struct Cli {
    /// Increase verbosity level. Use -v, -vv, -vvv for more verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the zsh history file [default: ~/.zsh_history]
    #[arg(short, long, env = "HISTFILE")]
    pub input_file: Option<PathBuf>,

    /// PostgreSQL host
    #[arg(long, env = "PGHOST", default_value = DEFAULT_HOST)]
    pub pg_host: String,

    /// PostgreSQL port
    #[arg(long, env = "PGPORT", default_value_t = DEFAULT_PORT)]
    pub pg_port: u16,

    /// PostgreSQL user
    #[arg(long, env = "PGUSER", default_value = DEFAULT_USER)]
    pub pg_user: String,

    /// PostgreSQL password
    #[arg(long, env = "PGPASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true, hide_default_value = true)]
    pub pg_password: String,

    /// PostgreSQL database name
    #[arg(long, env = "PGDATABASE", default_value = DEFAULT_DATABASE)]
    pub pg_db: String,

    /// Base URL of the public IP/hostname lookup service
    #[arg(long, env = "HISTORYKEEPER_IDENTITY_URL", default_value = DEFAULT_IDENTITY_URL)]
    pub identity_url: String,

    /// Skip the public IP/hostname lookup and record loopback values
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    pub fn into_config(self) -> ImportConfig {
        ImportConfig {
            input_file: self.input_file.unwrap_or_else(default_history_path),
            db: DbConfig {
                host: self.pg_host,
                port: self.pg_port,
                user: self.pg_user,
                password: self.pg_password,
                database: self.pg_db,
            },
            identity_url: self.identity_url,
            offline: self.offline,
            verbosity: self.verbose,
        }
    }
}
