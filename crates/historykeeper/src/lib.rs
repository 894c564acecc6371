pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod logging;
pub mod parser;
pub mod record;
pub mod store;
