use std::process::ExitCode;

use clap::Parser;

use historykeeper::cli::Cli;
use historykeeper::config::ImportConfig;
use historykeeper::context::{Enricher, HostFacts};
use historykeeper::error::ImportError;
use historykeeper::identity::{IdentityResolver, PublicIdentity};
use historykeeper::ingest::{IngestSummary, check_input, ingest_file};
use historykeeper::store::PgStore;
use historykeeper::{db, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();
    logging::init(config.verbosity);

    tracing::info!("starting import");
    match run(&config).await {
        Ok(summary) => {
            eprintln!("[historykeeper] {summary}");
            tracing::info!("import finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("[historykeeper] error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &ImportConfig) -> Result<IngestSummary, ImportError> {
    tracing::info!(
        host = %config.db.host,
        port = config.db.port,
        user = %config.db.user,
        database = %config.db.database,
        password = %config.db.masked_password(),
        input = %config.input_file.display(),
        "import settings"
    );

    // Fail before touching the database when there is nothing to import.
    check_input(&config.input_file).await?;

    let pool = db::provision(&config.db).await?;
    let store = PgStore::new(pool);

    let enricher = Enricher::new(HostFacts::gather(), public_identity(config).await);
    let result = ingest_file(&config.input_file, &enricher, &store).await;
    store.close().await;
    result
}

async fn public_identity(config: &ImportConfig) -> PublicIdentity {
    if config.offline {
        return PublicIdentity::fallback();
    }
    match IdentityResolver::new(&config.identity_url) {
        Ok(resolver) => resolver.resolve().await,
        Err(e) => {
            tracing::error!("error fetching public IP and hostname: {e:#}");
            PublicIdentity::fallback()
        }
    }
}
