use std::path::Path;

use tokio::io::{AsyncBufReadExt as _, BufReader};

use crate::context::Enricher;
use crate::error::ImportError;
use crate::parser::{is_entry_line, parse_line};
use crate::store::{InsertOutcome, RecordSink};

/// Per-run counters, reported once the file is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Every line read, including skipped ones.
    pub lines: usize,
    /// Lines without the `": "` entry prefix (continuations, blanks).
    pub skipped: usize,
    /// Lines with the prefix that did not parse.
    pub unparsed: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// Entries the sink rejected.
    pub failed: usize,
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} lines: {} inserted, {} duplicate, {} failed, {} unparsed, {} skipped",
            self.lines, self.inserted, self.duplicates, self.failed, self.unparsed, self.skipped
        )
    }
}

/// Confirm `path` names a regular file before anything touches the database.
///
/// # Errors
///
/// Returns [`ImportError::MissingInput`] if `path` does not exist, or
/// [`ImportError::Io`] if it cannot be inspected or is not a regular file.
pub async fn check_input(path: &Path) -> Result<(), ImportError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(ImportError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(ImportError::MissingInput {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(ImportError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Stream a history file through parse, enrich and persist.
///
/// Lines are handled one at a time; a line that fails to parse or persist is
/// logged and counted, and the run moves on to the next one.
///
/// # Errors
///
/// Returns [`ImportError::MissingInput`] if `path` does not exist (nothing is
/// written), or [`ImportError::Io`] if the file cannot be opened or read.
pub async fn ingest_file(
    path: &Path,
    enricher: &Enricher,
    sink: &dyn RecordSink,
) -> Result<IngestSummary, ImportError> {
    tracing::info!(path = %path.display(), "processing history file");
    let file = tokio::fs::File::open(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ImportError::MissingInput {
                path: path.to_path_buf(),
            }
        } else {
            ImportError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut summary = IngestSummary::default();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| ImportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }
        summary.lines += 1;
        // zsh may write metafied bytes that are not valid UTF-8.
        let line = String::from_utf8_lossy(&buf);
        process_line(line.trim(), enricher, sink, &mut summary).await;
    }

    tracing::info!(
        lines = summary.lines,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        failed = summary.failed,
        unparsed = summary.unparsed,
        skipped = summary.skipped,
        "finished processing history file"
    );
    Ok(summary)
}

async fn process_line(
    line: &str,
    enricher: &Enricher,
    sink: &dyn RecordSink,
    summary: &mut IngestSummary,
) {
    if !is_entry_line(line) {
        summary.skipped += 1;
        return;
    }
    let Some(entry) = parse_line(line) else {
        tracing::warn!(entry = %line, "failed to parse entry");
        summary.unparsed += 1;
        return;
    };
    let record = enricher.enrich(&entry);
    match sink.write(&record).await {
        Ok(InsertOutcome::Inserted) => summary.inserted += 1,
        Ok(InsertOutcome::Duplicate) => summary.duplicates += 1,
        Err(e) => {
            tracing::error!(
                command = %entry.command.trim(),
                "error inserting command: {e:#}"
            );
            summary.failed += 1;
        }
    }
}
