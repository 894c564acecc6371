use std::path::PathBuf;

/// Conditions that end an import run. Everything else (unparsable lines,
/// failed lookups, rejected inserts) is logged and absorbed per line.
#[derive(Debug)]
pub enum ImportError {
    /// The history file does not exist.
    MissingInput { path: PathBuf },
    /// Reading the history file failed after it was found.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The database or `command_log` table could not be set up.
    Provisioning {
        step: &'static str,
        source: sqlx::Error,
    },
}

impl ImportError {
    pub(crate) fn provisioning(step: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Provisioning { step, source }
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput { path } => write!(f, "file not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "could not read {}: {source}", path.display()),
            Self::Provisioning { step, source } => {
                write!(f, "provisioning failed ({step}): {source}")
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingInput { .. } => None,
            Self::Io { source, .. } => Some(source),
            Self::Provisioning { source, .. } => Some(source),
        }
    }
}
