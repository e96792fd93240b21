use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("File {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("Unable to read JAR file {}", path.display())]
    UnreadableArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Unable to list directory {}", path.display())]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("Unable to resolve absolute path of {}", path.display())]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reported by clap, which shows only this message, so the regex
    /// diagnostic is part of it rather than a source.
    #[error("Invalid filter pattern {pattern:?}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: regex::Error,
    },
}

impl ListError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: impl Into<zip::result::ZipError>) -> Self {
        Self::UnreadableArchive {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ListError>;
