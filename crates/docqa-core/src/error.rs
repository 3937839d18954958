use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("File is empty or contains no readable text: {}", .path.display())]
    EmptyInput { path: PathBuf },

    #[error("File too large ({:.1}MB): {}. Maximum size: {:.0}MB", mib(.size), .path.display(), mib(.limit))]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("{format} support is unavailable: {hint}")]
    UnsupportedFormat { format: &'static str, hint: String },

    #[error("Could not extract any text from {}", .path.display())]
    NoExtractableText { path: PathBuf },

    #[error("No content extracted from file: {}", .path.display())]
    NoContent { path: PathBuf },

    #[error("No chunks created from file: {}", .path.display())]
    NoChunks { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[allow(clippy::cast_precision_loss)]
fn mib(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
