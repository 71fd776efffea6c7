use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`CompressionError`].
///
/// Collection-phase kinds (`DirectoryNotFound`, `Traversal`) abort a whole
/// batch; execution-phase kinds (`OutputDirCreation`, `Compression`) stay
/// local to the job that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DirectoryNotFound,
    Traversal,
    OutputDirCreation,
    Compression,
    Configuration,
    WorkerPool,
    Io,
}

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Input directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Directory traversal failed: {0}")]
    Traversal(#[from] walkdir::Error),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} compression failed: {message}")]
    Compression {
        format: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("Invalid palette size: {0}. Must be between {1} and {2}")]
    InvalidPaletteSize(u16, u16, u16),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl CompressionError {
    /// Wraps a codec failure, tagging it with the format that produced it.
    pub fn compression<E>(format: impl Into<String>, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CompressionError::Compression {
            format: format.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompressionError::DirectoryNotFound(_) | CompressionError::NotADirectory(_) => {
                ErrorKind::DirectoryNotFound
            }
            CompressionError::Traversal(_) => ErrorKind::Traversal,
            CompressionError::OutputDirCreation { .. } => ErrorKind::OutputDirCreation,
            CompressionError::Compression { .. }
            | CompressionError::UnsupportedFormat(_)
            | CompressionError::Image(_)
            | CompressionError::PngOptimization(_) => ErrorKind::Compression,
            CompressionError::InvalidQuality(_)
            | CompressionError::InvalidPaletteSize(..)
            | CompressionError::InvalidPattern { .. } => ErrorKind::Configuration,
            CompressionError::WorkerPool(_) => ErrorKind::WorkerPool,
            CompressionError::Io(_) => ErrorKind::Io,
        }
    }

    /// True for errors that abort a batch before any job runs.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DirectoryNotFound
                | ErrorKind::Traversal
                | ErrorKind::Configuration
                | ErrorKind::WorkerPool
        )
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
