//! Error types for nufeed-core.

use miette::Diagnostic;
use nufeed_config::error::ConfigError;
use nufeed_utils::error::{FileSystemError, PathError};
use thiserror::Error;

/// Core error type for feed operations.
///
/// Lookups that find nothing are not errors; they produce empty results.
#[derive(Error, Diagnostic, Debug)]
pub enum NufeedError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(
        code(nufeed::fs),
        help("Check permissions on the package directory")
    )]
    FileSystemError(#[from] FileSystemError),

    #[error(transparent)]
    #[diagnostic(code(nufeed::path), help("Check the configured paths"))]
    PathError(#[from] PathError),

    #[error("Error while {action}")]
    #[diagnostic(code(nufeed::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed package archive: {0}")]
    #[diagnostic(
        code(nufeed::malformed_archive),
        help("A package must be a zip archive containing a .nuspec descriptor")
    )]
    MalformedArchive(String),

    #[error("Invalid package descriptor: {0}")]
    #[diagnostic(
        code(nufeed::invalid_descriptor),
        help("The .nuspec must be well-formed XML declaring both <id> and <version>")
    )]
    InvalidDescriptor(String),

    #[error("Unsupported filter: {0}")]
    #[diagnostic(
        code(nufeed::filter),
        help("Supported clauses: Id='x', Version='x', IsLatestVersion, IsAbsoluteLatestVersion")
    )]
    InternalFilterError(String),

    #[error(transparent)]
    #[diagnostic(code(nufeed::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Thread lock poison error")]
    #[diagnostic(
        code(nufeed::poison),
        help("This is an internal error, please report it")
    )]
    PoisonError,

    #[error("{0}")]
    #[diagnostic(code(nufeed::error))]
    Custom(String),
}

impl<T> From<std::sync::PoisonError<T>> for NufeedError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::PoisonError
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, NufeedError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, NufeedError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            NufeedError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
