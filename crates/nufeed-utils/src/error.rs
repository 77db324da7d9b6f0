use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Failed to get current directory: {source}")]
    CurrentDir { source: std::io::Error },

    #[error("Path is empty")]
    Empty,

    #[error("Environment variable `{var}` not set in `{input}`")]
    MissingEnvVar { var: String, input: String },

    #[error("Unclosed variable expression starting at `{input}`")]
    UnclosedVariable { input: String },
}

/// Filesystem failures, carrying the path and the attempted action.
#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("Failed to {action} file `{}`: {source}", path.display())]
    File {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    #[error("Failed to {action} directory `{}`: {source}", path.display())]
    Directory {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    #[error("`{}` is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type PathResult<T> = std::result::Result<T, PathError>;
