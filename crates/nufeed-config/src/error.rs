use miette::Diagnostic;
use nufeed_utils::error::{FileSystemError, PathError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(nufeed_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(nufeed_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(nufeed_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Invalid base URL `{url}`: {reason}")]
    #[diagnostic(
        code(nufeed_config::invalid_base_url),
        help("Use an absolute http(s) URL such as http://localhost:5000/nuget")
    )]
    InvalidBaseUrl { url: String, reason: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(nufeed_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(nufeed_config::path), help("Check the paths set in your config"))]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(code(nufeed_config::fs))]
    FileSystem(#[from] FileSystemError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(nufeed_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(nufeed_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
