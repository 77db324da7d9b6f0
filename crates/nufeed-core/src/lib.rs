use error::NufeedError;

pub mod archive;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod gallery;
pub mod ingest;
pub mod models;
pub mod render;
pub mod store;
pub mod templates;
pub mod version;

#[cfg(test)]
pub(crate) mod test_utils;

pub type NufeedResult<T> = std::result::Result<T, NufeedError>;
