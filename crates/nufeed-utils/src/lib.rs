//! Small helpers shared by the nufeed crates: hashing, filesystem and path handling.

pub mod bytes;
pub mod error;
pub mod fs;
pub mod hash;
pub mod path;
