use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{FileSystemError, FileSystemResult};

pub trait FileSystemProvider {
    /// Removes the specified file safely.
    ///
    /// If the path does not exist, this function returns `Ok(())` without error.
    ///
    /// # Errors
    ///
    /// Returns a [`FileSystemError::File`] if the removal fails for any reason other than
    /// the path not existing.
    fn safe_remove<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Creates a directory structure if it doesn't exist.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory could not be created.
    /// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Writes `contents` to `path` through a sibling temporary file and a rename, so readers
    /// never observe a partially written file.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::File`] if the temporary file cannot be written or renamed.
    fn write_atomic<P: AsRef<Path>>(&self, path: P, contents: &[u8]) -> FileSystemResult<()>;

    /// Lists regular files directly inside `dir` whose extension matches `extension`
    /// case-insensitively. The result is sorted by path.
    ///
    /// A missing directory yields an empty list.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory cannot be read.
    fn files_with_extension<P: AsRef<Path>>(
        &self,
        dir: P,
        extension: &str,
    ) -> FileSystemResult<Vec<PathBuf>>;
}

#[derive(Default, Clone)]
pub struct StandardFileSystemProvider;

impl FileSystemProvider for StandardFileSystemProvider {
    fn safe_remove<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(());
        }

        fs::remove_file(path).map_err(|err| {
            FileSystemError::File {
                path: path.to_path_buf(),
                action: "remove",
                source: err,
            }
        })
    }

    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).map_err(|err| {
                FileSystemError::Directory {
                    path: path.to_path_buf(),
                    action: "create",
                    source: err,
                }
            })?;
        } else if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    fn write_atomic<P: AsRef<Path>>(&self, path: P, contents: &[u8]) -> FileSystemResult<()> {
        let path = path.as_ref();
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".part");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, contents).map_err(|err| {
            FileSystemError::File {
                path: tmp_path.clone(),
                action: "write",
                source: err,
            }
        })?;

        fs::rename(&tmp_path, path).map_err(|err| {
            let _ = fs::remove_file(&tmp_path);
            FileSystemError::File {
                path: path.to_path_buf(),
                action: "rename",
                source: err,
            }
        })
    }

    fn files_with_extension<P: AsRef<Path>>(
        &self,
        dir: P,
        extension: &str,
    ) -> FileSystemResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let read_error = |err| {
            FileSystemError::Directory {
                path: dir.to_path_buf(),
                action: "read",
                source: err,
            }
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }
}

/// Creates a directory structure if it doesn't exist.
///
/// See [`FileSystemProvider::ensure_dir_exists`] for detailed documentation.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.ensure_dir_exists(path)
}

/// Removes the specified file safely.
///
/// See [`FileSystemProvider::safe_remove`] for detailed documentation.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.safe_remove(path)
}

/// Writes a file through a temporary sibling and a rename.
///
/// See [`FileSystemProvider::write_atomic`] for detailed documentation.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> FileSystemResult<()> {
    StandardFileSystemProvider.write_atomic(path, contents)
}

/// Lists files in a directory by extension.
///
/// See [`FileSystemProvider::files_with_extension`] for detailed documentation.
pub fn files_with_extension<P: AsRef<Path>>(
    dir: P,
    extension: &str,
) -> FileSystemResult<Vec<PathBuf>> {
    StandardFileSystemProvider.files_with_extension(dir, extension)
}
