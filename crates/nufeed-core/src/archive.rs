//! Package archive collaborators: descriptor extraction and archive storage.

use std::{
    fs::File,
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use nufeed_utils::fs::{ensure_dir_exists, files_with_extension, safe_remove, write_atomic};
use tracing::{debug, trace};
use zip::ZipArchive;

use crate::{
    error::{ErrorContext, NufeedError},
    NufeedResult,
};

pub const ARCHIVE_EXTENSION: &str = "nupkg";
const DESCRIPTOR_EXTENSION: &str = ".nuspec";

/// File name an archive is stored under: `<Id>.<Version>.nupkg`.
pub fn archive_file_name(id: &str, version: &str) -> String {
    format!("{id}.{version}.{ARCHIVE_EXTENSION}")
}

/// Pulls the descriptor document out of archive bytes.
pub trait DescriptorExtractor: Send + Sync {
    /// Returns the raw descriptor bytes.
    ///
    /// # Errors
    ///
    /// * [`NufeedError::MalformedArchive`] if the archive cannot be read or holds no
    ///   descriptor.
    fn extract_descriptor(&self, archive: &[u8]) -> NufeedResult<Vec<u8>>;
}

/// Reads the first `*.nuspec` entry of a zip archive.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipDescriptorExtractor;

impl DescriptorExtractor for ZipDescriptorExtractor {
    fn extract_descriptor(&self, archive: &[u8]) -> NufeedResult<Vec<u8>> {
        let malformed = |e: zip::result::ZipError| NufeedError::MalformedArchive(e.to_string());

        let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(malformed)?;
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(malformed)?;
            let is_descriptor = entry.is_file()
                && entry
                    .name()
                    .to_ascii_lowercase()
                    .ends_with(DESCRIPTOR_EXTENSION);
            if !is_descriptor {
                continue;
            }

            trace!(entry = entry.name(), "found package descriptor");
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut content)
                .map_err(|e| NufeedError::MalformedArchive(e.to_string()))?;
            return Ok(content);
        }

        Err(NufeedError::MalformedArchive(
            "archive contains no .nuspec descriptor".into(),
        ))
    }
}

/// Byte storage for package archives, keyed by identifier and version.
pub trait ArchiveStore: Send + Sync {
    fn exists(&self, id: &str, version: &str) -> bool;

    /// Opens the archive for streaming.
    fn open(&self, id: &str, version: &str) -> NufeedResult<Box<dyn Read + Send>>;

    fn write(&self, id: &str, version: &str, bytes: &[u8]) -> NufeedResult<()>;

    /// Removes the archive. Missing archives are not an error.
    fn delete(&self, id: &str, version: &str) -> NufeedResult<()>;

    /// Names of every stored archive, sorted.
    fn inventory(&self) -> NufeedResult<Vec<String>>;

    /// Reads a whole archive by the name [`ArchiveStore::inventory`] reported.
    fn read(&self, name: &str) -> NufeedResult<Vec<u8>>;
}

/// Archives stored as files in one directory.
#[derive(Debug, Clone)]
pub struct FsArchiveStore {
    root: PathBuf,
}

impl FsArchiveStore {
    /// Uses `root` as the archive directory, creating it when missing.
    pub fn new<P: AsRef<Path>>(root: P) -> NufeedResult<Self> {
        let root = root.as_ref().to_path_buf();
        ensure_dir_exists(&root)?;
        debug!(root = %root.display(), "using archive directory");
        Ok(Self {
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, id: &str, version: &str) -> PathBuf {
        self.root.join(archive_file_name(id, version))
    }
}

impl ArchiveStore for FsArchiveStore {
    fn exists(&self, id: &str, version: &str) -> bool {
        self.path_of(id, version).is_file()
    }

    fn open(&self, id: &str, version: &str) -> NufeedResult<Box<dyn Read + Send>> {
        let path = self.path_of(id, version);
        let file =
            File::open(&path).with_context(|| format!("opening archive {}", path.display()))?;
        Ok(Box::new(file))
    }

    fn write(&self, id: &str, version: &str, bytes: &[u8]) -> NufeedResult<()> {
        let path = self.path_of(id, version);
        write_atomic(&path, bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "stored archive");
        Ok(())
    }

    fn delete(&self, id: &str, version: &str) -> NufeedResult<()> {
        let path = self.path_of(id, version);
        safe_remove(&path)?;
        debug!(path = %path.display(), "removed archive");
        Ok(())
    }

    fn inventory(&self) -> NufeedResult<Vec<String>> {
        let files = files_with_extension(&self.root, ARCHIVE_EXTENSION)?;
        Ok(files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    fn read(&self, name: &str) -> NufeedResult<Vec<u8>> {
        let path = self.root.join(name);
        std::fs::read(&path).with_context(|| format!("reading archive {}", path.display()))
    }
}
