//! In-memory package metadata store.
//!
//! Records live in insertion order inside a [`PackageTable`]. The [`MetadataStore`] guards
//! the table with a single `RwLock`: reads clone a snapshot under the read lock, every
//! mutation runs under the write lock.

use std::sync::RwLock;

use tracing::debug;

use crate::{
    error::NufeedError,
    filter::Predicate,
    models::{ids_match, PackageRecord},
    version::{resolve_latest, LatestVersions},
    NufeedResult,
};

/// Ordered collection of records keyed by `(Id, Version)`.
///
/// All lookups are linear scans and treat `Id` case-insensitively. A missing identifier
/// yields an empty result.
#[derive(Debug, Default, Clone)]
pub struct PackageTable {
    records: Vec<PackageRecord>,
}

impl PackageTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str, version: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.is_identity(id, version))
    }

    /// Replaces the record with the same identity in place, or appends it.
    pub fn insert_or_replace(&mut self, record: PackageRecord) {
        match self.position(&record.id, &record.version) {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
    }

    pub fn find_all(&self) -> &[PackageRecord] {
        &self.records
    }

    pub fn find_by_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a PackageRecord> {
        self.records.iter().filter(move |record| record.has_id(id))
    }

    /// Direct lookup; unlisted records are included.
    pub fn find_by_id_and_version(&self, id: &str, version: &str) -> Option<&PackageRecord> {
        self.records
            .iter()
            .find(|record| record.is_identity(id, version))
    }

    pub fn find_listed_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a PackageRecord> {
        self.find_by_id(id).filter(|record| record.listed)
    }

    pub fn find_by_absolute_latest<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a PackageRecord> {
        self.find_by_id(id)
            .filter(|record| record.is_absolute_latest_version)
    }

    pub fn find_by_latest<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a PackageRecord> {
        self.find_by_id(id).filter(|record| record.is_latest_version)
    }

    /// Listed records matching `predicate`, in insertion order.
    pub fn query<'a>(
        &'a self,
        predicate: &'a Predicate,
    ) -> impl Iterator<Item = &'a PackageRecord> {
        self.records
            .iter()
            .filter(move |record| record.listed && predicate.matches(record))
    }

    /// Versions stored for `id`, in insertion order.
    pub fn versions_of(&self, id: &str) -> Vec<String> {
        self.find_by_id(id)
            .map(|record| record.version.clone())
            .collect()
    }

    /// Distinct identifiers, keeping the spelling of the first record seen.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for record in &self.records {
            if !ids.iter().any(|id| ids_match(id, &record.id)) {
                ids.push(record.id.clone());
            }
        }
        ids
    }

    /// Recomputes `IsLatestVersion` and `IsAbsoluteLatestVersion` for every record of `id`.
    ///
    /// Unlisted records take part in the computation. Calling it repeatedly is harmless.
    pub fn recompute_latest_flags(&mut self, id: &str) -> LatestVersions {
        let latest = resolve_latest(self.find_by_id(id).map(|record| record.version.as_str()));

        for record in self.records.iter_mut().filter(|record| record.has_id(id)) {
            record.is_latest_version = latest.is_latest(&record.version);
            record.is_absolute_latest_version = latest.is_absolute_latest(&record.version);
        }

        debug!(
            id,
            latest = latest.latest.as_deref().unwrap_or("-"),
            absolute_latest = latest.absolute_latest.as_deref().unwrap_or("-"),
            "recomputed latest flags"
        );
        latest
    }

    /// Bumps both download counters of one record. Returns `false` when it does not exist.
    pub fn increment_download(&mut self, id: &str, version: &str) -> bool {
        match self.position(id, version) {
            Some(index) => {
                let record = &mut self.records[index];
                record.download_count += 1;
                record.version_download_count += 1;
                true
            }
            None => false,
        }
    }

    /// Flips the `Listed` flag. Returns `false` when the record does not exist.
    pub fn set_listed(&mut self, id: &str, version: &str, listed: bool) -> bool {
        match self.position(id, version) {
            Some(index) => {
                self.records[index].listed = listed;
                true
            }
            None => false,
        }
    }

    /// Removes one record. Callers recompute the flags of `id` afterwards.
    pub fn delete_by_id_and_version(&mut self, id: &str, version: &str) -> Option<PackageRecord> {
        self.position(id, version)
            .map(|index| self.records.remove(index))
    }
}

/// Shared handle on the package table.
#[derive(Debug, Default)]
pub struct MetadataStore {
    table: RwLock<PackageTable>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` under the read lock.
    pub fn with_read<F, T>(&self, f: F) -> NufeedResult<T>
    where
        F: FnOnce(&PackageTable) -> T,
    {
        let table = self.table.read().map_err(|_| NufeedError::PoisonError)?;
        Ok(f(&table))
    }

    /// Runs `f` under the write lock.
    pub fn with_write<F, T>(&self, f: F) -> NufeedResult<T>
    where
        F: FnOnce(&mut PackageTable) -> T,
    {
        let mut table = self.table.write().map_err(|_| NufeedError::PoisonError)?;
        Ok(f(&mut table))
    }

    pub fn len(&self) -> NufeedResult<usize> {
        self.with_read(PackageTable::len)
    }

    pub fn is_empty(&self) -> NufeedResult<bool> {
        self.with_read(PackageTable::is_empty)
    }

    pub fn insert_or_replace(&self, record: PackageRecord) -> NufeedResult<()> {
        self.with_write(|table| table.insert_or_replace(record))
    }

    pub fn find_all(&self) -> NufeedResult<Vec<PackageRecord>> {
        self.with_read(|table| table.find_all().to_vec())
    }

    pub fn find_by_id(&self, id: &str) -> NufeedResult<Vec<PackageRecord>> {
        self.with_read(|table| table.find_by_id(id).cloned().collect())
    }

    pub fn find_by_id_and_version(
        &self,
        id: &str,
        version: &str,
    ) -> NufeedResult<Option<PackageRecord>> {
        self.with_read(|table| table.find_by_id_and_version(id, version).cloned())
    }

    pub fn find_listed_by_id(&self, id: &str) -> NufeedResult<Vec<PackageRecord>> {
        self.with_read(|table| table.find_listed_by_id(id).cloned().collect())
    }

    pub fn find_by_absolute_latest(&self, id: &str) -> NufeedResult<Vec<PackageRecord>> {
        self.with_read(|table| table.find_by_absolute_latest(id).cloned().collect())
    }

    pub fn find_by_latest(&self, id: &str) -> NufeedResult<Vec<PackageRecord>> {
        self.with_read(|table| table.find_by_latest(id).cloned().collect())
    }

    pub fn query(&self, predicate: &Predicate) -> NufeedResult<Vec<PackageRecord>> {
        self.with_read(|table| table.query(predicate).cloned().collect())
    }

    pub fn ids(&self) -> NufeedResult<Vec<String>> {
        self.with_read(PackageTable::ids)
    }

    pub fn recompute_latest_flags(&self, id: &str) -> NufeedResult<LatestVersions> {
        self.with_write(|table| table.recompute_latest_flags(id))
    }

    pub fn increment_download(&self, id: &str, version: &str) -> NufeedResult<bool> {
        self.with_write(|table| table.increment_download(id, version))
    }

    /// Lists or unlists a record and recomputes the flags of its identifier.
    pub fn set_listed(&self, id: &str, version: &str, listed: bool) -> NufeedResult<bool> {
        self.with_write(|table| {
            let found = table.set_listed(id, version, listed);
            if found {
                table.recompute_latest_flags(id);
            }
            found
        })
    }

    /// Removes a record and recomputes the flags of its identifier in the same critical
    /// section.
    pub fn delete_by_id_and_version(
        &self,
        id: &str,
        version: &str,
    ) -> NufeedResult<Option<PackageRecord>> {
        self.with_write(|table| {
            let removed = table.delete_by_id_and_version(id, version);
            if removed.is_some() {
                table.recompute_latest_flags(id);
            }
            removed
        })
    }
}
