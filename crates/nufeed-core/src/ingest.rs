//! Ingestion of package archives into the metadata store.
//!
//! Ingestion is split in two. [`prepare`] extracts and parses the descriptor, hashes the
//! archive and classifies the version without touching the store, so it can run in
//! parallel. [`commit`] resolves the latest-version flags and inserts the record inside one
//! write-locked section of the store.

use chrono::{DateTime, Utc};
use nufeed_utils::hash::digest_bytes;
use tracing::{debug, info};

use crate::{
    archive::DescriptorExtractor,
    descriptor::parse_descriptor,
    error::NufeedError,
    models::{now_millis, PackageRecord},
    store::MetadataStore,
    version::{is_prerelease, normalize, resolve_latest},
    NufeedResult,
};

/// A parsed and fingerprinted archive that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPackage {
    record: PackageRecord,
}

impl PreparedPackage {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn version(&self) -> &str {
        &self.record.version
    }

    pub fn record(&self) -> &PackageRecord {
        &self.record
    }
}

/// Identifiers and versions end up in archive file names, so anything that could escape the
/// archive directory is rejected.
fn validate_identity_part(kind: &str, value: &str) -> NufeedResult<()> {
    if value.is_empty() {
        return Err(NufeedError::InvalidDescriptor(format!(
            "descriptor does not declare a {kind}"
        )));
    }
    let unsafe_char = value
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control());
    if unsafe_char || value == "." || value == ".." {
        return Err(NufeedError::InvalidDescriptor(format!(
            "{kind} `{value}` contains characters that are not allowed"
        )));
    }
    Ok(())
}

/// Extracts, parses, hashes and classifies an archive.
///
/// # Errors
///
/// * [`NufeedError::MalformedArchive`] if no descriptor can be extracted.
/// * [`NufeedError::InvalidDescriptor`] if the descriptor is not well-formed or lacks an
///   identifier or version.
pub fn prepare(
    extractor: &dyn DescriptorExtractor,
    archive: &[u8],
) -> NufeedResult<PreparedPackage> {
    let descriptor = extractor.extract_descriptor(archive)?;
    let mut record = parse_descriptor(&descriptor)?;

    validate_identity_part("package id", &record.id)?;
    validate_identity_part("version", &record.version)?;

    record.package_hash = digest_bytes(archive);
    record.package_size = archive.len() as u64;
    record.is_prerelease = is_prerelease(&record.version);
    record.normalized_version = normalize(&record.version);

    debug!(
        id = %record.id,
        version = %record.version,
        size = record.package_size,
        "prepared package"
    );
    Ok(PreparedPackage {
        record,
    })
}

/// Stores a prepared package stamped with `now` and recomputes the flags of its identifier.
///
/// An existing record with the same identity is replaced in place. Returns the record as
/// stored.
pub fn commit(
    store: &MetadataStore,
    prepared: PreparedPackage,
    now: DateTime<Utc>,
) -> NufeedResult<PackageRecord> {
    let mut record = prepared.record;

    let stored = store.with_write(|table| {
        let mut versions = table.versions_of(&record.id);
        versions.retain(|version| version != &record.version);
        versions.push(record.version.clone());

        let latest = resolve_latest(versions.iter().map(String::as_str));
        record.is_latest_version = latest.is_latest(&record.version);
        record.is_absolute_latest_version = latest.is_absolute_latest(&record.version);
        record.stamp(now);

        let (id, version) = (record.id.clone(), record.version.clone());
        table.insert_or_replace(record);
        table.recompute_latest_flags(&id);
        table.find_by_id_and_version(&id, &version).cloned()
    })?;

    let stored = stored.ok_or_else(|| {
        NufeedError::Custom("package vanished from the store during ingestion".into())
    })?;

    info!(
        id = %stored.id,
        version = %stored.version,
        latest = stored.is_latest_version,
        absolute_latest = stored.is_absolute_latest_version,
        "ingested package"
    );
    Ok(stored)
}

/// Ingests archive bytes into `store`.
pub fn ingest(
    store: &MetadataStore,
    extractor: &dyn DescriptorExtractor,
    archive: &[u8],
) -> NufeedResult<PackageRecord> {
    let prepared = prepare(extractor, archive)?;
    commit(store, prepared, now_millis())
}
