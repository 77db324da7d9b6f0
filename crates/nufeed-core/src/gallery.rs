//! The feed facade used by front-ends.
//!
//! A [`Gallery`] owns the metadata store together with its collaborators (archive storage,
//! descriptor extraction, templates) and exposes the operations a gallery endpoint serves.

use std::{io::Read, sync::Mutex};

use nufeed_config::config::Config;
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::{
    archive::{archive_file_name, ArchiveStore, DescriptorExtractor, FsArchiveStore, ZipDescriptorExtractor},
    error::NufeedError,
    filter::{parse_entry_key, parse_find_by_id_argument, translate, ExtraFlags, QueryOptions},
    ingest::{commit, prepare, PreparedPackage},
    models::{now_millis, PackageRecord},
    render::{render, render_service_document, FeedFormat},
    store::MetadataStore,
    templates::FeedTemplates,
    NufeedResult,
};

/// A rendered feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub format: FeedFormat,
    pub body: String,
}

impl FeedResponse {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// An archive opened for download.
pub struct PackageDownload {
    /// The record after its counters were bumped.
    pub record: PackageRecord,
    pub file_name: String,
    pub reader: Box<dyn Read + Send>,
}

/// Parameters of a `Packages()` / `Search()` request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub filter: Option<String>,
    pub extra: ExtraFlags,
    pub options: QueryOptions,
}

/// Outcome of scanning the archive directory.
#[derive(Debug, Default)]
pub struct InventoryReport {
    pub added: Vec<PackageRecord>,
    pub already_known: usize,
    /// Archive name and reason for every archive that was skipped.
    pub failed: Vec<(String, String)>,
}

pub struct Gallery {
    store: MetadataStore,
    archives: Box<dyn ArchiveStore>,
    extractor: Box<dyn DescriptorExtractor>,
    templates: FeedTemplates,
    base_url: String,
    /// Held by every operation that changes both the store and the archive storage.
    archive_lock: Mutex<()>,
}

impl Gallery {
    pub fn new<A, E>(archives: A, extractor: E, templates: FeedTemplates, base_url: &str) -> Self
    where
        A: ArchiveStore + 'static,
        E: DescriptorExtractor + 'static,
    {
        Self {
            store: MetadataStore::new(),
            archives: Box::new(archives),
            extractor: Box::new(extractor),
            templates,
            base_url: base_url.trim_end_matches('/').to_string(),
            archive_lock: Mutex::new(()),
        }
    }

    /// Opens the gallery described by `config`: a directory of zip archives, optionally
    /// inventoried and reconciled right away.
    pub fn open(config: &Config) -> NufeedResult<Self> {
        let archives = FsArchiveStore::new(config.get_root_dir()?)?;
        let templates = FeedTemplates::load(config.get_templates_dir()?.as_deref())?;
        let gallery = Self::new(
            archives,
            ZipDescriptorExtractor,
            templates,
            &config.get_base_url()?,
        );

        if config.inventory_on_start() {
            let report = gallery.inventory()?;
            info!(
                added = report.added.len(),
                known = report.already_known,
                failed = report.failed.len(),
                "inventoried package archives"
            );
        }
        if config.reconcile_on_start() {
            gallery.reconcile()?;
        }

        Ok(gallery)
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn templates(&self) -> &FeedTemplates {
        &self.templates
    }

    fn respond(
        &self,
        format: FeedFormat,
        records: &[PackageRecord],
        single: bool,
    ) -> NufeedResult<FeedResponse> {
        Ok(FeedResponse {
            format,
            body: render(format, &self.templates, records, &self.base_url, single)?,
        })
    }

    /// Ingests an uploaded archive and stores its bytes as `<Id>.<Version>.nupkg`.
    ///
    /// If the archive cannot be stored the metadata change is rolled back. Publishes run
    /// one at a time from the commit to the archive write, so a rollback never replaces a
    /// record committed by a concurrent publish.
    pub fn publish(&self, archive: &[u8]) -> NufeedResult<PackageRecord> {
        let prepared = prepare(self.extractor.as_ref(), archive)?;
        let _guard = self.archive_lock.lock()?;
        let previous = self
            .store
            .find_by_id_and_version(prepared.id(), prepared.version())?;
        let record = commit(&self.store, prepared, now_millis())?;

        if let Err(err) = self.archives.write(&record.id, &record.version, archive) {
            error!(id = %record.id, version = %record.version, "failed to store archive: {err}");
            self.store.with_write(|table| {
                match previous {
                    Some(previous) => table.insert_or_replace(previous),
                    None => {
                        table.delete_by_id_and_version(&record.id, &record.version);
                    }
                }
                table.recompute_latest_flags(&record.id);
            })?;
            return Err(err);
        }

        if let Some(previous) = previous.filter(|previous| previous.id != record.id) {
            // Same identity under a different spelling leaves the old file behind.
            if let Err(err) = self.archives.delete(&previous.id, &previous.version) {
                warn!(id = %previous.id, version = %previous.version, "failed to remove replaced archive: {err}");
            }
        }

        Ok(record)
    }

    /// Opens an archive for download and bumps its counters.
    ///
    /// Unlisted packages stay downloadable. Returns `None` when the record or its archive
    /// is missing.
    pub fn download(&self, id: &str, version: &str) -> NufeedResult<Option<PackageDownload>> {
        let Some(record) = self.store.find_by_id_and_version(id, version)? else {
            return Ok(None);
        };
        if !self.archives.exists(&record.id, &record.version) {
            warn!(id = %record.id, version = %record.version, "archive missing for known package");
            return Ok(None);
        }

        let reader = self.archives.open(&record.id, &record.version)?;
        self.store.increment_download(&record.id, &record.version)?;
        let record = self
            .store
            .find_by_id_and_version(&record.id, &record.version)?
            .unwrap_or(record);

        Ok(Some(PackageDownload {
            file_name: archive_file_name(&record.id, &record.version),
            record,
            reader,
        }))
    }

    /// Renders one package entry. Unlisted packages are included.
    pub fn entry(&self, id: &str, version: &str, format: FeedFormat) -> NufeedResult<FeedResponse> {
        let records: Vec<_> = self
            .store
            .find_by_id_and_version(id, version)?
            .into_iter()
            .collect();
        self.respond(format, &records, true)
    }

    /// Renders the entry named by a `Packages(Id='x',Version='y')` key. A key that does not
    /// parse renders as not found.
    pub fn entry_by_key(&self, key: &str, format: FeedFormat) -> NufeedResult<FeedResponse> {
        match parse_entry_key(key)? {
            Some((id, version)) => self.entry(&id, &version, format),
            None => self.respond(format, &[], true),
        }
    }

    /// Renders every listed version of the package named by a `FindPackagesById()` argument.
    pub fn find_packages_by_id(&self, raw_id: &str, format: FeedFormat) -> NufeedResult<FeedResponse> {
        let id = parse_find_by_id_argument(raw_id)?.ok_or_else(|| {
            NufeedError::InternalFilterError("FindPackagesById requires an id".into())
        })?;
        let records = self.store.find_listed_by_id(&id)?;
        self.respond(format, &records, false)
    }

    /// Listed records matching a raw filter and standalone flags.
    pub fn query(&self, filter: Option<&str>, extra: ExtraFlags) -> NufeedResult<Vec<PackageRecord>> {
        let predicate = translate(filter, extra)?;
        self.store.query(&predicate)
    }

    /// Renders a `Packages()` or `Search()` listing.
    pub fn search(&self, request: &SearchRequest, format: FeedFormat) -> NufeedResult<FeedResponse> {
        let records = self.query(request.filter.as_deref(), request.extra)?;
        let records = request.options.apply(records);
        self.respond(format, &records, false)
    }

    pub fn unlist(&self, id: &str, version: &str) -> NufeedResult<bool> {
        self.store.set_listed(id, version, false)
    }

    pub fn relist(&self, id: &str, version: &str) -> NufeedResult<bool> {
        self.store.set_listed(id, version, true)
    }

    /// Removes a package record and its archive.
    pub fn delete(&self, id: &str, version: &str) -> NufeedResult<Option<PackageRecord>> {
        let _guard = self.archive_lock.lock()?;
        let Some(removed) = self.store.delete_by_id_and_version(id, version)? else {
            return Ok(None);
        };
        self.archives.delete(&removed.id, &removed.version)?;
        info!(id = %removed.id, version = %removed.version, "deleted package");
        Ok(Some(removed))
    }

    /// Ingests every stored archive the store does not know yet.
    ///
    /// Archives are prepared in parallel and committed one by one. Archives that fail to
    /// parse, or whose name is not `<Id>.<Version>.nupkg`, are reported and skipped.
    pub fn inventory(&self) -> NufeedResult<InventoryReport> {
        let names = self.archives.inventory()?;
        let prepared: Vec<(String, NufeedResult<PreparedPackage>)> = names
            .into_par_iter()
            .map(|name| {
                let result = self
                    .archives
                    .read(&name)
                    .and_then(|bytes| prepare(self.extractor.as_ref(), &bytes));
                (name, result)
            })
            .collect();

        let _guard = self.archive_lock.lock()?;
        let mut report = InventoryReport::default();
        for (name, result) in prepared {
            let prepared = match result {
                Ok(prepared) => prepared,
                Err(err) => {
                    warn!(archive = %name, "skipping archive: {err}");
                    report.failed.push((name, err.to_string()));
                    continue;
                }
            };

            let expected = archive_file_name(prepared.id(), prepared.version());
            if name != expected {
                warn!(archive = %name, expected = %expected, "skipping misnamed archive");
                report
                    .failed
                    .push((name, format!("archive should be named {expected}")));
                continue;
            }

            if self
                .store
                .find_by_id_and_version(prepared.id(), prepared.version())?
                .is_some()
            {
                report.already_known += 1;
                continue;
            }

            report
                .added
                .push(commit(&self.store, prepared, now_millis())?);
        }

        Ok(report)
    }

    /// Drops records whose archive no longer exists and returns them.
    pub fn reconcile(&self) -> NufeedResult<Vec<PackageRecord>> {
        let _guard = self.archive_lock.lock()?;
        let missing: Vec<PackageRecord> = self
            .store
            .find_all()?
            .into_iter()
            .filter(|record| !self.archives.exists(&record.id, &record.version))
            .collect();

        for record in &missing {
            self.store
                .delete_by_id_and_version(&record.id, &record.version)?;
            info!(id = %record.id, version = %record.version, "removed package with missing archive");
        }

        Ok(missing)
    }

    pub fn service_document(&self) -> String {
        render_service_document(&self.templates, &self.base_url)
    }

    pub fn metadata_document(&self) -> &str {
        &self.templates.metadata
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::{
            atomic::{AtomicBool, Ordering},
            mpsc,
        },
        thread,
        time::Duration,
    };

    use nufeed_utils::hash::digest_bytes;

    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::{nupkg, record, zip_archive};

    const BASE: &str = "http://localhost:5000/key/nuget";

    fn gallery() -> (TempDir, Gallery) {
        let dir = tempfile::tempdir().unwrap();
        let archives = FsArchiveStore::new(dir.path()).unwrap();
        let gallery = Gallery::new(
            archives,
            ZipDescriptorExtractor,
            FeedTemplates::builtin(),
            &format!("{BASE}/"),
        );
        (dir, gallery)
    }

    fn json(response: &FeedResponse) -> Value {
        assert_eq!(response.format, FeedFormat::Json);
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn test_publish_stores_record_and_archive() {
        let (dir, gallery) = gallery();
        let archive = nupkg("Foo", "1.0.0", "");

        let record = gallery.publish(&archive).unwrap();
        assert!(record.is_latest_version);
        assert_eq!(gallery.base_url(), BASE);
        assert_eq!(fs::read(dir.path().join("Foo.1.0.0.nupkg")).unwrap(), archive);
    }

    #[test]
    fn test_publish_rejects_bad_archives() {
        let (dir, gallery) = gallery();
        assert!(matches!(
            gallery.publish(b"not a zip"),
            Err(NufeedError::MalformedArchive(_))
        ));
        assert!(gallery.store().is_empty().unwrap());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    struct FailingArchives;

    impl ArchiveStore for FailingArchives {
        fn exists(&self, _: &str, _: &str) -> bool {
            false
        }

        fn open(&self, _: &str, _: &str) -> NufeedResult<Box<dyn Read + Send>> {
            Err(NufeedError::Custom("no archives".into()))
        }

        fn write(&self, _: &str, _: &str, _: &[u8]) -> NufeedResult<()> {
            Err(NufeedError::Custom("disk full".into()))
        }

        fn delete(&self, _: &str, _: &str) -> NufeedResult<()> {
            Ok(())
        }

        fn inventory(&self) -> NufeedResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn read(&self, _: &str) -> NufeedResult<Vec<u8>> {
            Err(NufeedError::Custom("no archives".into()))
        }
    }

    #[test]
    fn test_publish_rolls_back_when_archive_write_fails() {
        let gallery = Gallery::new(
            FailingArchives,
            ZipDescriptorExtractor,
            FeedTemplates::builtin(),
            BASE,
        );
        gallery
            .store()
            .with_write(|table| {
                let mut existing = record("Foo", "1.0.0");
                existing.is_latest_version = true;
                existing.is_absolute_latest_version = true;
                existing.description = "original".into();
                table.insert_or_replace(existing);
            })
            .unwrap();

        assert!(gallery.publish(&nupkg("Foo", "2.0.0", "")).is_err());
        assert!(gallery.publish(&nupkg("Foo", "1.0.0", "")).is_err());

        let records = gallery.store().find_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "original");
        assert!(records[0].is_latest_version);
    }

    /// Fails its first write once released; later writes succeed.
    struct GatedArchives {
        fail_next: AtomicBool,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ArchiveStore for GatedArchives {
        fn exists(&self, _: &str, _: &str) -> bool {
            true
        }

        fn open(&self, _: &str, _: &str) -> NufeedResult<Box<dyn Read + Send>> {
            Err(NufeedError::Custom("not readable".into()))
        }

        fn write(&self, _: &str, _: &str, _: &[u8]) -> NufeedResult<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
                return Err(NufeedError::Custom("disk full".into()));
            }
            Ok(())
        }

        fn delete(&self, _: &str, _: &str) -> NufeedResult<()> {
            Ok(())
        }

        fn inventory(&self) -> NufeedResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn read(&self, _: &str) -> NufeedResult<Vec<u8>> {
            Err(NufeedError::Custom("not readable".into()))
        }
    }

    #[test]
    fn test_failed_publish_keeps_concurrent_publish() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gallery = Gallery::new(
            GatedArchives {
                fail_next: AtomicBool::new(true),
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            },
            ZipDescriptorExtractor,
            FeedTemplates::builtin(),
            BASE,
        );
        let first = nupkg("Foo", "1.0.0", "<description>first</description>");
        let second = nupkg("Foo", "1.0.0", "<description>second</description>");

        thread::scope(|scope| {
            let failing = scope.spawn(|| gallery.publish(&first));
            entered_rx.recv().unwrap();
            let succeeding = scope.spawn(|| gallery.publish(&second));
            thread::sleep(Duration::from_millis(50));
            release_tx.send(()).unwrap();

            assert!(failing.join().unwrap().is_err());
            assert!(succeeding.join().unwrap().is_ok());
        });

        let stored = gallery
            .store()
            .find_by_id_and_version("Foo", "1.0.0")
            .unwrap()
            .unwrap();
        assert_eq!(stored.description, "second");
        assert_eq!(stored.package_hash, digest_bytes(&second));
        assert!(stored.is_latest_version);
    }

    #[test]
    fn test_download_counts_and_unlisted_access() {
        let (dir, gallery) = gallery();
        gallery.publish(&nupkg("Foo", "1.0.0", "")).unwrap();
        gallery.unlist("foo", "1.0.0").unwrap();

        let mut download = gallery.download("FOO", "1.0.0").unwrap().unwrap();
        assert_eq!(download.file_name, "Foo.1.0.0.nupkg");
        assert_eq!(download.record.download_count, 1);
        assert_eq!(download.record.version_download_count, 1);

        let mut bytes = Vec::new();
        download.reader.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, fs::read(dir.path().join("Foo.1.0.0.nupkg")).unwrap());

        assert!(gallery.download("Foo", "9.9.9").unwrap().is_none());
        fs::remove_file(dir.path().join("Foo.1.0.0.nupkg")).unwrap();
        assert!(gallery.download("Foo", "1.0.0").unwrap().is_none());
        let record = gallery.store().find_by_id_and_version("Foo", "1.0.0").unwrap().unwrap();
        assert_eq!(record.download_count, 1);
    }

    #[test]
    fn test_listings_hide_unlisted_packages() {
        let (_dir, gallery) = gallery();
        gallery.publish(&nupkg("Foo", "1.0.0", "")).unwrap();
        gallery.publish(&nupkg("Foo", "2.0.0", "")).unwrap();
        gallery.unlist("Foo", "2.0.0").unwrap();

        let found = json(&gallery.find_packages_by_id("'foo'", FeedFormat::Json).unwrap());
        let results = found["d"]["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["Version"], "1.0.0");
        assert_eq!(results[0]["IsLatestVersion"], false);

        let entry = json(&gallery.entry("foo", "2.0.0", FeedFormat::Json).unwrap());
        assert_eq!(entry["d"]["Listed"], false);
        assert_eq!(entry["d"]["IsLatestVersion"], true);

        gallery.relist("Foo", "2.0.0").unwrap();
        let found = json(&gallery.find_packages_by_id("Foo", FeedFormat::Json).unwrap());
        assert_eq!(found["d"]["results"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_query_matches_build_metadata_versions() {
        let (_dir, gallery) = gallery();
        gallery.publish(&nupkg("Foo", "1.0.0+build.5", "")).unwrap();

        let found = gallery
            .query(Some("Id='Foo' and Version='1.0.0+build.5'"), ExtraFlags::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].version, "1.0.0+build.5");

        let entry = gallery
            .entry_by_key("Packages(Id='Foo',Version='1.0.0%2Bbuild.5')", FeedFormat::Json)
            .unwrap();
        assert_eq!(json(&entry)["d"]["Version"], "1.0.0+build.5");
    }

    #[test]
    fn test_find_packages_by_id_requires_an_id() {
        let (_dir, gallery) = gallery();
        assert!(matches!(
            gallery.find_packages_by_id("''", FeedFormat::Json),
            Err(NufeedError::InternalFilterError(_))
        ));
    }

    #[test]
    fn test_search_with_filter_and_paging() {
        let (_dir, gallery) = gallery();
        for (id, version) in [("Foo", "1.0.0"), ("Foo", "2.0.0-beta"), ("Bar", "1.0.0")] {
            gallery.publish(&nupkg(id, version, "")).unwrap();
        }

        let request = SearchRequest {
            filter: Some("IsAbsoluteLatestVersion".into()),
            ..Default::default()
        };
        let found = json(&gallery.search(&request, FeedFormat::Json).unwrap());
        let versions: Vec<_> = found["d"]["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| format!("{}@{}", r["Id"].as_str().unwrap(), r["Version"].as_str().unwrap()))
            .collect();
        assert_eq!(versions, vec!["Foo@2.0.0-beta", "Bar@1.0.0"]);

        let request = SearchRequest {
            extra: ExtraFlags {
                latest_version: true,
                absolute_latest_version: false,
            },
            options: QueryOptions::from_params(Some("'foo'"), None, None).unwrap(),
            ..Default::default()
        };
        let found = json(&gallery.search(&request, FeedFormat::Json).unwrap());
        let results = found["d"]["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["Version"], "1.0.0");

        let request = SearchRequest {
            filter: Some("Id='Foo' and Id='Bar'".into()),
            ..Default::default()
        };
        assert!(matches!(
            gallery.search(&request, FeedFormat::Json),
            Err(NufeedError::InternalFilterError(_))
        ));
    }

    #[test]
    fn test_atom_entry_and_not_found() {
        let (_dir, gallery) = gallery();
        gallery.publish(&nupkg("Foo", "1.0.0", "")).unwrap();

        let entry = gallery
            .entry_by_key("Packages(Id='Foo',Version='1.0.0')", FeedFormat::Atom)
            .unwrap();
        assert_eq!(entry.content_type(), "application/atom+xml;charset=utf-8");
        assert!(entry.body.contains("<d:Id>Foo</d:Id>"));

        let missing = gallery
            .entry_by_key("Packages(Id='Nope',Version='1.0.0')", FeedFormat::Atom)
            .unwrap();
        assert_eq!(missing.body, gallery.templates().not_found);

        let garbage = gallery.entry_by_key("Packages()", FeedFormat::Json).unwrap();
        assert_eq!(garbage.body, r#"{"d":{}}"#);
    }

    #[test]
    fn test_delete_removes_record_and_archive() {
        let (dir, gallery) = gallery();
        gallery.publish(&nupkg("Foo", "1.0.0", "")).unwrap();
        gallery.publish(&nupkg("Foo", "2.0.0", "")).unwrap();

        let removed = gallery.delete("foo", "2.0.0").unwrap().unwrap();
        assert_eq!(removed.version, "2.0.0");
        assert!(!dir.path().join("Foo.2.0.0.nupkg").exists());
        assert!(gallery.delete("foo", "2.0.0").unwrap().is_none());

        let latest = gallery.store().find_by_latest("Foo").unwrap();
        assert_eq!(latest[0].version, "1.0.0");
    }

    #[test]
    fn test_inventory_ingests_unknown_archives() {
        let (dir, gallery) = gallery();
        gallery.publish(&nupkg("Known", "1.0.0", "")).unwrap();
        fs::write(dir.path().join("Foo.1.0.0.nupkg"), nupkg("Foo", "1.0.0", "")).unwrap();
        fs::write(dir.path().join("Foo.2.0.0.nupkg"), nupkg("Foo", "2.0.0", "")).unwrap();
        fs::write(dir.path().join("renamed.nupkg"), nupkg("Bar", "1.0.0", "")).unwrap();
        fs::write(
            dir.path().join("Broken.1.0.0.nupkg"),
            zip_archive(&[("readme.txt", b"no descriptor")]),
        )
        .unwrap();

        let report = gallery.inventory().unwrap();

        let mut added: Vec<_> = report
            .added
            .iter()
            .map(|r| format!("{}@{}", r.id, r.version))
            .collect();
        added.sort();
        assert_eq!(added, vec!["Foo@1.0.0", "Foo@2.0.0"]);
        assert_eq!(report.already_known, 1);
        let failed: Vec<_> = report.failed.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(failed, vec!["Broken.1.0.0.nupkg", "renamed.nupkg"]);

        let latest = gallery.store().find_by_latest("Foo").unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].version, "2.0.0");

        let again = gallery.inventory().unwrap();
        assert!(again.added.is_empty());
        assert_eq!(again.already_known, 3);
    }

    #[test]
    fn test_reconcile_drops_records_without_archive() {
        let (dir, gallery) = gallery();
        gallery.publish(&nupkg("Foo", "1.0.0", "")).unwrap();
        gallery.publish(&nupkg("Foo", "2.0.0", "")).unwrap();
        fs::remove_file(dir.path().join("Foo.2.0.0.nupkg")).unwrap();

        let removed = gallery.reconcile().unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].version, "2.0.0");

        let remaining = gallery.store().find_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_latest_version);
        assert!(remaining[0].is_absolute_latest_version);
    }

    #[test]
    fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("packages");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("Foo.1.0.0.nupkg"), nupkg("Foo", "1.0.0", "")).unwrap();

        let config = Config {
            root_dir: Some(root.to_string_lossy().into_owned()),
            base_url: Some("https://feed.example.com/nuget/".into()),
            templates_dir: None,
            inventory_on_start: Some(true),
            reconcile_on_start: Some(true),
        };
        let gallery = Gallery::open(&config).unwrap();

        assert_eq!(gallery.base_url(), "https://feed.example.com/nuget");
        assert_eq!(gallery.store().len().unwrap(), 1);
        assert!(gallery
            .service_document()
            .contains(r#"xml:base="https://feed.example.com/nuget/""#));
        assert!(gallery.metadata_document().contains("ODataPackage"));
    }
}
