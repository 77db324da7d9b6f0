use std::io::{Cursor, Write};

use zip::{write::SimpleFileOptions, ZipWriter};

use crate::{models::PackageRecord, version};

pub fn record(id: &str, version: &str) -> PackageRecord {
    PackageRecord {
        id: id.to_string(),
        version: version.to_string(),
        normalized_version: version::normalize(version),
        is_prerelease: version::is_prerelease(version),
        ..Default::default()
    }
}

pub fn nuspec(id: &str, version: &str, metadata: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <authors>nufeed tests</authors>
    {metadata}
  </metadata>
</package>"#
    )
}

/// Builds a zip archive holding the given entries.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Builds a package archive for `id`/`version` with extra descriptor metadata.
pub fn nupkg(id: &str, version: &str, metadata: &str) -> Vec<u8> {
    let descriptor = nuspec(id, version, metadata);
    zip_archive(&[
        ("_rels/.rels", b"<Relationships/>"),
        (&format!("{id}.nuspec"), descriptor.as_bytes()),
        ("lib/net6.0/placeholder.dll", b"\0\0"),
    ])
}
