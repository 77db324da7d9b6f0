//! `.nuspec` descriptor parsing.
//!
//! The document is scanned as an XML event stream. Descriptive fields take the text of the
//! first element whose local name matches, ignoring case; dependency elements are folded
//! into the `Dependencies` encoding in document order. Unknown elements are skipped.

use std::fmt::Display;

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use tracing::trace;

use crate::{error::NufeedError, models::PackageRecord, NufeedResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

type FieldSetter = fn(&mut PackageRecord, String);

const DESCRIPTOR_FIELDS: &[(&str, FieldSetter)] = &[
    ("Id", |r, v| r.id = v),
    ("Version", |r, v| r.version = v),
    ("Title", |r, v| r.title = v),
    ("Authors", |r, v| r.authors = v),
    ("Owners", |r, v| r.owners = v),
    ("IconUrl", |r, v| r.icon_url = v),
    ("LicenseUrl", |r, v| r.license_url = v),
    ("ProjectUrl", |r, v| r.project_url = v),
    ("RequireLicenseAcceptance", |r, v| r.require_license_acceptance = v == "true"),
    ("DevelopmentDependency", |r, v| r.development_dependency = v == "true"),
    ("Description", |r, v| r.description = v),
    ("Summary", |r, v| r.summary = v),
    ("ReleaseNotes", |r, v| r.release_notes = v),
    ("Copyright", |r, v| r.copyright = v),
    ("Tags", |r, v| r.tags = v),
    ("MinClientVersion", |r, v| r.min_client_version = v),
    ("Language", |r, v| r.language = v),
];

fn invalid(err: impl Display) -> NufeedError {
    NufeedError::InvalidDescriptor(err.to_string())
}

fn field_index(name: &[u8]) -> Option<usize> {
    DESCRIPTOR_FIELDS
        .iter()
        .position(|(field, _)| field.as_bytes().eq_ignore_ascii_case(name))
}

fn attribute(element: &BytesStart, name: &[u8]) -> NufeedResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(invalid)?;
        if attr.key.local_name().as_ref().eq_ignore_ascii_case(name) {
            let value = attr.unescape_value().map_err(invalid)?;
            return Ok(Some(value.trim().to_string()));
        }
    }
    Ok(None)
}

/// Element whose text is being collected.
struct Capture {
    field: usize,
    depth: usize,
    text: String,
}

#[derive(Default)]
struct Scan {
    record: PackageRecord,
    seen: Vec<bool>,
    dependencies: Vec<String>,
    target_framework: Option<String>,
    metadata_min_client_version: Option<String>,
    capture: Option<Capture>,
    depth: usize,
    elements: usize,
}

impl Scan {
    fn new() -> Self {
        Self {
            seen: vec![false; DESCRIPTOR_FIELDS.len()],
            ..Default::default()
        }
    }

    fn open(&mut self, element: &BytesStart, empty: bool) -> NufeedResult<()> {
        self.elements += 1;
        let local = element.local_name();
        let name = local.as_ref();

        if name.eq_ignore_ascii_case(b"dependency") {
            self.add_dependency(element)?;
        } else if name.eq_ignore_ascii_case(b"group") {
            if !empty {
                self.target_framework = attribute(element, b"targetFramework")?;
            }
        } else if name.eq_ignore_ascii_case(b"metadata") {
            self.metadata_min_client_version = attribute(element, b"minClientVersion")?;
        } else if self.capture.is_none() {
            if let Some(field) = field_index(name).filter(|&field| !self.seen[field]) {
                if empty {
                    self.finish(field, String::new());
                } else {
                    self.capture = Some(Capture {
                        field,
                        depth: self.depth,
                        text: String::new(),
                    });
                }
            }
        }

        if !empty {
            self.depth += 1;
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> NufeedResult<()> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| invalid("unexpected closing tag"))?;

        if name.eq_ignore_ascii_case(b"group") {
            self.target_framework = None;
        }

        if self
            .capture
            .as_ref()
            .is_some_and(|capture| capture.depth == self.depth)
        {
            if let Some(capture) = self.capture.take() {
                self.finish(capture.field, capture.text);
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn finish(&mut self, field: usize, value: String) {
        let (name, setter) = DESCRIPTOR_FIELDS[field];
        trace!(field = name, value = %value, "descriptor field");
        setter(&mut self.record, value.trim().to_string());
        self.seen[field] = true;
    }

    fn add_dependency(&mut self, element: &BytesStart) -> NufeedResult<()> {
        let Some(id) = attribute(element, b"id")?.filter(|id| !id.is_empty()) else {
            return Ok(());
        };
        let version = attribute(element, b"version")?.unwrap_or_default();

        let encoded = match self.target_framework.as_deref() {
            Some(framework) => format!("{id}:{version}:{framework}"),
            None if version.is_empty() => format!("{id}:"),
            None => format!("{id}:{version}:"),
        };
        self.dependencies.push(encoded);
        Ok(())
    }

    fn into_record(mut self) -> PackageRecord {
        let attribute_value = self.metadata_min_client_version.take();
        if let (Some(value), Some(field)) = (attribute_value, field_index(b"MinClientVersion")) {
            if !self.seen[field] {
                self.record.min_client_version = value;
            }
        }
        self.record.dependencies = self.dependencies.join("|");
        self.record
    }
}

/// Parses descriptor bytes into a record skeleton.
///
/// Fields missing from the document keep their defaults, so a document without any known
/// element yields an all-default record. Only input that is not well-formed XML fails, with
/// [`NufeedError::InvalidDescriptor`].
pub fn parse_descriptor(bytes: &[u8]) -> NufeedResult<PackageRecord> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = Reader::from_reader(bytes);

    let mut scan = Scan::new();
    loop {
        match reader.read_event().map_err(invalid)? {
            Event::Start(element) => scan.open(&element, false)?,
            Event::Empty(element) => scan.open(&element, true)?,
            Event::End(element) => scan.close(element.local_name().as_ref())?,
            Event::Text(text) => scan.text(&text.unescape().map_err(invalid)?),
            Event::CData(data) => scan.text(&String::from_utf8_lossy(&data.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    if scan.elements == 0 {
        return Err(invalid("document contains no elements"));
    }
    if scan.depth != 0 {
        return Err(invalid("document ends inside an open element"));
    }

    Ok(scan.into_record())
}
