use serde::Serialize;

use super::{entry_uri, media_uri, ARCHIVE_CONTENT_TYPE, ODATA_PACKAGE_TYPE};
use crate::{models::PackageRecord, NufeedResult};

#[derive(Serialize)]
struct EntryMetadata {
    uri: String,
    #[serde(rename = "type")]
    kind: &'static str,
    edit_media: String,
    media_src: String,
    content_type: &'static str,
}

#[derive(Serialize)]
struct ODataEntry<'a> {
    #[serde(rename = "__metadata")]
    metadata: EntryMetadata,
    #[serde(flatten)]
    record: &'a PackageRecord,
}

impl<'a> ODataEntry<'a> {
    fn new(base_url: &str, record: &'a PackageRecord) -> Self {
        let uri = entry_uri(base_url, record);
        Self {
            metadata: EntryMetadata {
                edit_media: format!("{uri}/$value"),
                uri,
                kind: ODATA_PACKAGE_TYPE,
                media_src: media_uri(base_url, record),
                content_type: ARCHIVE_CONTENT_TYPE,
            },
            record,
        }
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    d: T,
}

#[derive(Serialize)]
struct Results<T> {
    results: Vec<T>,
}

/// Renders the JSON envelope.
///
/// Lists render as `{"d":{"results":[...]}}`. With `single` set the first record renders as
/// `{"d":{...}}`, and no record as `{"d":{}}`. Dates use the `/Date(<ms>)/` encoding.
pub fn render_json(records: &[PackageRecord], base_url: &str, single: bool) -> NufeedResult<String> {
    let body = if !single {
        serde_json::to_string(&Envelope {
            d: Results {
                results: records
                    .iter()
                    .map(|record| ODataEntry::new(base_url, record))
                    .collect(),
            },
        })?
    } else {
        match records.first() {
            Some(record) => {
                serde_json::to_string(&Envelope {
                    d: ODataEntry::new(base_url, record),
                })?
            }
            None => {
                serde_json::to_string(&Envelope {
                    d: serde_json::Map::new(),
                })?
            }
        }
    };

    Ok(body)
}
