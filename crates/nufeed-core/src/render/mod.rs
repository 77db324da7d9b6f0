//! Feed rendering in the two wire representations.

mod json;
mod xml;

pub use json::render_json;
pub use xml::{render_service_document, render_xml, render_xml_at};

use crate::{models::PackageRecord, templates::FeedTemplates, NufeedResult};

pub const ODATA_PACKAGE_TYPE: &str = "NuGet.Server.DataServices.ODataPackage";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Wire representation of a feed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Atom,
    Json,
}

impl FeedFormat {
    /// Picks the representation from an `Accept` header. Atom is chosen only when the
    /// header names `application/atom+xml`.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(accept) if accept.to_ascii_lowercase().contains("application/atom+xml") => {
                Self::Atom
            }
            _ => Self::Json,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Atom => "application/atom+xml;charset=utf-8",
            Self::Json => "application/json;charset=utf-8",
        }
    }
}

/// Canonical entry URI: `<base>/Packages(Id='<id>',Version='<version>')`.
pub fn entry_uri(base_url: &str, record: &PackageRecord) -> String {
    format!(
        "{base_url}/Packages(Id='{}',Version='{}')",
        record.id, record.version
    )
}

/// Download URI: `<base>/package/<id>/<version>`.
pub fn media_uri(base_url: &str, record: &PackageRecord) -> String {
    format!("{base_url}/package/{}/{}", record.id, record.version)
}

/// Renders `records` in `format`. With `single` set, only the first record is rendered and
/// an empty input yields the empty or not-found document.
pub fn render(
    format: FeedFormat,
    templates: &FeedTemplates,
    records: &[PackageRecord],
    base_url: &str,
    single: bool,
) -> NufeedResult<String> {
    match format {
        FeedFormat::Atom => Ok(render_xml(templates, records, base_url, single)),
        FeedFormat::Json => render_json(records, base_url, single),
    }
}
