//! Package record model.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use nufeed_utils::hash::HASH_ALGORITHM;
use serde::{Deserialize, Serialize};

/// One row of the feed, identified by `(Id, Version)`.
///
/// `Id` compares case-insensitively, `Version` exactly. Field names serialize in the
/// PascalCase spelling gallery clients expect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageRecord {
    pub id: String,
    pub version: String,
    pub normalized_version: String,
    pub is_prerelease: bool,
    pub title: String,
    pub authors: String,
    pub owners: String,
    pub icon_url: String,
    pub license_url: String,
    pub project_url: String,
    pub download_count: u64,
    pub require_license_acceptance: bool,
    pub development_dependency: bool,
    pub description: String,
    pub summary: String,
    pub release_notes: String,
    #[serde(with = "odata_date")]
    pub published: DateTime<Utc>,
    #[serde(with = "odata_date")]
    pub last_updated: DateTime<Utc>,
    pub dependencies: String,
    pub package_hash_algorithm: String,
    pub package_hash: String,
    pub package_size: u64,
    pub copyright: String,
    pub tags: String,
    pub is_absolute_latest_version: bool,
    pub is_latest_version: bool,
    pub listed: bool,
    pub version_download_count: u64,
    pub min_client_version: String,
    pub language: String,
}

impl Default for PackageRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            version: String::new(),
            normalized_version: String::new(),
            is_prerelease: false,
            title: String::new(),
            authors: String::new(),
            owners: String::new(),
            icon_url: String::new(),
            license_url: String::new(),
            project_url: String::new(),
            download_count: 0,
            require_license_acceptance: false,
            development_dependency: false,
            description: String::new(),
            summary: String::new(),
            release_notes: String::new(),
            published: DateTime::<Utc>::UNIX_EPOCH,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            dependencies: String::new(),
            package_hash_algorithm: HASH_ALGORITHM.to_string(),
            package_hash: String::new(),
            package_size: 0,
            copyright: String::new(),
            tags: String::new(),
            is_absolute_latest_version: false,
            is_latest_version: false,
            listed: true,
            version_download_count: 0,
            min_client_version: String::new(),
            language: String::new(),
        }
    }
}

/// Case-insensitive identifier comparison.
pub fn ids_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Current instant truncated to millisecond precision, the resolution of both wire formats.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-01-02T03:04:05.678Z`.
pub fn iso_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl PackageRecord {
    pub fn has_id(&self, id: &str) -> bool {
        ids_match(&self.id, id)
    }

    pub fn is_identity(&self, id: &str, version: &str) -> bool {
        self.version == version && self.has_id(id)
    }

    /// Stamps `Published` and `LastUpdated` with the same instant.
    pub fn stamp(&mut self, instant: DateTime<Utc>) {
        self.published = instant;
        self.last_updated = instant;
    }
}

fn text(value: &str) -> String {
    value.to_string()
}

/// Accessor rendering one record field as text.
pub type FieldAccessor = fn(&PackageRecord) -> String;

/// Every record field in declaration order, keyed by its wire name.
pub const RECORD_FIELDS: &[(&str, FieldAccessor)] = &[
    ("Id", |r| text(&r.id)),
    ("Version", |r| text(&r.version)),
    ("NormalizedVersion", |r| text(&r.normalized_version)),
    ("IsPrerelease", |r| r.is_prerelease.to_string()),
    ("Title", |r| text(&r.title)),
    ("Authors", |r| text(&r.authors)),
    ("Owners", |r| text(&r.owners)),
    ("IconUrl", |r| text(&r.icon_url)),
    ("LicenseUrl", |r| text(&r.license_url)),
    ("ProjectUrl", |r| text(&r.project_url)),
    ("DownloadCount", |r| r.download_count.to_string()),
    ("RequireLicenseAcceptance", |r| r.require_license_acceptance.to_string()),
    ("DevelopmentDependency", |r| r.development_dependency.to_string()),
    ("Description", |r| text(&r.description)),
    ("Summary", |r| text(&r.summary)),
    ("ReleaseNotes", |r| text(&r.release_notes)),
    ("Published", |r| iso_timestamp(&r.published)),
    ("LastUpdated", |r| iso_timestamp(&r.last_updated)),
    ("Dependencies", |r| text(&r.dependencies)),
    ("PackageHashAlgorithm", |r| text(&r.package_hash_algorithm)),
    ("PackageHash", |r| text(&r.package_hash)),
    ("PackageSize", |r| r.package_size.to_string()),
    ("Copyright", |r| text(&r.copyright)),
    ("Tags", |r| text(&r.tags)),
    ("IsAbsoluteLatestVersion", |r| r.is_absolute_latest_version.to_string()),
    ("IsLatestVersion", |r| r.is_latest_version.to_string()),
    ("Listed", |r| r.listed.to_string()),
    ("VersionDownloadCount", |r| r.version_download_count.to_string()),
    ("MinClientVersion", |r| text(&r.min_client_version)),
    ("Language", |r| text(&r.language)),
];

/// Looks up a record field by wire name, case-insensitively.
pub fn field_value(record: &PackageRecord, name: &str) -> Option<String> {
    RECORD_FIELDS
        .iter()
        .find(|(field, _)| field.eq_ignore_ascii_case(name))
        .map(|(_, accessor)| accessor(record))
}

/// Serde adapter for the legacy `/Date(<ms since epoch>)/` encoding.
pub mod odata_date {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(instant: &DateTime<Utc>) -> String {
        format!("/Date({})/", instant.timestamp_millis())
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let millis = raw
            .trim()
            .strip_prefix("/Date(")?
            .strip_suffix(")/")?
            .parse::<i64>()
            .ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid OData date `{raw}`")))
    }
}
