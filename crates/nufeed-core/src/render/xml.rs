//! Atom rendering from text templates.
//!
//! A placeholder is `@` followed by a name, optionally continued by `-` or `.` separated
//! parts. Known names are replaced by their escaped value and keep the continuation, so
//! `@Id.@Version.nupkg` works. Unknown placeholders are removed together with their
//! continuation, so `@Foo-Bar` leaves nothing behind. Expansion is a single pass over the
//! template: `@` inside substituted values (author emails, URLs) is never touched, and a
//! bare `@` not followed by a name stays as is.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use regex::{Captures, Regex};

use crate::{
    models::{field_value, iso_timestamp, now_millis, PackageRecord},
    templates::FeedTemplates,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>"#;

/// Replaces every `@Name` token in one pass. Tokens `lookup` does not know become empty.
fn expand<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)((?:[.\-][A-Za-z0-9_]*)*)").unwrap()
    });

    re.replace_all(template, |caps: &Captures| {
        match lookup(&caps[1]) {
            Some(value) => format!("{}{}", escape(value.as_str()), &caps[2]),
            None => String::new(),
        }
    })
    .into_owned()
}

fn render_entry(template: &str, record: &PackageRecord, base_url: &str) -> String {
    expand(template, |name| {
        if name.eq_ignore_ascii_case("baseUrl") {
            Some(base_url.to_string())
        } else {
            field_value(record, name)
        }
    })
}

fn render_feed_chrome(template: &str, base_url: &str, updated: &str) -> String {
    expand(template, |name| {
        if name.eq_ignore_ascii_case("baseUrl") {
            Some(base_url.to_string())
        } else if name.eq_ignore_ascii_case("date") {
            Some(updated.to_string())
        } else {
            None
        }
    })
}

/// Renders the Atom feed, stamping the feed header with `updated`.
///
/// See [`render_xml`].
pub fn render_xml_at(
    templates: &FeedTemplates,
    records: &[PackageRecord],
    base_url: &str,
    single: bool,
    updated: DateTime<Utc>,
) -> String {
    if single {
        return match records.first() {
            Some(record) => {
                format!(
                    "{XML_DECLARATION}{}",
                    render_entry(&templates.entry, record, base_url)
                )
            }
            None => templates.not_found.clone(),
        };
    }

    let updated = iso_timestamp(&updated);
    let mut feed = render_feed_chrome(&templates.header, base_url, &updated);
    for record in records {
        feed.push_str(&render_entry(&templates.entry, record, base_url));
    }
    feed.push_str(&render_feed_chrome(&templates.footer, base_url, &updated));
    feed
}

/// Renders the Atom feed.
///
/// Lists render as header, one entry per record, footer. With `single` set the first
/// record renders as a standalone entry document, and no record yields the not-found
/// document verbatim. Entry values are XML-escaped and dates use ISO-8601 with
/// milliseconds.
pub fn render_xml(
    templates: &FeedTemplates,
    records: &[PackageRecord],
    base_url: &str,
    single: bool,
) -> String {
    render_xml_at(templates, records, base_url, single, now_millis())
}

/// Renders the service document for `base_url`.
pub fn render_service_document(templates: &FeedTemplates, base_url: &str) -> String {
    render_feed_chrome(&templates.service, base_url, "")
}
