//! Translation of the small `$filter` grammar gallery clients send.
//!
//! Recognized clauses are equality tests on `Id`, `Version`, `LatestVersion` and
//! `AbsoluteLatestVersion`, joined by `and`. Keys are case-insensitive, the flag keys may
//! carry an `Is` prefix, `eq` may replace `=`, and a bare flag key means `true`. Anything
//! else is ignored.
//!
//! Query-string values (`$filter`, `searchTerm`, the `FindPackagesById` argument) arrive
//! already decoded and are used as given, so a literal `+` such as build metadata in
//! `1.0.0+build.5` survives. Only entry keys, which travel in the URL path, are
//! percent-decoded here.

use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::trace;

use crate::{
    error::NufeedError,
    models::{ids_match, PackageRecord},
    NufeedResult,
};

/// Structured lookup produced from a filter. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    pub id: Option<String>,
    pub version: Option<String>,
    pub is_latest_version: Option<bool>,
    pub is_absolute_latest_version: Option<bool>,
}

impl Predicate {
    /// Predicate matching every record of `id`.
    pub fn for_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &PackageRecord) -> bool {
        self.id.as_deref().is_none_or(|id| ids_match(id, &record.id))
            && self
                .version
                .as_deref()
                .is_none_or(|version| version == record.version)
            && self
                .is_latest_version
                .is_none_or(|flag| flag == record.is_latest_version)
            && self
                .is_absolute_latest_version
                .is_none_or(|flag| flag == record.is_absolute_latest_version)
    }
}

/// Flags passed as standalone query parameters. Presence means `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtraFlags {
    pub latest_version: bool,
    pub absolute_latest_version: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Id,
    Version,
    LatestVersion,
    AbsoluteLatestVersion,
}

impl Attribute {
    fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "version" => Some(Self::Version),
            "latestversion" => Some(Self::LatestVersion),
            "absolutelatestversion" => Some(Self::AbsoluteLatestVersion),
            _ => None,
        }
    }
}

fn filter_error(message: impl Into<String>) -> NufeedError {
    NufeedError::InternalFilterError(message.into())
}

/// Percent-decodes a URL path segment. `+` is kept as is.
pub fn decode_path_segment(raw: &str) -> NufeedResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|err| filter_error(format!("`{raw}` is not valid UTF-8 after decoding: {err}")))
}

/// Strips surrounding single quotes and undoes `''` escaping.
fn unquote(literal: &str) -> String {
    let literal = literal.trim();
    literal
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(literal)
        .replace("''", "'")
}

fn strip_parentheses(mut clause: &str) -> &str {
    loop {
        let trimmed = clause.trim();
        match trimmed
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
        {
            Some(inner) => clause = inner,
            None => return trimmed,
        }
    }
}

fn clause_parts(clause: &str) -> Option<(Attribute, Option<String>)> {
    static CLAUSE_RE: OnceLock<Regex> = OnceLock::new();
    let re = CLAUSE_RE.get_or_init(|| {
        Regex::new(
            r"(?ix)^
            (?:tolower\(\s*)?                                       # optional tolower( wrapper
            (?:is)?(?P<key>id|version|latestversion|absolutelatestversion)
            \s*\)?\s*
            (?:(?:=|eq\b)\s*(?P<value>'(?:[^']|'')*'|true|false))?  # optional comparison
            $",
        )
        .unwrap()
    });

    let caps = re.captures(clause)?;
    let attribute = Attribute::parse(caps.name("key")?.as_str())?;
    Some((attribute, caps.name("value").map(|m| unquote(m.as_str()))))
}

fn split_clauses(filter: &str) -> impl Iterator<Item = &str> {
    static AND_RE: OnceLock<Regex> = OnceLock::new();
    let re = AND_RE.get_or_init(|| Regex::new(r"(?i)\s+and\s+").unwrap());
    re.split(filter)
}

fn set_once<T, F>(slot: &mut Option<T>, value: T, same: F, name: &str) -> NufeedResult<()>
where
    T: std::fmt::Debug,
    F: Fn(&T, &T) -> bool,
{
    match slot {
        Some(existing) if !same(existing, &value) => {
            Err(filter_error(format!(
                "conflicting values for {name}: {existing:?} and {value:?}"
            )))
        }
        Some(_) => Ok(()),
        None => {
            *slot = Some(value);
            Ok(())
        }
    }
}

/// Translates a decoded `$filter` value plus standalone flags into a [`Predicate`].
///
/// A missing or empty filter yields the unrestricted predicate. Unrecognized clauses are
/// skipped. Two clauses giving different values for one attribute fail with
/// [`NufeedError::InternalFilterError`].
///
/// ```
/// use nufeed_core::filter::{translate, ExtraFlags};
///
/// let predicate = translate(Some("Id='Foo' and IsLatestVersion"), ExtraFlags::default()).unwrap();
/// assert_eq!(predicate.id.as_deref(), Some("Foo"));
/// assert_eq!(predicate.is_latest_version, Some(true));
/// ```
pub fn translate(raw_filter: Option<&str>, extra: ExtraFlags) -> NufeedResult<Predicate> {
    let mut predicate = Predicate::default();

    if let Some(filter) = raw_filter {
        for clause in split_clauses(filter.trim()) {
            let clause = strip_parentheses(clause);
            if clause.is_empty() {
                continue;
            }
            let Some((attribute, value)) = clause_parts(clause) else {
                trace!(clause, "ignoring unsupported filter clause");
                continue;
            };

            match (attribute, value) {
                (Attribute::Id, Some(id)) => {
                    set_once(&mut predicate.id, id, |a, b| ids_match(a, b), "Id")?
                }
                (Attribute::Version, Some(version)) => {
                    set_once(&mut predicate.version, version, |a, b| a == b, "Version")?
                }
                (Attribute::LatestVersion, value) => {
                    set_once(
                        &mut predicate.is_latest_version,
                        flag_value(value.as_deref()),
                        |a, b| a == b,
                        "LatestVersion",
                    )?
                }
                (Attribute::AbsoluteLatestVersion, value) => {
                    set_once(
                        &mut predicate.is_absolute_latest_version,
                        flag_value(value.as_deref()),
                        |a, b| a == b,
                        "AbsoluteLatestVersion",
                    )?
                }
                (_, None) => trace!(clause, "ignoring filter clause without a value"),
            }
        }
    }

    if extra.latest_version {
        predicate.is_latest_version = Some(true);
    }
    if extra.absolute_latest_version {
        predicate.is_absolute_latest_version = Some(true);
    }

    Ok(predicate)
}

fn flag_value(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.eq_ignore_ascii_case("true"))
}

/// Search and paging applied after the predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub search_term: Option<String>,
    pub skip: usize,
    pub top: Option<usize>,
}

impl QueryOptions {
    /// Builds options from raw query parameters. `searchTerm` may be quoted.
    pub fn from_params(
        search_term: Option<&str>,
        skip: Option<&str>,
        top: Option<&str>,
    ) -> NufeedResult<Self> {
        let search_term = search_term
            .map(unquote)
            .filter(|term| !term.trim().is_empty());

        let number = |raw: Option<&str>, name: &str| -> NufeedResult<Option<usize>> {
            raw.map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| filter_error(format!("{name} must be a non-negative integer")))
            })
            .transpose()
        };

        Ok(Self {
            search_term,
            skip: number(skip, "$skip")?.unwrap_or(0),
            top: number(top, "$top")?,
        })
    }

    fn matches_search(&self, record: &PackageRecord) -> bool {
        let Some(term) = self.search_term.as_deref() else {
            return true;
        };
        let term = term.trim().to_lowercase();
        [
            &record.id,
            &record.title,
            &record.description,
            &record.tags,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }

    pub fn apply(&self, records: Vec<PackageRecord>) -> Vec<PackageRecord> {
        let matching = records
            .into_iter()
            .filter(|record| self.matches_search(record))
            .skip(self.skip);

        match self.top {
            Some(top) => matching.take(top).collect(),
            None => matching.collect(),
        }
    }
}

/// Extracts the identifier from a `FindPackagesById()?id='x'` argument.
pub fn parse_find_by_id_argument(raw: &str) -> NufeedResult<Option<String>> {
    let id = raw.replace('\'', "");
    let id = id.trim();
    Ok((!id.is_empty()).then(|| id.to_string()))
}

/// Parses an entry key such as `Packages(Id='Foo',Version='1.0.0')` or `Id='Foo',Version='1.0.0'`.
pub fn parse_entry_key(raw: &str) -> NufeedResult<Option<(String, String)>> {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    let re = KEY_RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:packages)?\(?\s*id\s*=\s*(?P<id>'(?:[^']|'')*')\s*,\s*version\s*=\s*(?P<version>'(?:[^']|'')*')\s*\)?$",
        )
        .unwrap()
    });

    let decoded = decode_path_segment(raw)?;
    let Some(caps) = re.captures(decoded.trim()) else {
        return Ok(None);
    };

    let id = unquote(&caps["id"]);
    let version = unquote(&caps["version"]);
    if id.is_empty() || version.is_empty() {
        return Ok(None);
    }
    Ok(Some((id, version)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    fn parse(filter: &str) -> Predicate {
        translate(Some(filter), ExtraFlags::default()).unwrap()
    }

    #[test]
    fn test_no_filter_matches_everything() {
        let predicate = translate(None, ExtraFlags::default()).unwrap();
        assert!(predicate.is_unrestricted());
        assert!(predicate.matches(&record("Anything", "0.0.1")));
        assert!(parse("   ").is_unrestricted());
    }

    #[test]
    fn test_id_match_is_case_insensitive() {
        let predicate = parse("Id='Foo'");
        assert!(predicate.matches(&record("foo", "1.0.0")));
        assert!(!predicate.matches(&record("foobar", "1.0.0")));
    }

    #[test]
    fn test_clause_spellings() {
        let expected = Predicate {
            id: Some("Foo".into()),
            version: Some("1.0.0".into()),
            is_latest_version: Some(true),
            is_absolute_latest_version: Some(false),
        };

        assert_eq!(
            parse("Id='Foo' and Version='1.0.0' and LatestVersion=true and AbsoluteLatestVersion=false"),
            expected
        );
        assert_eq!(
            parse("(id eq 'Foo') AND (version eq '1.0.0') and IsLatestVersion and IsAbsoluteLatestVersion eq false"),
            expected
        );
        assert_eq!(
            parse("tolower(Id) eq 'Foo' and Version='1.0.0' and islatestversion and ISABSOLUTELATESTVERSION=FALSE"),
            expected
        );
    }

    #[test]
    fn test_unrecognized_content_is_ignored() {
        let predicate = parse("substringof('json',tolower(Id)) and Id='Foo' and Downloads gt 10");
        assert_eq!(predicate, Predicate::for_id("Foo"));
    }

    #[test]
    fn test_escaped_quotes_in_literals() {
        assert_eq!(parse("Id='O''Brien'").id.as_deref(), Some("O'Brien"));
    }

    #[test]
    fn test_extra_flags_take_precedence() {
        let extra = ExtraFlags {
            latest_version: true,
            absolute_latest_version: false,
        };
        let predicate = translate(Some("LatestVersion=false"), extra).unwrap();
        assert_eq!(predicate.is_latest_version, Some(true));
        assert_eq!(predicate.is_absolute_latest_version, None);

        let predicate = translate(None, extra).unwrap();
        assert_eq!(predicate.is_latest_version, Some(true));
    }

    #[test]
    fn test_conflicting_clauses_fail() {
        for filter in [
            "Id='Foo' and Id='Bar'",
            "Version='1.0' and Version='1.0.0'",
            "IsLatestVersion and LatestVersion=false",
        ] {
            assert!(
                matches!(
                    translate(Some(filter), ExtraFlags::default()),
                    Err(NufeedError::InternalFilterError(_))
                ),
                "{filter} should conflict"
            );
        }

        assert_eq!(parse("Id='Foo' and id='FOO'").id.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_filter_literals_are_not_decoded_again() {
        let predicate = parse("Id='Foo' and Version='1.0.0+build.5'");
        assert_eq!(predicate.version.as_deref(), Some("1.0.0+build.5"));
        assert!(predicate.matches(&record("Foo", "1.0.0+build.5")));

        assert_eq!(parse("Id='100%25'").id.as_deref(), Some("100%25"));
    }

    #[test]
    fn test_invalid_percent_encoding_in_entry_key_fails() {
        assert!(matches!(
            parse_entry_key("Packages(Id='%FF',Version='1.0')"),
            Err(NufeedError::InternalFilterError(_))
        ));
    }

    #[test]
    fn test_flag_predicates() {
        let mut latest = record("Foo", "1.0.0");
        latest.is_latest_version = true;
        let older = record("Foo", "0.9.0");

        let predicate = parse("IsLatestVersion");
        assert!(predicate.matches(&latest));
        assert!(!predicate.matches(&older));

        let predicate = parse("LatestVersion=false");
        assert!(!predicate.matches(&latest));
        assert!(predicate.matches(&older));
    }

    #[test]
    fn test_query_options() {
        let mut tagged = record("Contoso.Json", "1.0.0");
        tagged.tags = "serializer JSON".into();
        let records = vec![
            record("Alpha", "1.0.0"),
            tagged,
            record("json.tools", "2.0.0"),
            record("Beta", "1.0.0"),
        ];

        let options = QueryOptions::from_params(Some("'json'"), None, None).unwrap();
        let ids: Vec<_> = options
            .apply(records.clone())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["Contoso.Json", "json.tools"]);

        let options = QueryOptions::from_params(None, Some("1"), Some("2")).unwrap();
        let ids: Vec<_> = options.apply(records).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["Contoso.Json", "json.tools"]);

        assert!(QueryOptions::from_params(None, Some("-1"), None).is_err());
        assert_eq!(
            QueryOptions::from_params(Some("''"), None, None)
                .unwrap()
                .search_term,
            None
        );
    }

    #[test]
    fn test_parse_find_by_id_argument() {
        assert_eq!(
            parse_find_by_id_argument("'Newtonsoft.Json'").unwrap().as_deref(),
            Some("Newtonsoft.Json")
        );
        assert_eq!(
            parse_find_by_id_argument("'Foo+Bar'").unwrap().as_deref(),
            Some("Foo+Bar")
        );
        assert_eq!(parse_find_by_id_argument("''").unwrap(), None);
    }

    #[test]
    fn test_parse_entry_key() {
        assert_eq!(
            parse_entry_key("Packages(Id='Foo',Version='1.0.0')").unwrap(),
            Some(("Foo".to_string(), "1.0.0".to_string()))
        );
        assert_eq!(
            parse_entry_key("Id='Foo', Version='1.0.0-beta'").unwrap(),
            Some(("Foo".to_string(), "1.0.0-beta".to_string()))
        );
        assert_eq!(
            parse_entry_key("Packages(Id=%27Foo%27,Version=%271.0.0+build.5%27)").unwrap(),
            Some(("Foo".to_string(), "1.0.0+build.5".to_string()))
        );
        assert_eq!(parse_entry_key("Packages(Id='',Version='1.0')").unwrap(), None);
        assert_eq!(parse_entry_key("Packages()").unwrap(), None);
    }
}
