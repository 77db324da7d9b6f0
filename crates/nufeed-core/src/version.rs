//! Ordering of gallery version strings.
//!
//! Versions are dotted segment lists. All-digit segments compare numerically, anything else
//! compares lexically, and a shorter list is padded with `0` segments. A version containing
//! `-` is a prerelease. The part before the first `-` is compared first; on a tie the whole
//! strings are compared segment by segment, so `1.0.0-beta` sorts after `1.0.0`. Gallery
//! clients rely on this ordering, so it is kept as is rather than following semver
//! precedence.

use std::cmp::Ordering;

const PRERELEASE_SEPARATOR: char = '-';

/// Returns `true` when the version carries a prerelease label.
pub fn is_prerelease(version: &str) -> bool {
    version.contains(PRERELEASE_SEPARATOR)
}

fn release_part(version: &str) -> &str {
    version
        .split_once(PRERELEASE_SEPARATOR)
        .map_or(version, |(release, _)| release)
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn trim_leading_zeros(segment: &str) -> &str {
    let trimmed = segment.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    if is_numeric(a) && is_numeric(b) {
        // Compared as digit strings so arbitrarily long segments never overflow.
        let (a, b) = (trim_leading_zeros(a), trim_leading_zeros(b));
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    } else {
        a.cmp(b)
    }
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let ord = compare_segment(l.unwrap_or("0"), r.unwrap_or("0"));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Compares two version strings.
///
/// ```
/// use std::cmp::Ordering;
/// use nufeed_core::version::compare;
///
/// assert_eq!(compare("2.0.0", "1.9.9"), Ordering::Greater);
/// assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
/// ```
pub fn compare(a: &str, b: &str) -> Ordering {
    compare_segments(release_part(a), release_part(b)).then_with(|| compare_segments(a, b))
}

/// Rewrites all-digit segments without leading zeros. Only used for display.
pub fn normalize(version: &str) -> String {
    version
        .split('.')
        .map(|segment| {
            if is_numeric(segment) {
                trim_leading_zeros(segment)
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Highest versions of one package identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestVersions {
    /// Highest stable version, `None` when every version is a prerelease.
    pub latest: Option<String>,
    /// Highest version across stable and prerelease.
    pub absolute_latest: Option<String>,
}

impl LatestVersions {
    pub fn is_latest(&self, version: &str) -> bool {
        self.latest.as_deref() == Some(version)
    }

    pub fn is_absolute_latest(&self, version: &str) -> bool {
        self.absolute_latest.as_deref() == Some(version)
    }
}

/// Resolves the latest stable and absolute latest version of a sequence.
///
/// When two versions compare equal the one seen last wins.
pub fn resolve_latest<'a, I>(versions: I) -> LatestVersions
where
    I: IntoIterator<Item = &'a str>,
{
    let mut latest: Option<&str> = None;
    let mut absolute_latest: Option<&str> = None;

    for version in versions {
        if absolute_latest.is_none_or(|current| compare(version, current) != Ordering::Less) {
            absolute_latest = Some(version);
        }
        if !is_prerelease(version)
            && latest.is_none_or(|current| compare(version, current) != Ordering::Less)
        {
            latest = Some(version);
        }
    }

    LatestVersions {
        latest: latest.map(String::from),
        absolute_latest: absolute_latest.map(String::from),
    }
}
