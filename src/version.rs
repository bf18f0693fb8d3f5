// Version string extraction and comparison
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static DOTTED_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:\.\d+)*").expect("dotted version pattern is valid")
});

/// First dotted numeric version in a client's version output.
///
/// `"Geth\nVersion: 1.8.2-stable"` yields `1.8.2`.
pub fn extract_version(output: &str) -> Option<String> {
    DOTTED_VERSION
        .find(output)
        .map(|m| m.as_str().to_string())
}

/// Parse a dotted version leniently into a `semver::Version`.
///
/// Missing minor/patch components count as zero. Components past the patch
/// level are ignored, as none of the supported clients uses them.
pub fn parse_version(version: &str) -> Option<semver::Version> {
    let mut parts = version.trim().split('.').map(|part| part.parse::<u64>());

    let major = parts.next()?.ok()?;
    let minor = match parts.next() {
        Some(part) => part.ok()?,
        None => 0,
    };
    let patch = match parts.next() {
        Some(part) => part.ok()?,
        None => 0,
    };

    Some(semver::Version::new(major, minor, patch))
}

/// Order two version strings, `None` when either one doesn't parse
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    Some(parse_version(a)?.cmp(&parse_version(b)?))
}
