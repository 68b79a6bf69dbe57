//! Semantic version ordering for release tags.

use std::cmp::Ordering;
use std::fmt;

/// A `major.minor.patch` triple parsed from a tag such as `v9.1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SemVer {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl SemVer {
    /// Parse `v?MAJOR[.MINOR[.PATCH]]`. Anything else (pre-release
    /// suffixes, branch names) is rejected.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let clean = tag.strip_prefix('v').unwrap_or(tag);
        let mut parts = clean.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
        let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { major, minor, patch })
    }

    /// Parse, falling back to `0.0.0` for non-semantic refs like `master`.
    #[must_use]
    pub fn parse_lenient(tag: &str) -> Self {
        Self::parse(tag).unwrap_or_default()
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Keep only semantic version tags, ordered oldest first. Tags that parse
/// to the same triple (`9.0.0` and `v9.0.0`) collapse to the first seen.
#[must_use]
pub fn semantic_versions(tags: &[String]) -> Vec<String> {
    let mut parsed: Vec<(SemVer, &String)> =
        tags.iter().filter_map(|t| SemVer::parse(t).map(|v| (v, t))).collect();
    parsed.sort_by(|a, b| a.0.cmp(&b.0));
    parsed.dedup_by(|a, b| a.0 == b.0);
    parsed.into_iter().map(|(_, t)| t.clone()).collect()
}

/// First release of every major version, ordered by major.
#[must_use]
pub fn first_of_each_major(ordered: &[String]) -> Vec<(u64, String)> {
    let mut firsts: Vec<(u64, String)> = Vec::new();
    for tag in ordered {
        let major = SemVer::parse_lenient(tag).major;
        if firsts.last().map_or(true, |(m, _)| *m != major) {
            firsts.push((major, tag.clone()));
        }
    }
    firsts
}

/// Versions from `ordered` within `[source, target]`, with both endpoints
/// always present (using the caller's spelling).
#[must_use]
pub fn versions_between(ordered: &[String], source: &str, target: &str) -> Vec<String> {
    let low = SemVer::parse_lenient(source);
    let high = SemVer::parse_lenient(target);
    let mut between: Vec<String> = ordered
        .iter()
        .filter(|tag| {
            let v = SemVer::parse_lenient(tag);
            v > low && v < high
        })
        .cloned()
        .collect();
    between.insert(0, source.to_string());
    if compare_tags(source, target) != Ordering::Equal {
        between.push(target.to_string());
    }
    between
}

/// Order two tags semantically.
#[must_use]
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    SemVer::parse_lenient(a).cmp(&SemVer::parse_lenient(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_prefixed_and_partial_versions() {
        assert_eq!(SemVer::parse("v9.1.2"), Some(SemVer { major: 9, minor: 1, patch: 2 }));
        assert_eq!(SemVer::parse("3.0"), Some(SemVer { major: 3, minor: 0, patch: 0 }));
        assert_eq!(SemVer::parse("master"), None);
        assert_eq!(SemVer::parse("9.0.0-beta.1"), None);
        assert_eq!(SemVer::parse_lenient("master"), SemVer::default());
    }

    #[test]
    fn semantic_versions_sorts_and_filters() {
        let ordered = semantic_versions(&tags(&["10.0.0", "9.2.0", "nightly", "9.10.0", "v9.2.0"]));
        assert_eq!(ordered, tags(&["9.2.0", "9.10.0", "10.0.0"]));
    }

    #[test]
    fn first_release_of_each_major() {
        let ordered = tags(&["8.0.0", "8.5.1", "9.0.0", "9.3.0", "10.1.0"]);
        let firsts = first_of_each_major(&ordered);
        assert_eq!(
            firsts,
            vec![(8, "8.0.0".to_string()), (9, "9.0.0".to_string()), (10, "10.1.0".to_string())]
        );
    }

    #[test]
    fn versions_between_keeps_endpoints_in_caller_spelling() {
        let ordered = tags(&["9.0.0", "9.1.0", "9.2.0", "9.5.0", "9.6.0"]);
        let between = versions_between(&ordered, "v9.0.0", "v9.5.0");
        assert_eq!(between, tags(&["v9.0.0", "9.1.0", "9.2.0", "v9.5.0"]));
    }

    #[test]
    fn versions_between_same_endpoint_once() {
        let between = versions_between(&[], "9.0.0", "9.0.0");
        assert_eq!(between, tags(&["9.0.0"]));
    }
}
