//! Semantic-version range checks
//!
//! Declared ranges use package-manager notation (`>=1.0.0 <2.0.0`,
//! `^1.0.0 || ^2.0.0`, `1.0.0 - 1.4.0`). They are normalised into the
//! comma-separated form the `semver` crate understands. Anything that still
//! fails to parse is treated as unsatisfiable rather than an error.

use semver::{Version, VersionReq};

/// Parse a version, accepting a leading `v` or `=`
pub fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('='))
        .unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Check whether `version` is admitted by `range`
pub fn satisfies(version: &str, range: &str) -> bool {
    let Some(version) = parse_version(version) else {
        return false;
    };

    range
        .split("||")
        .any(|alternative| match parse_alternative(alternative) {
            Some(req) => req.matches(&version),
            None => false,
        })
}

/// Highest of the parseable versions, returned in its original spelling
pub fn max_version<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    versions
        .into_iter()
        .filter_map(|v| parse_version(v).map(|parsed| (parsed, v)))
        .fold(None, |highest: Option<(Version, &'a str)>, (parsed, raw)| match highest {
            Some((best, best_raw)) if best >= parsed => Some((best, best_raw)),
            _ => Some((parsed, raw)),
        })
        .map(|(_, raw)| raw)
}

fn parse_alternative(alternative: &str) -> Option<VersionReq> {
    let alternative = alternative.trim();
    if alternative.is_empty() || alternative == "latest" {
        return Some(VersionReq::STAR);
    }

    if let Some((low, high)) = alternative.split_once(" - ") {
        let normalized = format!(
            ">={}, <={}",
            strip_v(low.trim()),
            strip_v(high.trim())
        );
        return VersionReq::parse(&normalized).ok();
    }

    VersionReq::parse(&join_comparators(alternative)).ok()
}

/// Join whitespace-separated comparators with commas, keeping a bare
/// operator attached to the version that follows it (`>= 1.0.0`).
fn join_comparators(alternative: &str) -> String {
    let spaced = alternative.replace(',', " ");
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in spaced.split_whitespace() {
        let is_operator = token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~'));
        if is_operator {
            pending_op = Some(token);
            continue;
        }
        match pending_op.take() {
            Some(op) => comparators.push(format!("{}{}", op, strip_v(token))),
            None => comparators.push(normalize_bare(token)),
        }
    }

    comparators.join(", ")
}

/// A bare version is exact and a bare partial version is an x-range,
/// whereas the `semver` crate reads both as caret requirements.
fn normalize_bare(token: &str) -> String {
    let operator_len = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~'))
        .unwrap_or(token.len());
    if operator_len > 0 {
        let (op, version) = token.split_at(operator_len);
        return format!("{}{}", op, strip_v(version));
    }

    let bare = strip_v(token);
    if parse_version(bare).is_some() {
        return format!("={}", bare);
    }

    let is_wildcard = bare.ends_with(|c: char| matches!(c, '*' | 'x' | 'X'));
    let is_partial = bare.split('.').count() < 3
        && bare.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !is_wildcard && is_partial {
        return format!("{}.*", bare);
    }

    bare.to_string()
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_and_tilde() {
        assert!(satisfies("1.1.0", "^1.0.0"));
        assert!(!satisfies("2.0.0", "^1.0.0"));
        assert!(satisfies("1.0.5", "~1.0.0"));
        assert!(!satisfies("1.1.0", "~1.0.0"));
    }

    #[test]
    fn test_space_separated_comparators() {
        assert!(satisfies("1.5.0", ">=1.0.0 <2.0.0"));
        assert!(!satisfies("2.0.0", ">=1.0.0 <2.0.0"));
        assert!(satisfies("1.5.0", ">= 1.0.0 < 2.0.0"));
    }

    #[test]
    fn test_alternatives() {
        assert!(satisfies("2.3.0", "^1.0.0 || ^2.0.0"));
        assert!(!satisfies("3.0.0", "^1.0.0 || ^2.0.0"));
    }

    #[test]
    fn test_hyphen_range() {
        assert!(satisfies("1.2.0", "1.0.0 - 1.4.0"));
        assert!(!satisfies("1.5.0", "1.0.0 - 1.4.0"));
    }

    #[test]
    fn test_bare_versions_are_exact() {
        assert!(satisfies("1.0.0", "1.0.0"));
        assert!(!satisfies("1.0.1", "1.0.0"));
        assert!(satisfies("1.0.7", "1.0"));
        assert!(!satisfies("1.1.0", "1.0"));
    }

    #[test]
    fn test_wildcards() {
        assert!(satisfies("9.9.9", "*"));
        assert!(satisfies("9.9.9", ""));
        assert!(satisfies("1.4.2", "1.x"));
    }

    #[test]
    fn test_invalid_input_is_not_satisfiable() {
        assert!(!satisfies("not-a-version", "^1.0.0"));
        assert!(!satisfies("1.0.0", "workspace:^banana"));
    }

    #[test]
    fn test_parse_version_prefixes() {
        assert_eq!(parse_version("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version("=1.2.3"), Some(Version::new(1, 2, 3)));
        assert!(parse_version("1.2").is_none());
    }

    #[test]
    fn test_max_version_is_semantic() {
        let versions = ["1.10.0", "1.9.0", "bogus", "1.2.0"];
        assert_eq!(max_version(versions.iter().copied()), Some("1.10.0"));
        assert_eq!(max_version(["bogus"].iter().copied()), None);
    }

    #[test]
    fn test_v_prefixed_versions_in_ranges() {
        assert!(satisfies("1.5.0", ">=v1.0.0"));
        assert!(satisfies("1.5.0", ">= v1.0.0 <v2.0.0"));
        assert!(satisfies("1.2.0", "^v1.0.0"));
        assert!(satisfies("1.2.0", "v1.0.0 - v1.4.0"));
        assert!(!satisfies("2.0.0", ">=v1.0.0 <v2.0.0"));
        assert!(satisfies("v1.0.0", "1.0.0"));
    }
}
