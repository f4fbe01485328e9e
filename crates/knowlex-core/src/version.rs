//! Version format validation and release version selection

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::{KnowlexError, Result};

/// Suffix carried by draft versions
pub const DRAFT_SUFFIX: &str = "-draft";

/// How Release picks the final version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBehavior {
    /// Keep the existing version (draft suffix stripped), else the requested one
    Default,
    /// Always the requested version
    Force,
    /// Requested version must equal the existing one
    Check,
}

impl FromStr for VersionBehavior {
    type Err = KnowlexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(VersionBehavior::Default),
            "force" => Ok(VersionBehavior::Force),
            "check" => Ok(VersionBehavior::Check),
            other => Err(KnowlexError::UnknownParameterValue {
                parameter: "versionBehavior".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for VersionBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionBehavior::Default => "default",
            VersionBehavior::Force => "force",
            VersionBehavior::Check => "check",
        })
    }
}

/// Accept `MAJOR.MINOR.PATCH[.REVISION]` with all-numeric segments
///
/// # Errors
///
/// Returns `InvalidVersion` naming the first rule the string breaks.
pub fn validate_format(version: &str) -> Result<()> {
    let invalid = |reason: &str| KnowlexError::InvalidVersion {
        version: version.to_string(),
        reason: reason.to_string(),
    };

    if version.is_empty() {
        return Err(invalid("version must not be empty"));
    }
    if version.contains('/') || version.contains('\\') || version.contains('|') {
        return Err(invalid("version must not contain path or canonical separators"));
    }
    if version.to_ascii_lowercase().contains("draft") {
        return Err(invalid("version must not contain 'draft'"));
    }

    let segments: Vec<&str> = version.split('.').collect();
    if !(3..=4).contains(&segments.len()) {
        return Err(invalid(
            "version must have the form MAJOR.MINOR.PATCH[.REVISION]",
        ));
    }
    if segments
        .iter()
        .any(|s| s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(invalid("version segments must be numeric"));
    }
    Ok(())
}

/// Remove a trailing `-draft`
pub fn strip_draft_suffix(version: &str) -> &str {
    version.strip_suffix(DRAFT_SUFFIX).unwrap_or(version)
}

/// Append `-draft`
pub fn draft_version(version: &str) -> String {
    format!("{}{}", version, DRAFT_SUFFIX)
}

/// Pick the version an artifact is released under
///
/// # Errors
///
/// `MissingVersionBehavior` when `behavior` is unset, `VersionCheckFailed`
/// when `Check` sees a different existing version.
pub fn select_release_version(
    requested: &str,
    behavior: Option<VersionBehavior>,
    existing: Option<&str>,
) -> Result<String> {
    let behavior = behavior.ok_or(KnowlexError::MissingVersionBehavior)?;
    let existing = match existing.map(strip_draft_suffix) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(requested.to_string()),
    };

    match behavior {
        VersionBehavior::Default => Ok(existing.to_string()),
        VersionBehavior::Force => Ok(requested.to_string()),
        VersionBehavior::Check => {
            if requested == existing {
                Ok(requested.to_string())
            } else {
                Err(KnowlexError::VersionCheckFailed {
                    requested: requested.to_string(),
                    existing: existing.to_string(),
                })
            }
        }
    }
}

/// Order versions by dotted segments, numerically where both sides are
/// numeric; falls back to plain string order when segments compare equal
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return a.cmp(b),
        }
    }
}

/// `compare_versions` lifted over optional versions; absent sorts lowest
pub fn compare_optional_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_versions(a, b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_accepts_three_and_four_segments() {
        assert!(validate_format("1.0.0").is_ok());
        assert!(validate_format("10.20.30.40").is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        for bad in [
            "", "1.0", "1.0.0.0.0", "1.0.a", "1..0", "1.0.0-draft", "1/0/0", "a|1.0.0", "v1.0.0",
        ] {
            assert!(validate_format(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_select_default_strips_existing_draft() {
        let v = select_release_version("9.9.9", Some(VersionBehavior::Default), Some("1.2.3-draft"))
            .unwrap();
        assert_eq!(v, "1.2.3");
    }

    #[test]
    fn test_select_force_uses_requested() {
        let v = select_release_version("9.9.9", Some(VersionBehavior::Force), Some("1.2.3-draft"))
            .unwrap();
        assert_eq!(v, "9.9.9");
    }

    #[test]
    fn test_select_check_mismatch_fails() {
        let err = select_release_version("9.9.9", Some(VersionBehavior::Check), Some("1.2.3-draft"))
            .unwrap_err();
        assert!(matches!(err, KnowlexError::VersionCheckFailed { .. }));

        let ok = select_release_version("1.2.3", Some(VersionBehavior::Check), Some("1.2.3-draft"));
        assert_eq!(ok.unwrap(), "1.2.3");
    }

    #[test]
    fn test_select_without_existing_uses_requested() {
        let v = select_release_version("2.0.0", Some(VersionBehavior::Check), None).unwrap();
        assert_eq!(v, "2.0.0");
    }

    #[test]
    fn test_select_bare_draft_suffix_uses_requested() {
        for behavior in [VersionBehavior::Default, VersionBehavior::Check] {
            let v = select_release_version("2.0.0", Some(behavior), Some("-draft")).unwrap();
            assert_eq!(v, "2.0.0");
        }
    }

    #[test]
    fn test_select_requires_behavior() {
        let err = select_release_version("2.0.0", None, None).unwrap_err();
        assert_eq!(err, KnowlexError::MissingVersionBehavior);
    }

    #[test]
    fn test_behavior_parse() {
        assert_eq!("check".parse::<VersionBehavior>().unwrap(), VersionBehavior::Check);
        assert!("strict".parse::<VersionBehavior>().is_err());
    }

    #[test]
    fn test_compare_versions_numeric_segments() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "1.0.0.1"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0", "2.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.0", "1.00.0"), "1.0.0".cmp("1.00.0"));
    }

    proptest! {
        #[test]
        fn prop_numeric_versions_validate(parts in prop::collection::vec(0u32..10_000, 3..=4)) {
            let v = parts.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(".");
            prop_assert!(validate_format(&v).is_ok());
        }

        #[test]
        fn prop_draft_never_validates(parts in prop::collection::vec(0u32..100, 3..=4)) {
            let v = parts.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(".");
            let drafted = draft_version(&v);
            prop_assert!(validate_format(&drafted).is_err());
            prop_assert_eq!(strip_draft_suffix(&drafted), v.as_str());
        }

        #[test]
        fn prop_compare_is_antisymmetric(a in "[0-9]{1,3}(\\.[0-9]{1,3}){2,3}", b in "[0-9]{1,3}(\\.[0-9]{1,3}){2,3}") {
            prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
        }
    }
}
