use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{KnowlexError, Result};

/// Canonical identifier of an artifact: `url` plus optional `version`
///
/// Written as `url|version`, or bare `url` when unversioned. References hold
/// these as plain value keys; they are resolved through the store on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalRef {
    pub url: String,
    pub version: Option<String>,
}

impl CanonicalRef {
    pub fn new(url: impl Into<String>, version: Option<String>) -> Self {
        Self {
            url: url.into(),
            version,
        }
    }

    /// Pinned canonical
    pub fn versioned(url: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(url, Some(version.into()))
    }

    /// Canonical without a version ("latest")
    pub fn unversioned(url: impl Into<String>) -> Self {
        Self::new(url, None)
    }

    /// Parse `url|version`; the split happens on the last `|`
    ///
    /// # Errors
    ///
    /// Returns `InvalidCanonical` for an empty url or an empty version part.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || KnowlexError::InvalidCanonical {
            reference: s.to_string(),
        };
        let (url, version) = match s.rsplit_once('|') {
            Some((url, version)) => {
                if version.is_empty() {
                    return Err(invalid());
                }
                (url, Some(version.to_string()))
            }
            None => (s, None),
        };
        if url.trim().is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(url, version))
    }

    pub fn is_pinned(&self) -> bool {
        self.version.is_some()
    }

    /// Same url, pinned to `version`
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self::versioned(self.url.clone(), version)
    }

    /// String key used by visited sets and memo tables
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Whether `other` designates this canonical, treating an unversioned
    /// `self` as matching any version of the url
    pub fn designates(&self, url: &str, version: Option<&str>) -> bool {
        self.url == url
            && match &self.version {
                Some(v) => Some(v.as_str()) == version,
                None => true,
            }
    }
}

impl fmt::Display for CanonicalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}|{}", self.url, version),
            None => f.write_str(&self.url),
        }
    }
}

impl FromStr for CanonicalRef {
    type Err = KnowlexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CanonicalRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versioned_and_unversioned() {
        let pinned = CanonicalRef::parse("http://example.org/rules|1.2.0").unwrap();
        assert_eq!(pinned.url, "http://example.org/rules");
        assert_eq!(pinned.version.as_deref(), Some("1.2.0"));

        let bare = CanonicalRef::parse("http://example.org/rules").unwrap();
        assert!(!bare.is_pinned());
    }

    #[test]
    fn test_parse_splits_on_last_pipe() {
        let c = CanonicalRef::parse("urn:a|b|2.0.0").unwrap();
        assert_eq!(c.url, "urn:a|b");
        assert_eq!(c.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        assert!(CanonicalRef::parse("").is_err());
        assert!(CanonicalRef::parse("|1.0.0").is_err());
        assert!(CanonicalRef::parse("http://example.org/x|").is_err());
    }

    #[test]
    fn test_display_round_trips_through_serde() {
        let c = CanonicalRef::versioned("http://example.org/list", "3.0.0");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"http://example.org/list|3.0.0\"");
        let back: CanonicalRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_designates() {
        let bare = CanonicalRef::unversioned("u");
        assert!(bare.designates("u", Some("1.0.0")));
        assert!(bare.designates("u", None));

        let pinned = CanonicalRef::versioned("u", "1.0.0");
        assert!(pinned.designates("u", Some("1.0.0")));
        assert!(!pinned.designates("u", Some("2.0.0")));
        assert!(!pinned.designates("v", Some("1.0.0")));
    }
}
