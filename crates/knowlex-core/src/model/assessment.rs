use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::canonical::CanonicalRef;
use crate::errors::KnowlexError;

/// Kind of assessment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssessmentKind {
    Comment,
    Classifier,
    Rating,
    Container,
    Response,
    ChangeRequest,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Comment => "comment",
            AssessmentKind::Classifier => "classifier",
            AssessmentKind::Rating => "rating",
            AssessmentKind::Container => "container",
            AssessmentKind::Response => "response",
            AssessmentKind::ChangeRequest => "change-request",
        }
    }
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentKind {
    type Err = KnowlexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(AssessmentKind::Comment),
            "classifier" => Ok(AssessmentKind::Classifier),
            "rating" => Ok(AssessmentKind::Rating),
            "container" => Ok(AssessmentKind::Container),
            "response" => Ok(AssessmentKind::Response),
            "change-request" => Ok(AssessmentKind::ChangeRequest),
            other => Err(KnowlexError::UnknownParameterValue {
                parameter: "artifactAssessmentType".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// One recorded remark within an assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Actor reference (practitioner id, handle, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_citation: Option<String>,

    pub recorded_at: DateTime<Utc>,
}

/// Assessment attached to exactly one `(url, version)` target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub kind: AssessmentKind,
    pub target: CanonicalRef,
    #[serde(default)]
    pub entries: Vec<AssessmentEntry>,
}

impl Assessment {
    pub fn new(id: impl Into<String>, kind: AssessmentKind, target: CanonicalRef) -> Self {
        Self {
            id: id.into(),
            kind,
            target,
            entries: Vec::new(),
        }
    }

    /// Latest entry, if any
    pub fn latest(&self) -> Option<&AssessmentEntry> {
        self.entries.last()
    }
}
