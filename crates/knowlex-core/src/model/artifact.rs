use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::canonical::CanonicalRef;
use super::reference::Reference;
use crate::errors::KnowlexError;

/// Usage context code carrying the priority tag
pub const PRIORITY_CONTEXT_CODE: &str = "priority";

/// Lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Active,
    Retired,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Active => "active",
            Status::Retired => "retired",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = KnowlexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Status::Draft),
            "active" => Ok(Status::Active),
            "retired" => Ok(Status::Retired),
            other => Err(KnowlexError::UnknownParameterValue {
                parameter: "status".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

macro_rules! artifact_kinds {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Artifact type tag
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ArtifactKind {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl ArtifactKind {
            pub const ALL: &'static [ArtifactKind] = &[$(ArtifactKind::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ArtifactKind::$variant => $name,)*
                }
            }
        }

        impl FromStr for ArtifactKind {
            type Err = KnowlexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ArtifactKind::$variant),)*
                    other => Err(KnowlexError::UnknownParameterValue {
                        parameter: "kind".to_string(),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

artifact_kinds! {
    Specification => "specification",
    RuleSet => "rule-set",
    Library => "library",
    Measure => "measure",
    PlanDefinition => "plan-definition",
    ActivityDefinition => "activity-definition",
    CodeList => "code-list",
    CodeSystem => "code-system",
    ConceptMap => "concept-map",
    NamingSystem => "naming-system",
    CapabilityStatement => "capability-statement",
    ImplementationGuide => "implementation-guide",
    OperationDefinition => "operation-definition",
    SearchParameter => "search-parameter",
    Profile => "profile",
    Extension => "extension",
}

impl ArtifactKind {
    pub fn is_knowledge(&self) -> bool {
        matches!(
            self,
            ArtifactKind::Specification
                | ArtifactKind::RuleSet
                | ArtifactKind::Library
                | ArtifactKind::Measure
                | ArtifactKind::PlanDefinition
                | ArtifactKind::ActivityDefinition
        )
    }

    pub fn is_terminology(&self) -> bool {
        matches!(
            self,
            ArtifactKind::CodeList
                | ArtifactKind::CodeSystem
                | ArtifactKind::ConceptMap
                | ArtifactKind::NamingSystem
        )
    }

    pub fn is_conformance(&self) -> bool {
        matches!(
            self,
            ArtifactKind::CapabilityStatement
                | ArtifactKind::ImplementationGuide
                | ArtifactKind::OperationDefinition
                | ArtifactKind::SearchParameter
                | ArtifactKind::Profile
                | ArtifactKind::Extension
        )
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, ArtifactKind::CodeSystem)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validity window (day precision, both ends optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePeriod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl EffectivePeriod {
    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

/// Value of a usage context tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextValue {
    Code(String),
    /// Store id of another artifact
    Reference(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageContext {
    pub code: String,
    pub value: ContextValue,
}

impl UsageContext {
    pub fn code(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: ContextValue::Code(value.into()),
        }
    }

    pub fn reference(code: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: ContextValue::Reference(artifact_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Well-known extension keys plus an open remainder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_description: Option<String>,

    /// Declared knowledge capabilities (e.g. `computable`, `executable`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub test_case: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub example: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Extensions {
    /// Drop tags that only make sense on a released version
    pub fn clear_release_tags(&mut self) {
        self.release_label = None;
        self.release_description = None;
    }
}

/// Store bookkeeping, owned by the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Knowledge artifact
///
/// Identity is the canonical `(url, version)`; `id` is the store key. Inside
/// a draft batch `id` may be a `urn:uuid:` placeholder that the store swaps
/// for a real identifier at commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub status: Status,
    pub kind: ArtifactKind,

    /// Last-modified timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_period: Option<EffectivePeriod>,

    #[serde(default)]
    pub experimental: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_contexts: Vec<UsageContext>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    /// Non-owned nested canonicals (code-list composition and the like)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<CanonicalRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endorsers: Vec<Endorser>,

    #[serde(default)]
    pub extensions: Extensions,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub content: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ArtifactMeta>,
}

impl Artifact {
    /// New draft artifact with no version
    pub fn new(id: impl Into<String>, url: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            version: None,
            name: None,
            title: None,
            status: Status::Draft,
            kind,
            date: None,
            approval_date: None,
            effective_period: None,
            experimental: false,
            usage_contexts: Vec::new(),
            references: Vec::new(),
            includes: Vec::new(),
            endorsers: Vec::new(),
            extensions: Extensions::default(),
            content: serde_json::Value::Null,
            meta: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn canonical(&self) -> CanonicalRef {
        CanonicalRef::new(self.url.clone(), self.version.clone())
    }

    pub fn is_draft(&self) -> bool {
        self.status == Status::Draft
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    pub fn has_effective_period(&self) -> bool {
        self.effective_period.as_ref().is_some_and(|p| p.is_set())
    }

    /// Owned component references
    pub fn owned_components(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(|r| r.is_owned())
    }

    pub fn components(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(|r| r.is_component())
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(|r| r.is_dependency())
    }

    /// Priority code from the `priority` usage context
    pub fn priority(&self) -> Option<&str> {
        self.usage_contexts
            .iter()
            .find(|uc| uc.code == PRIORITY_CONTEXT_CODE)
            .and_then(|uc| match &uc.value {
                ContextValue::Code(code) => Some(code.as_str()),
                ContextValue::Reference(_) => None,
            })
    }

    /// Set (or replace) the priority usage context
    pub fn set_priority(&mut self, priority: impl Into<String>) {
        let value = ContextValue::Code(priority.into());
        match self
            .usage_contexts
            .iter_mut()
            .find(|uc| uc.code == PRIORITY_CONTEXT_CODE)
        {
            Some(uc) => uc.value = value,
            None => self.usage_contexts.push(UsageContext {
                code: PRIORITY_CONTEXT_CODE.to_string(),
                value,
            }),
        }
    }

    /// Flagged as a test case, or a library whose content type is `test-case`
    pub fn is_test_case(&self) -> bool {
        self.extensions.test_case
            || (self.kind == ArtifactKind::Library
                && self.content.get("type").and_then(|t| t.as_str()) == Some("test-case"))
    }

    pub fn is_example(&self) -> bool {
        self.extensions.example
    }

    /// Insert or update an endorser by name
    pub fn upsert_endorser(&mut self, endorser: Endorser) {
        match self.endorsers.iter_mut().find(|e| e.name == endorser.name) {
            Some(existing) => *existing = endorser,
            None => self.endorsers.push(endorser),
        }
    }
}
