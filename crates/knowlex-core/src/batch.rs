//! Transaction batches
//!
//! Every lifecycle operation produces a `TransactionBatch`: an ordered list
//! of create/update entries that the store applies all-or-nothing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Artifact, Assessment};

/// Prefix of in-batch placeholder identifiers
pub const PLACEHOLDER_PREFIX: &str = "urn:uuid:";

/// Fresh placeholder identifier for an entry not yet stored
pub fn new_placeholder() -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, Uuid::new_v4())
}

pub fn is_placeholder(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// Semantic type of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchType {
    /// Atomic write set
    Transaction,
    /// Result listing annotated with a total
    Searchset,
    /// Partial (paged) listing, no write intent
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteMethod {
    Post,
    Put,
}

/// Write intent of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRequest {
    pub method: WriteMethod,
    /// `kind` for POST, `kind/id` for PUT or conditional POST
    pub url: String,
    /// Idempotency key: skip the create when a match already exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_none_exist: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resource_type", rename_all = "lowercase")]
pub enum BatchResource {
    Artifact(Artifact),
    Assessment(Assessment),
}

impl BatchResource {
    pub fn id(&self) -> &str {
        match self {
            BatchResource::Artifact(a) => &a.id,
            BatchResource::Assessment(a) => &a.id,
        }
    }

    pub fn as_artifact(&self) -> Option<&Artifact> {
        match self {
            BatchResource::Artifact(a) => Some(a),
            BatchResource::Assessment(_) => None,
        }
    }

    pub fn as_assessment(&self) -> Option<&Assessment> {
        match self {
            BatchResource::Assessment(a) => Some(a),
            BatchResource::Artifact(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Placeholder or real id the rest of the batch may refer to
    pub full_url: String,
    pub resource: BatchResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<EntryRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBatch {
    pub batch_type: BatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    pub entries: Vec<BatchEntry>,
}

impl TransactionBatch {
    pub fn empty(batch_type: BatchType) -> Self {
        Self {
            batch_type,
            total: None,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.iter().filter_map(|e| e.resource.as_artifact())
    }

    pub fn assessments(&self) -> impl Iterator<Item = &Assessment> {
        self.entries.iter().filter_map(|e| e.resource.as_assessment())
    }

    /// Drop write intent from every entry
    pub fn strip_requests(&mut self) {
        for entry in &mut self.entries {
            entry.request = None;
        }
    }

    /// Whether the store has anything to write
    pub fn is_writable(&self) -> bool {
        self.batch_type == BatchType::Transaction
    }
}

/// Ordered builder for batch entries
#[derive(Debug, Default)]
pub struct BatchBuilder {
    entries: Vec<BatchEntry>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// POST under the artifact's (placeholder) id
    pub fn create(mut self, artifact: Artifact) -> Self {
        let request = EntryRequest {
            method: WriteMethod::Post,
            url: artifact.kind.as_str().to_string(),
            if_none_exist: None,
        };
        self.entries.push(BatchEntry {
            full_url: artifact.id.clone(),
            request: Some(request),
            resource: BatchResource::Artifact(artifact),
        });
        self
    }

    /// PUT at `kind/id`
    pub fn update(mut self, artifact: Artifact) -> Self {
        let request = EntryRequest {
            method: WriteMethod::Put,
            url: format!("{}/{}", artifact.kind, artifact.id),
            if_none_exist: None,
        };
        self.entries.push(BatchEntry {
            full_url: artifact.id.clone(),
            request: Some(request),
            resource: BatchResource::Artifact(artifact),
        });
        self
    }

    /// PUT when the id is real, POST when it is a placeholder
    pub fn upsert(self, artifact: Artifact) -> Self {
        if is_placeholder(&artifact.id) {
            self.create(artifact)
        } else {
            self.update(artifact)
        }
    }

    /// Conditional POST keyed by `(url, version)`
    pub fn create_if_none_exist(mut self, artifact: Artifact) -> Self {
        let request = EntryRequest {
            method: WriteMethod::Post,
            url: format!("{}/{}", artifact.kind, artifact.id),
            if_none_exist: Some(idempotency_key(&artifact)),
        };
        self.entries.push(BatchEntry {
            full_url: artifact.id.clone(),
            request: Some(request),
            resource: BatchResource::Artifact(artifact),
        });
        self
    }

    pub fn assessment(mut self, assessment: Assessment, method: WriteMethod) -> Self {
        let url = match method {
            WriteMethod::Post => "assessment".to_string(),
            WriteMethod::Put => format!("assessment/{}", assessment.id),
        };
        self.entries.push(BatchEntry {
            full_url: assessment.id.clone(),
            request: Some(EntryRequest {
                method,
                url,
                if_none_exist: None,
            }),
            resource: BatchResource::Assessment(assessment),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self, batch_type: BatchType) -> TransactionBatch {
        TransactionBatch {
            batch_type,
            total: None,
            entries: self.entries,
        }
    }
}

/// `url=<url>&version=<version>`
pub fn idempotency_key(artifact: &Artifact) -> String {
    format!(
        "url={}&version={}",
        artifact.url,
        artifact.version.as_deref().unwrap_or_default()
    )
}

/// Inverse of `idempotency_key`
pub fn parse_idempotency_key(key: &str) -> Option<(String, Option<String>)> {
    let mut url = None;
    let mut version = None;
    for part in key.split('&') {
        match part.split_once('=') {
            Some(("url", v)) => url = Some(v.to_string()),
            Some(("version", v)) if !v.is_empty() => version = Some(v.to_string()),
            _ => {}
        }
    }
    url.map(|u| (u, version))
}
