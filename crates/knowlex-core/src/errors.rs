use knowlex_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using KnowlexError
pub type Result<T> = std::result::Result<T, KnowlexError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable by transports and tests.
/// Lifecycle operations abort before any write for every kind except
/// `Conflict`, `Persistence` and `Internal`, which can only surface from the
/// store at commit time (and then roll the whole batch back).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Resolution
    NotFound,

    // Lifecycle state
    PreconditionFailed,

    // Arguments
    InvalidArgument,
    InvalidInput,

    // Unsupported parameter combinations
    NotImplemented,

    // Store
    Conflict,
    Persistence,
    Serialization,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::PreconditionFailed => "ERR_PRECONDITION_FAILED",
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotImplemented => "ERR_NOT_IMPLEMENTED",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a retry of the whole read-check-write sequence may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExErrorKind::Conflict)
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus optional context (operation name, the
/// offending artifact canonical, correlation ids) for programmatic handling.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    artifact: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            artifact: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the offending artifact (id or `url|version` canonical)
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the artifact context, if any
    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(artifact) = &self.artifact {
            write!(f, " (artifact: {})", artifact)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for knowledge artifact lifecycle operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KnowlexError {
    // ===== Resolution =====
    /// No stored artifact matches the identifier or canonical
    #[error("Artifact not found: {reference}")]
    ArtifactNotFound { reference: String },

    /// An owned component could not be resolved while releasing its owner
    #[error("Artifact '{reference}' is owned by '{owner}' but was not found")]
    OwnedArtifactNotFound { reference: String, owner: String },

    // ===== Lifecycle preconditions =====
    /// Operation requires a draft artifact
    #[error("Artifact '{artifact}' has status '{status}', expected 'draft'")]
    NotDraft { artifact: String, status: String },

    /// Operation requires an active artifact
    #[error("Drafts can only be created from active artifacts; '{artifact}' has status '{status}'")]
    NotActive { artifact: String, status: String },

    /// Release attempted on an artifact that was never approved
    #[error("Artifact '{artifact}' must be approved (approval date) before it is eligible for release")]
    MissingApprovalDate { artifact: String },

    /// Release attempted on an artifact edited after its approval
    #[error("Artifact '{artifact}' was approved on '{approved}' but last modified on '{modified}'")]
    ApprovalPredatesModification {
        artifact: String,
        approved: String,
        modified: String,
    },

    /// A draft at the requested version already exists
    #[error("A draft of '{url}' already exists with version '{version}'")]
    DraftAlreadyExists { url: String, version: String },

    /// Another artifact already holds the release canonical
    #[error("Artifact '{url}|{version}' already exists")]
    VersionAlreadyExists { url: String, version: String },

    /// Artifact declares no knowledge capability while a capability filter is active
    #[error("Artifact '{url}' does not specify a capability")]
    MissingCapability { url: String },

    /// Artifact declares a capability outside the allowed set
    #[error("Artifact '{url}' is not one of '{allowed}'")]
    UnsupportedCapability { url: String, allowed: String },

    /// `checkCanonicalVersion` did not match the packaged artifact
    #[error("Artifact '{url}' has version '{actual}' but check version specifies '{expected}'")]
    CanonicalVersionMismatch {
        url: String,
        actual: String,
        expected: String,
    },

    /// Revise attempted to change the status of a draft
    #[error("Status cannot be changed from 'draft' by revise; proposed status is '{proposed}'")]
    StatusChangeNotAllowed { proposed: String },

    // ===== Arguments =====
    /// Version string failed the dotted-numeric format check
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Release invoked without a version behavior
    #[error("'versionBehavior' must be provided; valid values are 'default', 'check', 'force'")]
    MissingVersionBehavior,

    /// Unknown enumerated parameter value
    #[error("Unknown value '{value}' for parameter '{parameter}'")]
    UnknownParameterValue { parameter: String, value: String },

    /// `check` behavior with a requested version different from the existing one
    #[error("versionBehavior is 'check' and the requested version '{requested}' does not match the existing version '{existing}'")]
    VersionCheckFailed { requested: String, existing: String },

    /// Paging count below zero
    #[error("'count' must be non-negative, got {count}")]
    NegativeCount { count: i64 },

    /// Non-experimental root depends on an experimental artifact
    #[error("Root artifact is not experimental, but references an experimental artifact '{url}'")]
    ExperimentalDependency { url: String },

    /// Assessment target does not designate the approved artifact
    #[error("Assessment target '{target}' does not match artifact '{artifact}'")]
    AssessmentTargetMismatch { target: String, artifact: String },

    /// Diff endpoints are not comparable
    #[error("Source and target must be of the same kind: '{source_kind}' vs '{target_kind}'")]
    KindMismatch {
        source_kind: String,
        target_kind: String,
    },

    /// Malformed canonical reference string
    #[error("Invalid canonical reference '{reference}'")]
    InvalidCanonical { reference: String },

    // ===== Unsupported =====
    /// Parameter combination the lifecycle engine does not support
    #[error("Not implemented: {feature}")]
    NotImplemented { feature: String },

    // ===== Store =====
    /// Store rejected a write because (url, version) is taken
    #[error("Canonical '{canonical}' conflicts with an existing artifact")]
    CanonicalConflict { canonical: String },

    /// Serialization failure
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Internal invariant broken
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for KnowlexError {
    fn from(err: serde_json::Error) -> Self {
        KnowlexError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<KnowlexError> for ExError {
    fn from(err: KnowlexError) -> Self {
        let kind = match &err {
            KnowlexError::ArtifactNotFound { .. } | KnowlexError::OwnedArtifactNotFound { .. } => {
                ExErrorKind::NotFound
            }

            KnowlexError::NotDraft { .. }
            | KnowlexError::NotActive { .. }
            | KnowlexError::MissingApprovalDate { .. }
            | KnowlexError::ApprovalPredatesModification { .. }
            | KnowlexError::DraftAlreadyExists { .. }
            | KnowlexError::VersionAlreadyExists { .. }
            | KnowlexError::MissingCapability { .. }
            | KnowlexError::UnsupportedCapability { .. }
            | KnowlexError::CanonicalVersionMismatch { .. }
            | KnowlexError::StatusChangeNotAllowed { .. } => ExErrorKind::PreconditionFailed,

            KnowlexError::InvalidVersion { .. }
            | KnowlexError::MissingVersionBehavior
            | KnowlexError::UnknownParameterValue { .. }
            | KnowlexError::VersionCheckFailed { .. }
            | KnowlexError::NegativeCount { .. }
            | KnowlexError::ExperimentalDependency { .. }
            | KnowlexError::AssessmentTargetMismatch { .. }
            | KnowlexError::KindMismatch { .. }
            | KnowlexError::InvalidCanonical { .. } => ExErrorKind::InvalidArgument,

            KnowlexError::NotImplemented { .. } => ExErrorKind::NotImplemented,
            KnowlexError::CanonicalConflict { .. } => ExErrorKind::Conflict,
            KnowlexError::Serialization { .. } => ExErrorKind::Serialization,
            KnowlexError::Internal { .. } => ExErrorKind::Internal,
        };

        let artifact = match &err {
            KnowlexError::ArtifactNotFound { reference } => Some(reference.clone()),
            KnowlexError::OwnedArtifactNotFound { reference, .. } => Some(reference.clone()),
            KnowlexError::NotDraft { artifact, .. }
            | KnowlexError::NotActive { artifact, .. }
            | KnowlexError::MissingApprovalDate { artifact }
            | KnowlexError::ApprovalPredatesModification { artifact, .. }
            | KnowlexError::AssessmentTargetMismatch { artifact, .. } => Some(artifact.clone()),
            KnowlexError::DraftAlreadyExists { url, version }
            | KnowlexError::VersionAlreadyExists { url, version } => {
                Some(format!("{}|{}", url, version))
            }
            KnowlexError::MissingCapability { url }
            | KnowlexError::UnsupportedCapability { url, .. }
            | KnowlexError::CanonicalVersionMismatch { url, .. }
            | KnowlexError::ExperimentalDependency { url } => Some(url.clone()),
            KnowlexError::CanonicalConflict { canonical } => Some(canonical.clone()),
            _ => None,
        };

        let ex = ExError::new(kind).with_message(err.to_string());
        match artifact {
            Some(a) => ex.with_artifact(a),
            None => ex,
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}
