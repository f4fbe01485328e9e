//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across the lifecycle
//! operations, the store and the engine.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Artifact identifiers
pub const FIELD_ARTIFACT_ID: &str = "artifact.id";
pub const FIELD_ARTIFACT_URL: &str = "artifact.url";
pub const FIELD_ARTIFACT_VERSION: &str = "artifact.version";

// Collection sizes
pub const FIELD_CLOSURE_LEN: &str = "closure_len";
pub const FIELD_BATCH_LEN: &str = "batch_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
