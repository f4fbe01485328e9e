//! Correlation types for request tracking and tracing
//!
//! Every lifecycle command runs under one `RequestContext`; its identifiers
//! are attached to structured errors and log events so a single draft,
//! release or package invocation can be followed end to end.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, time-ordered identifier (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Get the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an identifier received from a caller
            pub fn from_string(s: String) -> Self {
                Self(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifier for a single command invocation (one unit of work)
    RequestId
);

correlation_id!(
    /// Trace identifier propagated from the caller's transport, if any
    TraceId
);

/// Context carried through operation boundaries for correlation
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
}

impl RequestContext {
    /// Create a new context with a fresh RequestId
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            trace_id: None,
        }
    }

    /// Create a context for a caller-supplied RequestId
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            trace_id: None,
        }
    }

    /// Add a TraceId to the context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_non_empty() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());

        assert_ne!(TraceId::new(), TraceId::new());
    }

    #[test]
    fn test_display_matches_as_str() {
        let id = RequestId::from_string("req-1".to_string());
        assert_eq!(id.to_string(), "req-1");
    }

    #[test]
    fn test_request_context_trace_propagation() {
        let trace_id = TraceId::from_string("trace-7".to_string());
        let ctx = RequestContext::new().with_trace_id(trace_id.clone());

        assert_eq!(ctx.trace_id, Some(trace_id));
    }

    #[test]
    fn test_serialization_is_transparent_string() {
        let id = RequestId::from_string("req-42".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"req-42\"");
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
