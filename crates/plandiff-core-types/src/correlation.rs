//! Correlation types for request tracking
//!
//! A host service creates one [`RequestContext`] per inbound request and hands
//! it to the engine, which stamps the ids onto log events and returned errors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh time-ordered id (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Get the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an id received from an upstream caller
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
    /// Unique identifier for a single request or operation
    RequestId
);

correlation_id!(
    /// Trace identifier propagated from the calling service
    TraceId
);

correlation_id!(
    /// Span identifier for a unit of work inside a trace
    SpanId
);

/// Context carried from the service layer into engine commands and queries
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
    /// User on whose behalf the request runs (recorded as creator/approver)
    pub actor: Option<String>,
}

impl RequestContext {
    /// Create a new context with a fresh RequestId
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            trace_id: None,
            actor: None,
        }
    }

    /// Create a context with an existing RequestId
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            trace_id: None,
            actor: None,
        }
    }

    /// Add a TraceId to the context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Attach the acting user
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
