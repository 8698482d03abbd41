//! Diagnostics collected during reconciliation.
//!
//! The engine is pure and never logs; decode and shape failures are
//! recovered locally and reported here so callers can surface them
//! (silent to end users, observable in drill-down).

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// The record matched neither known shape and was dropped.
    UnknownShape,
    /// A JSON-looking string field failed to decode; an annotated
    /// placeholder was substituted.
    DecodeFailure,
    /// The record named a validator outside the fixed set.
    UnknownValidator,
    /// The record carried no tenant under a non-wildcard scope.
    MissingTenant,
}

/// One recovered failure, tied to the offending record where possible.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, record_id: Option<&str>, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            record_id: record_id.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "{:?} [{}]: {}", self.kind, id, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}
