//! Execution reconciliation & compliance aggregation engine -- takes
//! raw, heterogeneously-shaped validation records plus a tenant scope,
//! and produces one consistent, de-duplicated, tenant-safe view of
//! executions and their per-validator outcomes.
//!
//! The engine reconciles three incompatible record shapes without a
//! schema contract: execution-summary records, individual per-validator
//! records keyed by a composite `<base_id>#<ksi_id>` id, and
//! doubly-JSON-encoded payload bodies. It is pure, synchronous, and
//! repeatable: nothing is persisted, malformed input degrades into
//! diagnostics instead of errors, and re-running the transform on its
//! own output is a no-op.
//!
//! The I/O boundary (fetching, triggering, polling) lives in the
//! companion `ksi-client` crate.

pub mod aggregate;
pub mod diag;
pub mod normalize;
pub mod record;
pub mod reconcile;
pub mod scope;
pub mod types;

pub use aggregate::{
    aggregate, CategoryResult, CategoryStatus, ComplianceOverview, ResourceCounts,
};
pub use diag::{Diagnostic, DiagnosticKind};
pub use reconcile::{reconcile, Reconciliation};
pub use record::{classify, RecordShape, ShapeError};
pub use types::{
    ExecutionStatus, NormalizedExecution, NormalizedValidatorResult, Validator, ValidatorStatus,
};

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────
