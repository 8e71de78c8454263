//! Domain models for the flag engine
//!
//! Flag definitions and the change-sets callers submit, the per-request
//! evaluation context, and audit trail records.

pub mod audit;
pub mod context;
pub mod flag;

// Re-export commonly used types
pub use audit::{AuditAction, AuditEntry, AuditRecord, FlagSnapshot, DEFAULT_AUDIT_REASON};
pub use context::RequestContext;
pub use flag::{FlagChanges, FlagDefinition, NewFlag};
