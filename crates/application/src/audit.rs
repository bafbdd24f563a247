use async_trait::async_trait;
use huntboard_core::{AppResult, TenantId};
use huntboard_domain::AuditAction;

/// Structured audit event appended after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant the mutation happened in.
    pub tenant_id: TenantId,
    /// Acting principal identifier.
    pub subject: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Mutated resource type.
    pub resource_type: String,
    /// Mutated resource identifier.
    pub resource_id: String,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Repository port for appending audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends a single event to the audit trail.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
