use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// Resolved identity of the principal performing the current request.
///
/// Every service operation receives this explicitly instead of reading a
/// global "current user"; authorization is always evaluated against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    principal_id: Uuid,
    display_name: String,
    email: Option<String>,
    tenant_id: TenantId,
}

impl ActorIdentity {
    /// Creates an actor identity from a resolved principal record.
    #[must_use]
    pub fn new(
        principal_id: Uuid,
        display_name: impl Into<String>,
        email: Option<String>,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            principal_id,
            display_name: display_name.into(),
            email,
            tenant_id,
        }
    }

    /// Returns the stable principal identifier behind this actor.
    #[must_use]
    pub fn principal_id(&self) -> Uuid {
        self.principal_id
    }

    /// Returns the display name for the acting principal.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the principal record carries one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the tenant the actor belongs to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
