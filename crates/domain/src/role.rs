use std::collections::BTreeSet;

use huntboard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PermissionId;

/// Unique identifier for a custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named bundle of permissions assignable to principals in one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable identifier.
    pub id: RoleId,
    /// Role name, unique within the owning tenant.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Granted permission references; never empty for a persisted role.
    pub permission_ids: BTreeSet<PermissionId>,
}

impl Role {
    /// Creates a role, enforcing the non-empty name and grant-set invariants.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        description: Option<String>,
        permission_ids: BTreeSet<PermissionId>,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }

        if permission_ids.is_empty() {
            return Err(AppError::Validation(
                "role must grant at least one permission".to_owned(),
            ));
        }

        Ok(Self {
            id,
            name,
            description,
            permission_ids,
        })
    }
}

/// Toggles a whole permission category on a draft selection.
///
/// `candidates` holds the ids of the category's permissions currently visible
/// to the operator (a search filter may have narrowed them). When every
/// candidate is already selected they are all removed; otherwise they are all
/// added. An empty candidate list leaves the selection untouched.
#[must_use]
pub fn toggle_category(
    selection: &BTreeSet<PermissionId>,
    candidates: &[PermissionId],
) -> BTreeSet<PermissionId> {
    let mut next = selection.clone();
    if candidates.is_empty() {
        return next;
    }

    if candidates.iter().all(|id| next.contains(id)) {
        for id in candidates {
            next.remove(id);
        }
    } else {
        next.extend(candidates.iter().copied());
    }

    next
}
