use std::collections::HashMap;

use async_trait::async_trait;

use huntboard_application::DefaultPermissionProvider;
use huntboard_core::AppResult;
use huntboard_domain::{AccountType, PermissionKey, well_known};

/// Fixed default-permission table keyed by account type.
///
/// Backs deployments without a database-managed default table; the Postgres
/// provider supersedes it in production wiring.
#[derive(Debug, Default)]
pub struct StaticDefaultPermissionProvider {
    grants: HashMap<AccountType, Vec<PermissionKey>>,
}

impl StaticDefaultPermissionProvider {
    /// Creates a provider with no default grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default grant for the given account type.
    #[must_use]
    pub fn grant(mut self, account_type: AccountType, key: PermissionKey) -> Self {
        self.grants.entry(account_type).or_default().push(key);
        self
    }

    /// Builds the baseline table: administrators hold every well-known
    /// security key, regular employees may view the directory.
    pub fn baseline() -> AppResult<Self> {
        let mut provider = Self::new();
        for key in [
            well_known::MANAGE_PERMISSIONS,
            well_known::MANAGE_ROLES,
            well_known::MANAGE_MEMBERS,
            well_known::VIEW_DIRECTORY,
        ] {
            provider = provider.grant(AccountType::AdminTeam, PermissionKey::new(key)?);
        }

        provider = provider.grant(
            AccountType::CompanyEmployee,
            PermissionKey::new(well_known::VIEW_DIRECTORY)?,
        );

        Ok(provider)
    }
}

#[async_trait]
impl DefaultPermissionProvider for StaticDefaultPermissionProvider {
    async fn default_permissions(
        &self,
        account_type: AccountType,
    ) -> AppResult<Vec<PermissionKey>> {
        Ok(self.grants.get(&account_type).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use huntboard_application::DefaultPermissionProvider;
    use huntboard_domain::{AccountType, well_known};

    use super::StaticDefaultPermissionProvider;

    #[tokio::test]
    async fn baseline_grants_every_security_key_to_administrators() {
        let provider = StaticDefaultPermissionProvider::baseline();
        assert!(provider.is_ok());
        let provider = provider.unwrap_or_default();

        let admin_keys = provider
            .default_permissions(AccountType::AdminTeam)
            .await
            .unwrap_or_default();
        assert_eq!(admin_keys.len(), 4);
        assert!(
            admin_keys
                .iter()
                .any(|key| key.to_string() == well_known::MANAGE_MEMBERS)
        );

        let researcher_keys = provider
            .default_permissions(AccountType::ResearcherTeam)
            .await
            .unwrap_or_default();
        assert!(researcher_keys.is_empty());
    }
}
