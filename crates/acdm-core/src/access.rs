//! Role-based capability checks.
//!
//! Every privileged entry point calls [`AccessControl::ensure_role`] before
//! touching state. Granting is a setup action performed by an `Admin`.

use std::collections::BTreeSet;

use acdm_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Capabilities that gate privileged calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May grant and revoke roles
    Admin,
    /// May mint and burn a token
    Minter,
    /// May invoke the platform's administrative calls
    Dao,
    /// May change quorum and debating period
    DaoSettings,
    /// May change staking parameters
    StakingSettings,
    /// May create proposals
    Chair,
}

/// Set of `(role, account)` grants.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    grants: BTreeSet<(Role, Address)>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with `admin` holding the `Admin` role.
    pub fn with_admin(admin: Address) -> Self {
        let mut access = Self::new();
        access.grant_role(Role::Admin, admin);
        access
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.grants.contains(&(role, *account))
    }

    /// Fail with `MissingRole` unless `account` holds `role`.
    pub fn ensure_role(&self, role: Role, account: &Address) -> Result<(), CoreError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(CoreError::MissingRole { role, account: *account })
        }
    }

    /// Grant unconditionally. Returns false if the grant already existed.
    pub fn grant_role(&mut self, role: Role, account: Address) -> bool {
        self.grants.insert((role, account))
    }

    /// Grant on behalf of `caller`, who must be an admin.
    pub fn grant_role_as(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, CoreError> {
        self.ensure_role(Role::Admin, caller)?;
        tracing::info!(?role, %account, "role granted");
        Ok(self.grant_role(role, account))
    }

    pub fn revoke_role(&mut self, role: Role, account: &Address) -> bool {
        self.grants.remove(&(role, *account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_check() {
        let admin = Address::from_label("admin");
        let minter = Address::from_label("minter");
        let mut access = AccessControl::with_admin(admin);

        assert!(access.ensure_role(Role::Minter, &minter).is_err());
        assert!(access.grant_role_as(&admin, Role::Minter, minter).unwrap());
        assert!(access.has_role(Role::Minter, &minter));
        assert!(!access.grant_role_as(&admin, Role::Minter, minter).unwrap());
    }

    #[test]
    fn test_only_admin_grants() {
        let admin = Address::from_label("admin");
        let intruder = Address::from_label("intruder");
        let mut access = AccessControl::with_admin(admin);

        assert_eq!(
            access.grant_role_as(&intruder, Role::Dao, intruder),
            Err(CoreError::MissingRole { role: Role::Admin, account: intruder })
        );
    }

    #[test]
    fn test_revoke() {
        let account = Address::from_label("chair");
        let mut access = AccessControl::new();
        access.grant_role(Role::Chair, account);
        assert!(access.revoke_role(Role::Chair, &account));
        assert!(!access.has_role(Role::Chair, &account));
    }
}
