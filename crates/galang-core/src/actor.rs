use galang_entities::Role;

use crate::{Error, Result};

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Admin identity for maintenance commands run outside a request.
    pub fn system() -> Self {
        Self {
            user_id: 0,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can_manage(&self, owner_id: i32) -> bool {
        self.is_admin() || self.user_id == owner_id
    }

    pub fn require_admin(&self) -> Result<()> {
        if !self.is_admin() {
            return Err(Error::forbidden("admin role required"));
        }
        Ok(())
    }

    pub fn require_creator(&self) -> Result<()> {
        if !self.role.can_create_campaigns() {
            return Err(Error::forbidden("creator role required"));
        }
        Ok(())
    }

    pub fn require_owner_or_admin(&self, owner_id: i32) -> Result<()> {
        if !self.can_manage(owner_id) {
            return Err(Error::forbidden("only the campaign owner or an admin may do this"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_and_admin_can_manage() {
        let owner = Actor::new(7, Role::Creator);
        let stranger = Actor::new(8, Role::Creator);
        let admin = Actor::new(9, Role::Admin);

        assert!(owner.require_owner_or_admin(7).is_ok());
        assert!(admin.require_owner_or_admin(7).is_ok());
        assert!(matches!(
            stranger.require_owner_or_admin(7),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn test_role_gates() {
        assert!(Actor::new(1, Role::User).require_creator().is_err());
        assert!(Actor::new(1, Role::Creator).require_creator().is_ok());
        assert!(Actor::new(1, Role::Creator).require_admin().is_err());
        assert!(Actor::system().require_admin().is_ok());
    }
}
