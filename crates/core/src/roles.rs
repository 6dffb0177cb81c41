//! Role names and the actor context threaded through every workflow call.
//!
//! Identity and authentication live outside the workflow: callers pass an
//! already-authenticated [`Actor`]. The role names must match the `CHECK`
//! constraint on `identities.role`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::define_name_enum;
use crate::types::DbId;

pub const ROLE_CLIENT: &str = "client";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_ADMIN: &str = "admin";

define_name_enum! {
    /// The fixed set of roles an actor can hold.
    Role ("role") {
        Client => "client",
        Editor => "editor",
        Admin => "admin",
    }
}

impl Role {
    /// Operators are the people doing or managing production work.
    pub fn is_operator(self) -> bool {
        matches!(self, Role::Editor | Role::Admin)
    }
}

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: DbId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn client(id: DbId) -> Self {
        Self::new(id, Role::Client)
    }

    pub fn editor(id: DbId) -> Self {
        Self::new(id, Role::Editor)
    }

    pub fn admin(id: DbId) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Reject the call unless the actor holds the `admin` role.
    pub fn require_admin(&self, action: &str) -> Result<(), CoreError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(CoreError::Unauthorized(format!(
                "Role '{}' may not {action}; admin role required",
                self.role
            )))
        }
    }

    /// Reject the call unless the actor is an editor or admin.
    pub fn require_operator(&self, action: &str) -> Result<(), CoreError> {
        if self.role.is_operator() {
            Ok(())
        } else {
            Err(CoreError::Unauthorized(format!(
                "Role '{}' may not {action}; editor or admin role required",
                self.role
            )))
        }
    }

    /// Clients may only touch their own projects. Operators pass unconditionally.
    pub fn require_owner_or_operator(&self, client_id: DbId) -> Result<(), CoreError> {
        if self.role == Role::Client && self.id != client_id {
            return Err(CoreError::Unauthorized(format!(
                "Client {} does not own this project",
                self.id
            )));
        }
        Ok(())
    }
}

/// A mirrored identity record, used to check who may be assigned work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: DbId,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn role_names_match_constants() {
        assert_eq!(Role::Client.as_str(), ROLE_CLIENT);
        assert_eq!(Role::Editor.as_str(), ROLE_EDITOR);
        assert_eq!(Role::Admin.as_str(), ROLE_ADMIN);
        assert_eq!("editor".parse::<Role>().unwrap(), Role::Editor);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn admin_check() {
        assert!(Actor::admin(1).require_admin("cancel").is_ok());
        assert_matches!(
            Actor::editor(2).require_admin("cancel"),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn operator_check() {
        assert!(Actor::editor(2).require_operator("start").is_ok());
        assert!(Actor::admin(1).require_operator("start").is_ok());
        assert_matches!(
            Actor::client(3).require_operator("start"),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn clients_only_own_their_projects() {
        assert!(Actor::client(3).require_owner_or_operator(3).is_ok());
        assert_matches!(
            Actor::client(3).require_owner_or_operator(4),
            Err(CoreError::Unauthorized(_))
        );
        assert!(Actor::editor(9).require_owner_or_operator(4).is_ok());
    }
}
