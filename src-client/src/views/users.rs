//! User administration. Every call requires an administrator identity.

use attendo_common::api::{user as user_path, USERS};
use attendo_common::validation::{validate_email, validate_password, validate_user_name};
use attendo_common::{NewUser, User, UserId};
use tracing::info;

use super::ViewError;
use crate::identity::IdentityContext;

pub struct UsersView<'a> {
    identity: &'a IdentityContext,
}

impl<'a> UsersView<'a> {
    pub fn new(identity: &'a IdentityContext) -> Self {
        Self { identity }
    }

    pub async fn list(&self) -> Result<Vec<User>, ViewError> {
        self.identity.require_admin()?;
        Ok(self.identity.client().get_json(USERS).await?)
    }

    /// Create a user after checking the fields locally.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, ViewError> {
        self.identity.require_admin()?;
        validate_user_name(&new_user.name)?;
        if let Some(email) = &new_user.email {
            validate_email(email)?;
        }
        validate_password(&new_user.password)?;

        let created: User = self.identity.client().post_json(USERS, new_user).await?;
        info!(id = %created.id, name = %created.name, "User created");
        Ok(created)
    }

    pub async fn delete(&self, id: &UserId) -> Result<(), ViewError> {
        self.identity.require_admin()?;
        self.identity.client().delete(&user_path(id)).await?;
        info!(id = %id, "User deleted");
        Ok(())
    }
}
