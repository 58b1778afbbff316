// ABOUTME: Identity service over one store: credentials, accounts, grants, external logins
// ABOUTME: Account mutations validate up front then commit all records in one transaction
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::auth::TokenIssuer;
use crate::constants::{limits, policies, roles, PERMISSION_CLAIM};
use crate::database::{Database, SortOrder};
use crate::errors::{AppError, FieldError};
use crate::models::{LoginView, User, UserProfile, UserView};
use std::sync::Arc;
use uuid::Uuid;

/// Identity operations against one identity store (default or tenant)
#[derive(Clone)]
pub struct IdentityService {
    db: Arc<Database>,
    token_issuer: Arc<TokenIssuer>,
    tenant_id: Uuid,
}

impl IdentityService {
    /// Build a service over a store. `tenant_id` selects the token signing
    /// secret; the administrative store uses the nil UUID.
    #[must_use]
    pub fn new(db: Arc<Database>, token_issuer: Arc<TokenIssuer>, tenant_id: Uuid) -> Self {
        Self {
            db,
            token_issuer,
            tenant_id,
        }
    }

    /// The underlying store
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Attempt a credential login. The identifier is an email when it
    /// contains '@', a username otherwise. Any failure mode (unknown
    /// account, inactive account, wrong password) is the same `Ok(None)`
    /// so callers cannot distinguish which part failed.
    ///
    /// # Errors
    ///
    /// Returns an error only for store or signing failures.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Option<LoginView>, AppError> {
        let user = if identifier.contains('@') {
            self.db.get_user_by_email(identifier).await?
        } else {
            self.db.get_user_by_username(identifier).await?
        };

        let Some(user) = user else {
            return Ok(None);
        };
        if !user.is_active || user.password_hash.is_empty() {
            return Ok(None);
        }
        let verified = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AppError::unexpected(format!("Password verification failed: {e}")))?;
        if !verified {
            return Ok(None);
        }

        let token = self.issue_token(&user).await?;
        self.db.update_last_login(user.id).await?;

        Ok(Some(LoginView {
            full_name: user.full_name,
            email: user.email,
            token,
        }))
    }

    async fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let user_roles = self.db.user_roles(user.id).await?;
        let token = self
            .token_issuer
            .issue(user, &user_roles, self.tenant_id)
            .map_err(|e| AppError::unexpected(format!("Token signing failed: {e}")))?;
        Ok(token)
    }

    /// Create an account with its roles and policies. Constraint checks run
    /// first; the writes then land in one transaction so a failure leaves
    /// no partial account behind.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a taken email, an unknown role, or a
    /// short password.
    pub async fn create_user(
        &self,
        profile: &UserProfile,
        password: &str,
    ) -> Result<UserView, AppError> {
        let mut errors = Vec::new();
        if self.db.get_user_by_email(&profile.email).await?.is_some() {
            errors.push(FieldError::new("email", "Email is already taken"));
        }
        if password.len() < limits::MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!(
                    "Password must be at least {} characters",
                    limits::MIN_PASSWORD_LEN
                ),
            ));
        }
        for role in &profile.roles {
            if !self.db.role_exists(role).await? {
                errors.push(FieldError::new("roles", format!("Unknown role: {role}")));
            }
        }
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::unexpected(format!("Password hashing failed: {e}")))?;
        let mut user = User::new(profile.email.clone(), profile.full_name.clone(), password_hash);
        user.phone.clone_from(&profile.phone);
        user.profile_image_url.clone_from(&profile.profile_image_url);

        self.db
            .create_user_records(&user, &profile.roles, &profile.policies)
            .await?;

        Ok(UserView::brief(user.id, &user.email))
    }

    /// Edit an account's profile, roles, and policies. The requested role
    /// and policy sets replace the current ones by set difference: grants
    /// missing from the request are removed, new ones are added.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown account and a validation error for
    /// a taken email or unknown role.
    pub async fn edit_user(
        &self,
        profile: &UserProfile,
        new_password: Option<&str>,
    ) -> Result<UserView, AppError> {
        let user_id = profile
            .id
            .ok_or_else(|| AppError::invalid_input("User id is required"))?;
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let mut errors = Vec::new();
        if profile.email != user.email {
            if let Some(other) = self.db.get_user_by_email(&profile.email).await? {
                if other.id != user_id {
                    errors.push(FieldError::new("email", "Email is already taken"));
                }
            }
        }
        for role in &profile.roles {
            if !self.db.role_exists(role).await? {
                errors.push(FieldError::new("roles", format!("Unknown role: {role}")));
            }
        }
        if let Some(password) = new_password {
            if password.len() < limits::MIN_PASSWORD_LEN {
                errors.push(FieldError::new(
                    "password",
                    format!(
                        "Password must be at least {} characters",
                        limits::MIN_PASSWORD_LEN
                    ),
                ));
            }
        }
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let current_roles = self.db.user_roles(user_id).await?;
        let current_policies = self.db.user_policies(user_id).await?;
        let roles_to_add = set_difference(&profile.roles, &current_roles);
        let roles_to_remove = set_difference(&current_roles, &profile.roles);
        let policies_to_add = set_difference(&profile.policies, &current_policies);
        let policies_to_remove = set_difference(&current_policies, &profile.policies);

        let new_password_hash = new_password
            .map(|password| bcrypt::hash(password, bcrypt::DEFAULT_COST))
            .transpose()
            .map_err(|e| AppError::unexpected(format!("Password hashing failed: {e}")))?;

        self.db
            .edit_user_records(
                user_id,
                &profile.full_name,
                &profile.email,
                profile.phone.as_deref(),
                profile.profile_image_url.as_deref(),
                new_password_hash.as_deref(),
                &roles_to_add,
                &roles_to_remove,
                &policies_to_add,
                &policies_to_remove,
            )
            .await?;

        Ok(UserView::brief(user_id, &profile.email))
    }

    /// Delete an account
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown account.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let removed = self.db.delete_user(user_id).await?;
        if removed == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// Whether the user holds a role
    pub async fn is_in_role(&self, user_id: Uuid, role: &str) -> Result<bool, AppError> {
        Ok(self.db.is_in_role(user_id, role).await?)
    }

    /// Whether the user holds a permission policy
    pub async fn has_permission(&self, user_id: Uuid, policy: &str) -> Result<bool, AppError> {
        Ok(self
            .db
            .has_user_claim(user_id, PERMISSION_CLAIM, policy)
            .await?)
    }

    /// Display name for logging; falls back to the id when unknown
    pub async fn user_name(&self, user_id: Uuid) -> Result<String, AppError> {
        let user = self.db.get_user(user_id).await?;
        Ok(user.map_or_else(|| user_id.to_string(), |user| user.full_name))
    }

    /// Roles held by a user
    pub async fn user_roles(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(self.db.user_roles(user_id).await?)
    }

    /// Permission policies held by a user
    pub async fn user_policies(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(self.db.user_policies(user_id).await?)
    }

    /// List accounts with search and paging
    pub async fn list_users(
        &self,
        order: SortOrder,
        sort_param: &str,
        search_text: Option<&str>,
        page_number: i64,
        page_size: i64,
    ) -> Result<(Vec<UserView>, i64), AppError> {
        let (users, total) = self
            .db
            .list_users(order, sort_param, search_text, page_number, page_size)
            .await?;
        Ok((users.iter().map(UserView::listing).collect(), total))
    }

    /// Complete an external-provider login. An account already linked to
    /// (provider, key) logs straight in. Otherwise the account is found by
    /// email or created with the default role and policies, then linked.
    /// A token is always issued.
    ///
    /// # Errors
    ///
    /// Returns an error for store or signing failures only; this flow has
    /// no credential failure mode.
    pub async fn handle_external_login(
        &self,
        provider: &str,
        provider_key: &str,
        email: &str,
        name: &str,
        picture: Option<&str>,
    ) -> Result<LoginView, AppError> {
        let user = match self.db.find_user_by_login(provider, provider_key).await? {
            Some(user) => user,
            None => {
                let user = match self.db.get_user_by_email(email).await? {
                    Some(user) => user,
                    None => {
                        let mut user =
                            User::new(email.to_owned(), name.to_owned(), String::new());
                        user.profile_image_url = picture.map(ToOwned::to_owned);
                        self.db
                            .create_user_records(
                                &user,
                                &[roles::USER.to_owned()],
                                &policies::external_login_defaults()
                                    .iter()
                                    .map(|&p| p.to_owned())
                                    .collect::<Vec<_>>(),
                            )
                            .await?;
                        user
                    }
                };
                self.db
                    .add_user_login(user.id, provider, provider_key)
                    .await?;
                user
            }
        };

        let token = self.issue_token(&user).await?;
        self.db.update_last_login(user.id).await?;

        Ok(LoginView {
            full_name: user.full_name,
            email: user.email,
            token,
        })
    }

    /// Store a provider token value for a user
    pub async fn set_auth_token(
        &self,
        user_id: Uuid,
        provider: &str,
        token_name: &str,
        token_value: &str,
    ) -> Result<(), AppError> {
        Ok(self
            .db
            .set_auth_token(user_id, provider, token_name, token_value)
            .await?)
    }

    /// Remove a stored provider token
    pub async fn remove_auth_token(
        &self,
        user_id: Uuid,
        provider: &str,
        token_name: &str,
    ) -> Result<(), AppError> {
        Ok(self.db.remove_auth_token(user_id, provider, token_name).await?)
    }

    /// Fetch a stored provider token
    pub async fn get_auth_token(
        &self,
        user_id: Uuid,
        provider: &str,
        token_name: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(self.db.get_auth_token(user_id, provider, token_name).await?)
    }
}

/// Items of `left` missing from `right`, preserving order
fn set_difference(left: &[String], right: &[String]) -> Vec<String> {
    left.iter()
        .filter(|item| !right.contains(item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_difference() {
        let current = vec!["Admin".to_owned(), "User".to_owned()];
        let requested = vec!["User".to_owned(), "Auditor".to_owned()];

        assert_eq!(set_difference(&requested, &current), vec!["Auditor"]);
        assert_eq!(set_difference(&current, &requested), vec!["Admin"]);
    }
}
