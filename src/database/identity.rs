// ABOUTME: Identity store database operations: users, roles, claims, logins, tokens
// ABOUTME: Multi-step mutations run inside transactions; seed is idempotent
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::Database;
use crate::constants::{policies, roles, PERMISSION_CLAIM};
use crate::models::User;
use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

/// Listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parse the original wire convention: -1 is descending
    #[must_use]
    pub const fn from_wire(order: i32) -> Self {
        if order == -1 {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Map a user-supplied sort column onto a real column
fn sort_column(param: &str) -> &'static str {
    match param.to_lowercase().as_str() {
        "email" => "email",
        _ => "full_name",
    }
}

impl Database {
    /// Create identity tables
    pub(super) async fn migrate_identity(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                phone TEXT,
                profile_image_url TEXT,
                password_hash TEXT NOT NULL DEFAULT '',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                last_login DATETIME
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS roles (
                name TEXT PRIMARY KEY
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role TEXT NOT NULL REFERENCES roles(name) ON DELETE CASCADE,
                PRIMARY KEY (user_id, role)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_claims (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                claim_type TEXT NOT NULL,
                claim_value TEXT NOT NULL,
                PRIMARY KEY (user_id, claim_type, claim_value)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_logins (
                provider TEXT NOT NULL,
                provider_key TEXT NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (provider, provider_key)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_tokens (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                provider TEXT NOT NULL,
                token_name TEXT NOT NULL,
                token_value TEXT NOT NULL,
                PRIMARY KEY (user_id, provider, token_name)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Seed default roles, policies, and the admin account. Idempotent:
    /// every insert is preceded by an existence check or keyed upsert.
    pub async fn seed_defaults(&self, admin_email: &str, admin_password_hash: &str) -> Result<()> {
        for role in roles::all() {
            sqlx::query("INSERT OR IGNORE INTO roles (name) VALUES ($1)")
                .bind(role)
                .execute(&self.pool)
                .await?;
        }

        if self.get_user_by_email(admin_email).await?.is_none() {
            let admin = User::new(
                admin_email.to_owned(),
                "Administrator".to_owned(),
                admin_password_hash.to_owned(),
            );
            self.insert_user(&admin).await?;
            self.add_user_role(admin.id, roles::ADMIN).await?;
            for policy in policies::all() {
                self.add_user_claim(admin.id, PERMISSION_CLAIM, policy)
                    .await?;
            }
        }

        Ok(())
    }

    /// Get a user by id
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_impl("email", email).await
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_impl("username", username).await
    }

    async fn get_user_impl(&self, field: &str, value: &str) -> Result<Option<User>> {
        let query = format!(
            r"
            SELECT id, email, username, full_name, phone, profile_image_url,
                   password_hash, is_active, created_at, last_login
            FROM users WHERE {field} = $1
            "
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_user(&row)).transpose()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id: String = row.get("id");
        Ok(User {
            id: Uuid::parse_str(&id)?,
            email: row.get("email"),
            username: row.get("username"),
            full_name: row.get("full_name"),
            phone: row.get("phone"),
            profile_image_url: row.get("profile_image_url"),
            password_hash: row.get("password_hash"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
            last_login: row.get("last_login"),
        })
    }

    /// Insert a new user
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, email, username, full_name, phone, profile_image_url,
                password_hash, is_active, created_at, last_login
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.profile_image_url)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.last_login)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Create an account with its roles and permission claims in one
    /// transaction; a failure in any step rolls back every step
    pub async fn create_user_records(
        &self,
        user: &User,
        user_roles: &[String],
        user_policies: &[String],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO users (
                id, email, username, full_name, phone, profile_image_url,
                password_hash, is_active, created_at, last_login
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.profile_image_url)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.last_login)
        .execute(&mut *tx)
        .await?;

        for role in user_roles {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(user.id.to_string())
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }

        for policy in user_policies {
            sqlx::query(
                "INSERT INTO user_claims (user_id, claim_type, claim_value) VALUES ($1, $2, $3)",
            )
            .bind(user.id.to_string())
            .bind(PERMISSION_CLAIM)
            .bind(policy)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Update profile fields, optional password, and reconcile the role and
    /// policy sets in one transaction
    #[allow(clippy::too_many_arguments)]
    pub async fn edit_user_records(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        profile_image_url: Option<&str>,
        new_password_hash: Option<&str>,
        roles_to_add: &[String],
        roles_to_remove: &[String],
        policies_to_add: &[String],
        policies_to_remove: &[String],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let id = user_id.to_string();

        sqlx::query(
            r"
            UPDATE users SET full_name = $1, email = $2, username = $2,
                   phone = $3, profile_image_url = $4
            WHERE id = $5
            ",
        )
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(profile_image_url)
        .bind(&id)
        .execute(&mut *tx)
        .await?;

        if let Some(hash) = new_password_hash {
            // Remove-then-add collapses to a single overwrite here
            sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
                .bind(hash)
                .bind(&id)
                .execute(&mut *tx)
                .await?;
        }

        for role in roles_to_add {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(&id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }
        for role in roles_to_remove {
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
                .bind(&id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }

        for policy in policies_to_add {
            sqlx::query(
                "INSERT OR IGNORE INTO user_claims (user_id, claim_type, claim_value) VALUES ($1, $2, $3)",
            )
            .bind(&id)
            .bind(PERMISSION_CLAIM)
            .bind(policy)
            .execute(&mut *tx)
            .await?;
        }
        for policy in policies_to_remove {
            sqlx::query(
                "DELETE FROM user_claims WHERE user_id = $1 AND claim_type = $2 AND claim_value = $3",
            )
            .bind(&id)
            .bind(PERMISSION_CLAIM)
            .bind(policy)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a user; returns the number of rows removed
    pub async fn delete_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Record a successful login
    pub async fn update_last_login(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List users with search, ordering, and paging; search matches full
    /// name or email, case-insensitive substring
    pub async fn list_users(
        &self,
        order: SortOrder,
        sort_param: &str,
        search_text: Option<&str>,
        page_number: i64,
        page_size: i64,
    ) -> Result<(Vec<User>, i64)> {
        let column = sort_column(sort_param);
        let direction = order.sql();
        // An empty search term matches everything through '%%'
        let search = search_text.unwrap_or("");
        const SEARCH_CLAUSE: &str = "WHERE UPPER(full_name) LIKE '%' || UPPER($1) || '%' \
             OR UPPER(email) LIKE '%' || UPPER($1) || '%'";

        let count_query = format!("SELECT COUNT(*) FROM users {SEARCH_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(search)
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            r"
            SELECT id, email, username, full_name, phone, profile_image_url,
                   password_hash, is_active, created_at, last_login
            FROM users {SEARCH_CLAUSE}
            ORDER BY {column} {direction}
            LIMIT $2 OFFSET $3
            "
        );
        let rows = sqlx::query(&list_query)
            .bind(search)
            .bind(page_size)
            .bind((page_number - 1) * page_size)
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .iter()
            .map(Self::row_to_user)
            .collect::<Result<Vec<_>>>()?;
        Ok((users, total))
    }

    /// Check whether a role exists
    pub async fn role_exists(&self, role: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE name = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Add a role to a user; the role must exist
    pub async fn add_user_role(&self, user_id: Uuid, role: &str) -> Result<()> {
        if !self.role_exists(role).await? {
            return Err(anyhow!("Role not found: {role}"));
        }
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id.to_string())
            .bind(role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Roles held by a user
    pub async fn user_roles(&self, user_id: Uuid) -> Result<Vec<String>> {
        let roles = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    /// Whether the user holds the given role
    pub async fn is_in_role(&self, user_id: Uuid, role: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE user_id = $1 AND role = $2")
                .bind(user_id.to_string())
                .bind(role)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Attach a claim to a user
    pub async fn add_user_claim(
        &self,
        user_id: Uuid,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO user_claims (user_id, claim_type, claim_value) VALUES ($1, $2, $3)",
        )
        .bind(user_id.to_string())
        .bind(claim_type)
        .bind(claim_value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether the user holds the given claim
    pub async fn has_user_claim(
        &self,
        user_id: Uuid,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_claims WHERE user_id = $1 AND claim_type = $2 AND claim_value = $3",
        )
        .bind(user_id.to_string())
        .bind(claim_type)
        .bind(claim_value)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Permission policies attached to a user
    pub async fn user_policies(&self, user_id: Uuid) -> Result<Vec<String>> {
        let policies = sqlx::query_scalar(
            "SELECT claim_value FROM user_claims WHERE user_id = $1 AND claim_type = $2",
        )
        .bind(user_id.to_string())
        .bind(PERMISSION_CLAIM)
        .fetch_all(&self.pool)
        .await?;
        Ok(policies)
    }

    /// Find the user linked to an external login
    pub async fn find_user_by_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT u.id, u.email, u.username, u.full_name, u.phone, u.profile_image_url,
                   u.password_hash, u.is_active, u.created_at, u.last_login
            FROM users u
            JOIN user_logins l ON l.user_id = u.id
            WHERE l.provider = $1 AND l.provider_key = $2
            ",
        )
        .bind(provider)
        .bind(provider_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_user(&row)).transpose()
    }

    /// Link an external login to a user
    pub async fn add_user_login(
        &self,
        user_id: Uuid,
        provider: &str,
        provider_key: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO user_logins (provider, provider_key, user_id) VALUES ($1, $2, $3)",
        )
        .bind(provider)
        .bind(provider_key)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store (or replace) a provider token value for a user
    pub async fn set_auth_token(
        &self,
        user_id: Uuid,
        provider: &str,
        token_name: &str,
        token_value: &str,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO user_tokens (user_id, provider, token_name, token_value)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(user_id, provider, token_name) DO UPDATE SET token_value = $4
            ",
        )
        .bind(user_id.to_string())
        .bind(provider)
        .bind(token_name)
        .bind(token_value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a stored provider token
    pub async fn remove_auth_token(
        &self,
        user_id: Uuid,
        provider: &str,
        token_name: &str,
    ) -> Result<()> {
        sqlx::query(
            "DELETE FROM user_tokens WHERE user_id = $1 AND provider = $2 AND token_name = $3",
        )
        .bind(user_id.to_string())
        .bind(provider)
        .bind(token_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a stored provider token
    pub async fn get_auth_token(
        &self,
        user_id: Uuid,
        provider: &str,
        token_name: &str,
    ) -> Result<Option<String>> {
        let token = sqlx::query_scalar(
            "SELECT token_value FROM user_tokens WHERE user_id = $1 AND provider = $2 AND token_name = $3",
        )
        .bind(user_id.to_string())
        .bind(provider)
        .bind(token_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    /// Total user count
    pub async fn user_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
