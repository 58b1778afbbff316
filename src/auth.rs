// ABOUTME: JWT issuing and validation with per-tenant derived secrets
// ABOUTME: Zero clock-skew validation distinguishing expired from invalid tokens
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Token Issuing
//!
//! Every tenant signs with its own secret, derived from the shared base
//! secret as `"{tenant_id}_{base_secret}"`. A token minted for one tenant
//! never validates against another, including the administrative surface,
//! which uses the nil UUID as its tenant id.

use crate::config::JwtConfig;
use crate::models::User;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token validation failure, split so callers can tell a stale session
/// apart from a forged or foreign token
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenValidationError {
    /// Token has expired
    #[error("Token expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Token is malformed, forged, or signed for a different tenant
    #[error("Token is invalid: {reason}")]
    Invalid {
        /// Reason for invalidity
        reason: String,
    },
}

/// JWT claims carried by issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// User email
    pub email: String,
    /// Display name
    pub name: String,
    /// Phone number, empty when the profile has none
    pub phone: String,
    /// Role names, uppercased
    pub roles: Vec<String>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Issues and validates tenant-scoped tokens
#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
}

impl TokenIssuer {
    #[must_use]
    pub const fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Tenant id used when signing for the administrative surface
    #[must_use]
    pub const fn admin_tenant() -> Uuid {
        Uuid::nil()
    }

    /// Derive the signing secret for a tenant
    fn tenant_secret(&self, tenant_id: Uuid) -> String {
        format!("{tenant_id}_{}", self.config.secret)
    }

    /// Issue a token for a user under the given tenant's secret
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be signed.
    pub fn issue(&self, user: &User, roles: &[String], tenant_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.config.expiry_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            roles: roles.iter().map(|role| role.to_uppercase()).collect(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        let secret = self.tenant_secret(tenant_id);
        let key = EncodingKey::from_secret(secret.as_bytes());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key)?;
        Ok(token)
    }

    /// Validate a token against a tenant's secret, with zero clock skew
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::Expired`] for an expired token and
    /// [`TokenValidationError::Invalid`] for anything else, including tokens
    /// signed for another tenant.
    pub fn validate(&self, token: &str, tenant_id: Uuid) -> Result<Claims, TokenValidationError> {
        let secret = self.tenant_secret(tenant_id);
        let key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                TokenValidationError::Expired {
                    expired_at: self.extract_expiry(token, &key),
                }
            } else {
                TokenValidationError::Invalid {
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(token_data.claims)
    }

    /// Re-decode without expiry checking to recover the exp claim for
    /// error reporting; falls back to now if that also fails
    fn extract_expiry(&self, token: &str, key: &DecodingKey) -> DateTime<Utc> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(token, key, &validation).map_or_else(
            |_| Utc::now(),
            |data| DateTime::from_timestamp(data.claims.exp, 0).unwrap_or_else(Utc::now),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(JwtConfig {
            secret: "base-secret".into(),
            issuer: "atrium".into(),
            audience: "atrium-api".into(),
            expiry_minutes: 60,
        })
    }

    fn sample_user() -> User {
        User::new("user@example.com".into(), "Test User".into(), String::new())
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let issuer = issuer();
        let user = sample_user();
        let tenant = Uuid::new_v4();

        let token = issuer
            .issue(&user, &["Admin".into(), "User".into()], tenant)
            .unwrap();
        let claims = issuer.validate(&token, tenant).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.roles, vec!["ADMIN".to_owned(), "USER".to_owned()]);
    }

    #[test]
    fn test_cross_tenant_token_rejected() {
        let issuer = issuer();
        let user = sample_user();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();

        let token = issuer.issue(&user, &[], tenant_a).unwrap();
        let result = issuer.validate(&token, tenant_b);
        assert!(matches!(result, Err(TokenValidationError::Invalid { .. })));
    }

    #[test]
    fn test_tenant_token_rejected_on_admin_surface() {
        let issuer = issuer();
        let user = sample_user();
        let tenant = Uuid::new_v4();

        let token = issuer.issue(&user, &[], tenant).unwrap();
        let result = issuer.validate(&token, TokenIssuer::admin_tenant());
        assert!(matches!(result, Err(TokenValidationError::Invalid { .. })));
    }
}
