// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Environment-based configuration management for production deployment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment type for security and error-detail configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    #[must_use]
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// JWT issuing and validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared base secret; tenant-specific secrets derive from it
    pub secret: String,
    /// Token issuer checked on validation
    pub issuer: String,
    /// Token audience checked on validation
    pub audience: String,
    /// Fixed token lifetime in minutes; expiry requires re-login
    pub expiry_minutes: i64,
}

/// Default accounts provisioned on first tenant use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Default admin account email
    pub admin_email: String,
    /// Default admin account password
    pub admin_password: String,
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Connection string for the default (administrative) database
    pub default_database_url: String,
    /// JWT settings
    pub jwt: JwtConfig,
    /// Seed defaults
    pub seed: SeedConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `HTTP_PORT` is set but not a valid port number,
    /// or if `JWT_SECRET` is missing in a production environment.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        );

        let http_port = env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8081".into())
            .parse::<u16>()
            .context("Invalid HTTP_PORT value")?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment.is_production() => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            Err(_) => {
                tracing::warn!("JWT_SECRET not set, using development default");
                "atrium-development-secret-do-not-use-in-production".into()
            }
        };

        Ok(Self {
            http_port,
            environment,
            default_database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/atrium.db".into()),
            jwt: JwtConfig {
                secret: jwt_secret,
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "atrium".into()),
                audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "atrium-api".into()),
                expiry_minutes: env::var("JWT_EXPIRY_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
            seed: SeedConfig {
                admin_email: env::var("SEED_ADMIN_EMAIL")
                    .unwrap_or_else(|_| "admin@admin.com".into()),
                admin_password: env::var("SEED_ADMIN_PASSWORD")
                    .unwrap_or_else(|_| "*Admin123".into()),
            },
        })
    }

    /// Whether deny reasons and failure messages include specifics
    #[must_use]
    pub const fn detailed_errors(&self) -> bool {
        !self.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("anything"),
            Environment::Development
        );
    }

    #[test]
    fn test_detailed_errors_follow_environment() {
        let mut config = ServerConfig {
            http_port: 8081,
            environment: Environment::Development,
            default_database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "s".into(),
                issuer: "atrium".into(),
                audience: "atrium-api".into(),
                expiry_minutes: 60,
            },
            seed: SeedConfig {
                admin_email: "admin@admin.com".into(),
                admin_password: "*Admin123".into(),
            },
        };
        assert!(config.detailed_errors());
        config.environment = Environment::Production;
        assert!(!config.detailed_errors());
    }
}
