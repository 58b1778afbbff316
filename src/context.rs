// ABOUTME: Per-request context and shared server resources
// ABOUTME: RequestContext carries the resolved tenant, principal, and identity store
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::auth::TokenIssuer;
use crate::authz::AuthorizationEvaluator;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppError;
use crate::identity::{IdentityBroker, IdentityService};
use crate::pipeline::Pipeline;
use crate::tenant::{TenantConnectionRegistry, TenantContext, TenantInitTracker, TenantResolver};
use std::sync::Arc;
use uuid::Uuid;

/// Everything one request needs after the middleware chain ran
#[derive(Clone)]
pub struct RequestContext {
    /// Resolved tenant
    pub tenant: TenantContext,
    /// Authenticated user id, when a valid token was presented
    pub principal: Option<Uuid>,
    /// Identity store for this request's surface
    pub identity: Arc<IdentityService>,
    /// Whether failure messages include specifics
    pub detailed_errors: bool,
}

/// Long-lived resources shared across every request
pub struct ServerResources {
    /// Server configuration
    pub config: ServerConfig,
    /// Token issuing and validation
    pub token_issuer: Arc<TokenIssuer>,
    /// Identity store routing
    pub broker: Arc<IdentityBroker>,
    /// Tenant signal resolution
    pub resolver: TenantResolver,
    /// First-use tenant initialization
    pub init_tracker: Arc<TenantInitTracker>,
    /// Operation execution pipeline
    pub pipeline: Arc<Pipeline>,
}

impl ServerResources {
    /// Connect the default database, run migrations and seeding, and wire
    /// up the shared resources with the environment-backed tenant registry
    ///
    /// # Errors
    ///
    /// Returns an error if the default database cannot be prepared.
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, AppError> {
        Self::with_registry(config, TenantConnectionRegistry::from_env()).await
    }

    /// Same as [`Self::new`] with an explicit tenant registry, for tests
    ///
    /// # Errors
    ///
    /// Returns an error if the default database cannot be prepared.
    pub async fn with_registry(
        config: ServerConfig,
        registry: TenantConnectionRegistry,
    ) -> Result<Arc<Self>, AppError> {
        let database = Database::connect(&config.default_database_url)
            .await
            .map_err(|e| AppError::database(format!("Default database unreachable: {e}")))?;
        database
            .migrate()
            .await
            .map_err(|e| AppError::database(format!("Default database migration failed: {e}")))?;

        let password_hash = bcrypt::hash(&config.seed.admin_password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::unexpected(format!("Password hashing failed: {e}")))?;
        database
            .seed_defaults(&config.seed.admin_email, &password_hash)
            .await
            .map_err(|e| AppError::database(format!("Default database seeding failed: {e}")))?;

        let token_issuer = Arc::new(TokenIssuer::new(config.jwt.clone()));
        let broker = Arc::new(IdentityBroker::new(
            Arc::new(database),
            token_issuer.clone(),
        ));
        let evaluator = AuthorizationEvaluator::new(config.detailed_errors());

        Ok(Arc::new(Self {
            token_issuer,
            broker,
            resolver: TenantResolver::new(registry),
            init_tracker: Arc::new(TenantInitTracker::new()),
            pipeline: Arc::new(Pipeline::new(evaluator)),
            config,
        }))
    }
}
