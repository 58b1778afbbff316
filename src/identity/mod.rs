// ABOUTME: Identity broker routing requests to the right identity store
// ABOUTME: Caches one connected service per tenant; the default store serves admin
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Identity
//!
//! The [`IdentityBroker`] picks an [`IdentityService`] per request: the
//! default store for the administrative surface, a cached per-tenant store
//! otherwise. Tenant stores connect lazily on first use and stay cached
//! for the life of the process.

mod service;

pub use service::IdentityService;

use crate::auth::TokenIssuer;
use crate::database::Database;
use crate::errors::AppError;
use crate::tenant::TenantContext;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Routes each request to the identity store its tenant context selects
pub struct IdentityBroker {
    default_store: Arc<IdentityService>,
    token_issuer: Arc<TokenIssuer>,
    tenant_stores: DashMap<Uuid, Arc<IdentityService>>,
}

impl IdentityBroker {
    #[must_use]
    pub fn new(default_db: Arc<Database>, token_issuer: Arc<TokenIssuer>) -> Self {
        let default_store = Arc::new(IdentityService::new(
            default_db,
            token_issuer.clone(),
            TokenIssuer::admin_tenant(),
        ));
        Self {
            default_store,
            token_issuer,
            tenant_stores: DashMap::new(),
        }
    }

    /// The administrative surface's store
    #[must_use]
    pub fn default_store(&self) -> Arc<IdentityService> {
        self.default_store.clone()
    }

    /// The store for a resolved tenant context, connecting it on first use
    ///
    /// # Errors
    ///
    /// Returns a database error if the tenant's database cannot be reached.
    pub async fn store_for(&self, context: &TenantContext) -> Result<Arc<IdentityService>, AppError> {
        let (Some(tenant_id), Some(connection_string)) =
            (context.tenant_id, context.connection_string.as_deref())
        else {
            return Ok(self.default_store.clone());
        };

        if let Some(store) = self.tenant_stores.get(&tenant_id) {
            return Ok(store.clone());
        }

        let database = Database::connect(connection_string)
            .await
            .map_err(|e| AppError::database(format!("Tenant database unreachable: {e}")))?;
        let store = Arc::new(IdentityService::new(
            Arc::new(database),
            self.token_issuer.clone(),
            tenant_id,
        ));

        // A concurrent first request may have raced us; keep whichever landed
        let entry = self
            .tenant_stores
            .entry(tenant_id)
            .or_insert(store)
            .clone();
        Ok(entry)
    }
}
