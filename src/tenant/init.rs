// ABOUTME: Tracks which tenants have had first-use migration and seeding
// ABOUTME: A per-tenant async mutex serializes concurrent first requests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::config::SeedConfig;
use crate::database::Database;
use crate::errors::AppError;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Tracks tenants whose databases have been migrated and seeded.
///
/// The first request for a tenant runs migrations and seeds defaults;
/// concurrent first requests serialize on the tenant's mutex so exactly one
/// performs the work. A failed initialization is not recorded, so the next
/// request retries it.
#[derive(Default)]
pub struct TenantInitTracker {
    tenants: DashMap<Uuid, Arc<Mutex<bool>>>,
}

impl TenantInitTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the tenant's database is migrated and seeded, once
    ///
    /// # Errors
    ///
    /// Returns a database error if migration or seeding fails; the tenant
    /// stays unmarked so a later request can retry.
    pub async fn ensure_initialized(
        &self,
        tenant_id: Uuid,
        database: &Database,
        seed: &SeedConfig,
    ) -> Result<(), AppError> {
        let entry = self
            .tenants
            .entry(tenant_id)
            .or_insert_with(|| Arc::new(Mutex::new(false)))
            .clone();

        let mut initialized = entry.lock().await;
        if *initialized {
            return Ok(());
        }

        tracing::info!(tenant_id = %tenant_id, "Initializing tenant database");
        database
            .migrate()
            .await
            .map_err(|e| AppError::database(format!("Tenant migration failed: {e}")))?;

        let password_hash = bcrypt::hash(&seed.admin_password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::unexpected(format!("Password hashing failed: {e}")))?;
        database
            .seed_defaults(&seed.admin_email, &password_hash)
            .await
            .map_err(|e| AppError::database(format!("Tenant seeding failed: {e}")))?;

        *initialized = true;
        Ok(())
    }

    /// Whether a tenant has completed initialization
    #[must_use]
    pub fn is_initialized(&self, tenant_id: Uuid) -> bool {
        self.tenants
            .get(&tenant_id)
            .is_some_and(|entry| entry.try_lock().map(|done| *done).unwrap_or(false))
    }
}
